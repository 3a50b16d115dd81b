//! Property tests for link extraction, metrics and graph projection.

use std::collections::HashSet;

use proptest::prelude::*;

use tx_entropy_kernel::{
    entropy_bits, extract_deterministic_links, interpret, is_deterministic, project_links,
    AnalysisOutcome, GraphElement, IntrafeeBounds, LinkabilityMatrix, TxoRef,
};

/// A matrix with `outputs × inputs` cells in `0..=nb_cmbn`, plus matching txos.
///
/// Either side may be empty (coinbase transactions have no inputs).
/// Addresses are drawn from a small pool so that repeated ids occur.
fn arb_case() -> impl Strategy<Value = (LinkabilityMatrix, u64, Vec<TxoRef>, Vec<TxoRef>)> {
    (0usize..6, 0usize..6, 0u64..6).prop_flat_map(|(outputs, inputs, nb_cmbn)| {
        (
            prop::collection::vec(0..=nb_cmbn, outputs * inputs),
            prop::collection::vec((0u8..4, 1u64..100_000), inputs),
            prop::collection::vec((0u8..4, 1u64..100_000), outputs),
        )
            .prop_map(move |(cells, ins, outs)| {
                let matrix = LinkabilityMatrix::new(outputs, inputs, cells).unwrap();
                let ins = ins
                    .into_iter()
                    .map(|(a, v)| TxoRef::new(format!("addr{}", a), v))
                    .collect();
                let outs = outs
                    .into_iter()
                    .map(|(a, v)| TxoRef::new(format!("addr{}", a + 2), v))
                    .collect();
                (matrix, nb_cmbn, ins, outs)
            })
    })
}

#[test]
fn test_entropy_absent_without_combinations() {
    assert_eq!(entropy_bits(0), None);
}

proptest! {
    #[test]
    fn prop_links_are_sound_and_exhaustive((matrix, nb, ins, outs) in arb_case()) {
        let links = extract_deterministic_links(Some(&matrix), nb, &ins, &outs);

        for link in &links {
            let cell = matrix.get(link.output_index, link.input_index).unwrap();
            prop_assert!(is_deterministic(cell, nb));
            prop_assert_eq!(&link.input, &ins[link.input_index]);
            prop_assert_eq!(&link.output, &outs[link.output_index]);
        }

        let expected = matrix
            .rows()
            .flat_map(|row| row.iter())
            .filter(|&&cell| is_deterministic(cell, nb))
            .count();
        prop_assert_eq!(links.len(), expected);
    }

    #[test]
    fn prop_links_are_outputs_major((matrix, nb, ins, outs) in arb_case()) {
        let links = extract_deterministic_links(Some(&matrix), nb, &ins, &outs);
        let keys: Vec<(usize, usize)> = links.iter().map(|l| (l.output_index, l.input_index)).collect();
        for pair in keys.windows(2) {
            prop_assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn prop_absent_matrix_has_no_links(nb in 0u64..1_000, n in 0usize..5) {
        let txos: Vec<TxoRef> = (0..n).map(|k| TxoRef::new(format!("a{}", k), 1)).collect();
        prop_assert!(extract_deterministic_links(None, nb, &txos, &txos).is_empty());
    }

    #[test]
    fn prop_entropy_of_power_of_two_is_exact(k in 0u32..64) {
        prop_assert_eq!(entropy_bits(1u64 << k), Some(f64::from(k)));
    }

    #[test]
    fn prop_entropy_inverts_to_combinations(nb in 1u64..1_000_000_000) {
        let bits = entropy_bits(nb).unwrap();
        prop_assert!(bits >= 0.0);
        let back = 2f64.powf(bits);
        prop_assert!((back - nb as f64).abs() <= nb as f64 * 1e-9, "2^{} = {} for {}", bits, back, nb);
    }

    #[test]
    fn prop_matrix_serde_roundtrip((matrix, nb, ins, outs) in arb_case()) {
        let json = serde_json::to_string(&matrix).unwrap();
        let back: LinkabilityMatrix = serde_json::from_str(&json).unwrap();

        prop_assert_eq!(back.to_rows(), matrix.to_rows());
        prop_assert!(back.validate_against(nb, ins.len(), outs.len()).is_ok());
        // With no outputs the nested form has no row to carry the input count
        if matrix.num_outputs() > 0 {
            prop_assert_eq!(&back, &matrix);
        }
    }

    #[test]
    fn prop_projection_is_deterministic((matrix, nb, ins, outs) in arb_case()) {
        let links = extract_deterministic_links(Some(&matrix), nb, &ins, &outs);
        prop_assert_eq!(project_links(&links), project_links(&links));
    }

    #[test]
    fn prop_projection_node_ids_unique((matrix, nb, ins, outs) in arb_case()) {
        let links = extract_deterministic_links(Some(&matrix), nb, &ins, &outs);
        let elements = project_links(&links);

        let mut ids = HashSet::new();
        for node in elements.iter().filter_map(GraphElement::as_node) {
            prop_assert!(ids.insert(node.data.id.clone()), "duplicate node {}", node.data.id);
        }

        let edges = elements.iter().filter_map(GraphElement::as_edge).count();
        prop_assert_eq!(edges, links.len());

        // Every edge endpoint is a projected node
        for edge in elements.iter().filter_map(GraphElement::as_edge) {
            prop_assert!(ids.contains(&edge.data.source));
            prop_assert!(ids.contains(&edge.data.target));
        }
    }

    #[test]
    fn prop_interpret_accepts_valid_outcomes((matrix, nb, ins, outs) in arb_case()) {
        let outcome = AnalysisOutcome {
            matrix: Some(matrix),
            nb_cmbn: nb,
            inputs: ins,
            outputs: outs,
            fees: 0,
            intrafee_bounds: IntrafeeBounds::default(),
            efficiency: None,
        };
        let inspection = interpret("tx", outcome).unwrap();
        prop_assert_eq!(
            inspection.elements,
            project_links(&inspection.report.deterministic_links)
        );
    }
}

//! Golden tests for the entropy kernel.
//!
//! These tests pin the documented examples: metric values, link order and
//! the exact graph produced for them.

use tx_entropy_kernel::{
    extract_deterministic_links, interpret, project_links, AnalysisOutcome, GraphElement,
    IntrafeeBounds, LinkabilityMatrix, LinkabilityStatus, TxMetrics, TxoRef,
    DETERMINISTIC_EDGE_CLASS, LINKED_INPUT_CLASS,
};

// ─────────────────────────────────────────────────────────────────────────────
// Test Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn inputs() -> Vec<TxoRef> {
    vec![
        TxoRef::new("1Alice", 60_000),
        TxoRef::new("1Bob", 40_000),
    ]
}

fn outputs() -> Vec<TxoRef> {
    vec![
        TxoRef::new("1Carol", 70_000),
        TxoRef::new("1Dave", 29_000),
    ]
}

fn outcome(matrix: Option<Vec<Vec<u64>>>, nb_cmbn: u64, efficiency: Option<f64>) -> AnalysisOutcome {
    AnalysisOutcome {
        matrix: matrix.map(|rows| LinkabilityMatrix::from_rows(rows).unwrap()),
        nb_cmbn,
        inputs: inputs(),
        outputs: outputs(),
        fees: 1_000,
        intrafee_bounds: IntrafeeBounds::default(),
        efficiency,
    }
}

fn node_ids(elements: &[GraphElement]) -> Vec<&str> {
    elements
        .iter()
        .filter_map(GraphElement::as_node)
        .map(|n| n.data.id.as_str())
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Documented examples
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn golden_fully_linked_corner() {
    let o = outcome(Some(vec![vec![3, 3], vec![0, 3]]), 3, None);
    let links = extract_deterministic_links(o.matrix.as_ref(), o.nb_cmbn, &o.inputs, &o.outputs);

    let pairs: Vec<(&str, &str)> = links
        .iter()
        .map(|l| (l.input.address.as_str(), l.output.address.as_str()))
        .collect();
    assert_eq!(
        pairs,
        vec![("1Alice", "1Carol"), ("1Bob", "1Carol"), ("1Bob", "1Dave")]
    );

    let metrics = TxMetrics::from_outcome(&o);
    let entropy = metrics.entropy_bits.unwrap();
    assert!((entropy - 1.584_962_500_721_156).abs() < 1e-12);
}

#[test]
fn golden_no_deterministic_links() {
    let o = outcome(Some(vec![vec![2, 1], vec![1, 2]]), 3, None);
    let inspection = interpret("tx", o).unwrap();

    assert!(inspection.report.deterministic_links.is_empty());
    assert!(inspection.elements.is_empty());
    assert_eq!(inspection.report.status, LinkabilityStatus::Computed);
    assert_eq!(inspection.report.entropy_bits(), Some(3f64.log2()));
}

#[test]
fn golden_skipped_analysis() {
    let o = outcome(None, 0, None);
    let inspection = interpret("tx", o).unwrap();

    assert!(inspection.report.deterministic_links.is_empty());
    assert_eq!(inspection.report.status, LinkabilityStatus::Skipped);
    assert!(inspection.report.metrics.entropy_bits.is_none());
    assert!(inspection.report.metrics.efficiency_bits.is_none());
    assert_eq!(inspection.report.metrics.fees, 1_000);
}

#[test]
fn golden_skipped_with_separate_efficiency() {
    let o = outcome(None, 0, Some(0.25));
    let metrics = TxMetrics::from_outcome(&o);
    assert!(metrics.entropy_bits.is_none());
    assert_eq!(metrics.efficiency_bits, Some(-2.0));
}

// ─────────────────────────────────────────────────────────────────────────────
// Graph projection
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn golden_graph_for_corner_matrix() {
    let o = outcome(Some(vec![vec![3, 3], vec![0, 3]]), 3, None);
    let inspection = interpret("tx", o).unwrap();
    let elements = &inspection.elements;

    assert_eq!(node_ids(elements), vec!["1Alice", "1Carol", "1Bob", "1Dave"]);

    let alice = elements[0].as_node().unwrap();
    assert_eq!(alice.data.label, "60000");
    assert_eq!((alice.position.x, alice.position.y), (50.0, 0.0));
    assert_eq!(alice.classes.as_deref(), Some(LINKED_INPUT_CLASS));

    // Bob first appears in the second link, so his row is 30
    let bob = elements[3].as_node().unwrap();
    assert_eq!((bob.position.x, bob.position.y), (50.0, 30.0));

    // Dave first appears in the third link
    let dave = elements[5].as_node().unwrap();
    assert_eq!((dave.position.x, dave.position.y), (200.0, 60.0));
    assert!(dave.classes.is_none());

    let edges: Vec<(&str, &str)> = elements
        .iter()
        .filter_map(GraphElement::as_edge)
        .map(|e| {
            assert_eq!(e.classes, DETERMINISTIC_EDGE_CLASS);
            (e.data.source.as_str(), e.data.target.as_str())
        })
        .collect();
    assert_eq!(
        edges,
        vec![("1Alice", "1Carol"), ("1Bob", "1Carol"), ("1Bob", "1Dave")]
    );
}

#[test]
fn golden_graph_json_shape() {
    let o = outcome(Some(vec![vec![1, 0], vec![0, 1]]), 1, None);
    let elements = project_links(&interpret("tx", o).unwrap().report.deterministic_links);
    let json = serde_json::to_value(&elements).unwrap();

    assert_eq!(
        json[0],
        serde_json::json!({
            "data": {"id": "1Alice", "label": "60000"},
            "position": {"x": 50.0, "y": 0.0},
            "selectable": true,
            "grabbable": true,
            "classes": "linked-input"
        })
    );
    assert_eq!(
        json[2],
        serde_json::json!({
            "data": {"source": "1Alice", "target": "1Carol"},
            "classes": "deterministic-edge"
        })
    );
    assert!(json[1].get("classes").is_none());
}

// ─────────────────────────────────────────────────────────────────────────────
// Determinism
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn golden_interpretation_is_deterministic() {
    let first = interpret("tx", outcome(Some(vec![vec![3, 3], vec![0, 3]]), 3, Some(0.5))).unwrap();
    for _ in 0..10 {
        let again = interpret("tx", outcome(Some(vec![vec![3, 3], vec![0, 3]]), 3, Some(0.5))).unwrap();
        assert_eq!(first, again);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&again).unwrap()
        );
    }
}

#[test]
fn golden_text_report() {
    let mut o = outcome(Some(vec![vec![3, 3], vec![0, 3]]), 3, Some(0.75));
    o.intrafee_bounds = IntrafeeBounds::new(150, 300);
    let text = interpret("tx", o).unwrap().report.to_string();

    let expected = "\
Inputs = [(1Alice, 60000), (1Bob, 40000)]
Outputs = [(1Carol, 70000), (1Dave, 29000)]
Fees = 1000 satoshis
Hypothesis: Max intrafees received by a participant = 150 satoshis
Hypothesis: Max intrafees paid by a participant = 300 satoshis
Nb combinations = 3
Tx entropy = 1.584963 bits
Wallet efficiency = 75.000000% (-0.415037 bits)
Linkability Matrix (probabilities) :
[1.0000 1.0000]
[0.0000 1.0000]
Deterministic links :
(1Alice, 60000) & (1Carol, 70000) are deterministically linked
(1Bob, 40000) & (1Carol, 70000) are deterministically linked
(1Bob, 40000) & (1Dave, 29000) are deterministically linked
";
    assert_eq!(text, expected);
}

//! Graph projection of deterministic links.
//!
//! Each link at emission index `i` becomes an input node, an output node and
//! a directed edge between them. Inputs sit in a left lane, outputs in a
//! right lane, and the link's row is `row_spacing * i`.
//!
//! Node ids are addresses and are deduplicated across the whole sequence:
//! the first occurrence of an id fixes its position, label and class. Edges
//! are never deduplicated.

use std::collections::HashSet;

use crate::types::{
    DeterministicLink, EdgeData, GraphEdge, GraphElement, GraphNode, NodeData, Position,
    DETERMINISTIC_EDGE_CLASS, LINKED_INPUT_CLASS,
};

/// Lane and row geometry for the projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphLayout {
    /// x of the input lane.
    pub input_x: f64,
    /// x of the output lane (greater than `input_x`).
    pub output_x: f64,
    /// Vertical distance between consecutive links.
    pub row_spacing: f64,
}

impl Default for GraphLayout {
    fn default() -> Self {
        Self {
            input_x: 50.0,
            output_x: 200.0,
            row_spacing: 30.0,
        }
    }
}

/// Project links into renderable elements with the default layout.
pub fn project_links(links: &[DeterministicLink]) -> Vec<GraphElement> {
    project_links_with_layout(links, &GraphLayout::default())
}

/// Project links into renderable elements.
pub fn project_links_with_layout(
    links: &[DeterministicLink],
    layout: &GraphLayout,
) -> Vec<GraphElement> {
    let mut elements = Vec::with_capacity(links.len() * 3);
    let mut seen: HashSet<&str> = HashSet::with_capacity(links.len() * 2);

    for (i, link) in links.iter().enumerate() {
        let y = layout.row_spacing * i as f64;

        if seen.insert(link.input.address.as_str()) {
            elements.push(node(
                &link.input.address,
                link.input.value,
                Position { x: layout.input_x, y },
                Some(LINKED_INPUT_CLASS),
            ));
        }

        if seen.insert(link.output.address.as_str()) {
            elements.push(node(
                &link.output.address,
                link.output.value,
                Position { x: layout.output_x, y },
                None,
            ));
        }

        elements.push(GraphElement::Edge(GraphEdge {
            data: EdgeData {
                source: link.input.address.clone(),
                target: link.output.address.clone(),
            },
            classes: DETERMINISTIC_EDGE_CLASS.to_string(),
        }));
    }

    elements
}

fn node(id: &str, value: u64, position: Position, class: Option<&str>) -> GraphElement {
    GraphElement::Node(GraphNode {
        data: NodeData {
            id: id.to_string(),
            label: value.to_string(),
        },
        position,
        selectable: true,
        grabbable: true,
        classes: class.map(str::to_string),
    })
}

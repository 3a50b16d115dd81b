//! Renderable graph elements.
//!
//! Serialized in the Cytoscape element shape so a renderer can consume the
//! list directly:
//!
//! ```json
//! {"data": {"id": "addr", "label": "1000"}, "position": {"x": 50.0, "y": 0.0},
//!  "selectable": true, "grabbable": true, "classes": "linked-input"}
//! {"data": {"source": "addr", "target": "addr2"}, "classes": "deterministic-edge"}
//! ```

use serde::{Deserialize, Serialize};

/// Style class of an input node that is part of a deterministic link.
pub const LINKED_INPUT_CLASS: &str = "linked-input";

/// Style class of a deterministic edge.
pub const DETERMINISTIC_EDGE_CLASS: &str = "deterministic-edge";

/// Layout hint for a node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal lane.
    pub x: f64,
    /// Vertical placement.
    pub y: f64,
}

/// Node payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeData {
    /// Node identity (address or outpoint identifier).
    pub id: String,
    /// Display label (the txo value in satoshis).
    pub label: String,
}

/// A graph node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Identity and label.
    pub data: NodeData,
    /// Layout hint.
    pub position: Position,
    /// Whether the renderer lets the user select the node.
    pub selectable: bool,
    /// Whether the renderer lets the user drag the node.
    pub grabbable: bool,
    /// Style class; `None` means default styling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classes: Option<String>,
}

/// Edge payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeData {
    /// Source node id.
    pub source: String,
    /// Target node id.
    pub target: String,
}

/// A directed graph edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    /// Endpoints.
    pub data: EdgeData,
    /// Style class.
    pub classes: String,
}

/// One renderable element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GraphElement {
    /// A node.
    Node(GraphNode),
    /// An edge.
    Edge(GraphEdge),
}

impl GraphElement {
    /// The node, if this element is one.
    pub fn as_node(&self) -> Option<&GraphNode> {
        match self {
            Self::Node(node) => Some(node),
            Self::Edge(_) => None,
        }
    }

    /// The edge, if this element is one.
    pub fn as_edge(&self) -> Option<&GraphEdge> {
        match self {
            Self::Edge(edge) => Some(edge),
            Self::Node(_) => None,
        }
    }
}

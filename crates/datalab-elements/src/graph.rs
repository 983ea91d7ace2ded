//! Graph data model
//!
//! Field names follow the shared elements catalog (camelCase) so a graph
//! serialized here can be published to the execution backend unchanged.

use crate::definition::PropValue;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Node identifier, unique within a graph
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    /// Generate a fresh id
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("node_{}", Ulid::new().to_string().to_lowercase()))
    }

    /// Borrow as str
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Edge identifier, unique within a graph
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(pub String);

impl EdgeId {
    /// Generate a fresh id
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("edge_{}", Ulid::new().to_string().to_lowercase()))
    }
}

impl From<&str> for EdgeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canvas coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal
    pub x: f64,
    /// Vertical
    pub y: f64,
}

impl Position {
    /// Create position
    #[inline]
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A placed node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeInstance {
    /// Unique id
    pub id: NodeId,
    /// Element type key
    #[serde(rename = "type")]
    pub element_type: String,
    /// Display label
    pub label: String,
    /// Property values
    #[serde(default)]
    pub props: IndexMap<String, PropValue>,
    /// Canvas position
    pub position: Position,
}

/// One end of an edge
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortRef {
    /// Node id
    pub node: NodeId,
    /// Port key on that node
    pub port: String,
}

impl PortRef {
    /// Create port reference
    #[must_use]
    pub fn new(node: impl Into<NodeId>, port: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            port: port.into(),
        }
    }
}

/// Directed connection from an output port to an input port
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    /// Unique id
    pub id: EdgeId,
    /// Source output
    pub from: PortRef,
    /// Target input
    pub to: PortRef,
}

impl GraphEdge {
    /// Whether either end touches `node`
    #[inline]
    #[must_use]
    pub fn touches(&self, node: &NodeId) -> bool {
        self.from.node == *node || self.to.node == *node
    }
}

/// A complete graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphDefinition {
    /// Graph id
    pub id: String,
    /// Display name
    pub name: String,
    /// Owning tenant
    pub tenant_id: String,
    /// Owning workspace
    pub workspace_id: String,
    /// Nodes in insertion order
    #[serde(default)]
    pub nodes: Vec<NodeInstance>,
    /// Edges in insertion order
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
    /// Free-form metadata
    #[serde(default)]
    pub metadata: IndexMap<String, serde_json::Value>,
}

impl GraphDefinition {
    /// Empty graph
    #[must_use]
    pub fn empty(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            tenant_id: "lab".to_string(),
            workspace_id: "default".to_string(),
            nodes: Vec::new(),
            edges: Vec::new(),
            metadata: IndexMap::new(),
        }
    }

    /// Find node by id
    #[must_use]
    pub fn node(&self, id: &NodeId) -> Option<&NodeInstance> {
        self.nodes.iter().find(|n| n.id == *id)
    }

    /// Whether a node exists
    #[inline]
    #[must_use]
    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.node(id).is_some()
    }

    pub(crate) fn node_mut(&mut self, id: &NodeId) -> Option<&mut NodeInstance> {
        self.nodes.iter_mut().find(|n| n.id == *id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_distinct() {
        let a = NodeId::generate();
        let b = NodeId::generate();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("node_"));
        assert!(EdgeId::generate().0.starts_with("edge_"));
    }

    #[test]
    fn graph_json_shape() {
        let mut graph = GraphDefinition::empty("g", "Demo");
        graph.nodes.push(NodeInstance {
            id: NodeId::from("n1"),
            element_type: "prompt".to_string(),
            label: "Prompt".to_string(),
            props: IndexMap::new(),
            position: Position::new(1.0, 2.0),
        });
        graph.edges.push(GraphEdge {
            id: EdgeId::from("e1"),
            from: PortRef::new("n1", "text"),
            to: PortRef::new("n2", "prompt"),
        });

        let json = serde_json::to_value(&graph).unwrap();
        assert_eq!(json["tenantId"], "lab");
        assert_eq!(json["nodes"][0]["type"], "prompt");
        assert_eq!(json["edges"][0]["from"]["node"], "n1");

        let back: GraphDefinition = serde_json::from_value(json).unwrap();
        assert_eq!(back, graph);
    }

    #[test]
    fn edge_touches_either_end() {
        let edge = GraphEdge {
            id: EdgeId::from("e"),
            from: PortRef::new("a", "out"),
            to: PortRef::new("b", "in"),
        };
        assert!(edge.touches(&NodeId::from("a")));
        assert!(edge.touches(&NodeId::from("b")));
        assert!(!edge.touches(&NodeId::from("c")));
    }
}

//! Error types for elements and graphs
//!
//! Unknown node ids and node types on store mutations are *not* errors; those
//! operations are silent no-ops. The errors here cover catalog validation,
//! schema-driven property editing and pre-publish graph checks.

use crate::definition::PortDirection;
use crate::graph::{EdgeId, NodeId};

/// Element definition and property errors
#[derive(Debug, thiserror::Error)]
pub enum ElementError {
    /// Identifier does not match `type@major.minor.patch`
    #[error("invalid element id \"{0}\": expected type@major.minor.patch")]
    InvalidElementId(String),

    /// Explicit identifier disagrees with `type@version`
    #[error("element id mismatch: got \"{found}\" but expected \"{expected}\"")]
    ElementIdMismatch {
        /// Identifier on the definition
        found: String,
        /// `type@version`
        expected: String,
    },

    /// No definition registered for a node type
    #[error("unknown element type: {0}")]
    UnknownElementType(String),

    /// Property key not declared in the definition's schema
    #[error("unknown property \"{key}\" for element type {element_type}")]
    UnknownProperty {
        /// Element type
        element_type: String,
        /// Offending key
        key: String,
    },

    /// Value rejected by the property schema
    #[error("invalid value for property \"{key}\": {reason}")]
    InvalidPropValue {
        /// Property key
        key: String,
        /// Why it was rejected
        reason: String,
    },

    /// Catalog file could not be read
    #[error("failed to read catalog: {0}")]
    CatalogIo(#[from] std::io::Error),

    /// Catalog JSON could not be parsed
    #[error("failed to parse catalog: {0}")]
    CatalogParse(#[from] serde_json::Error),
}

/// Reasons a graph cannot be published for execution
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphValidationError {
    /// No nodes at all
    #[error("graph must contain at least one node")]
    Empty,

    /// Node references an unregistered type
    #[error("node {node} has unregistered type {element_type}")]
    UnknownNodeType {
        /// Node id
        node: NodeId,
        /// Its type
        element_type: String,
    },

    /// Edge endpoint references a missing node
    #[error("edge {edge} references unknown node {node}")]
    DanglingEdge {
        /// Edge id
        edge: EdgeId,
        /// Missing node id
        node: NodeId,
    },

    /// Edge endpoint references a port the definition does not declare
    #[error("edge {edge} references unknown {direction} port \"{port}\" on node {node}")]
    UnknownPort {
        /// Edge id
        edge: EdgeId,
        /// Node id
        node: NodeId,
        /// Port key
        port: String,
        /// Which side of the node
        direction: PortDirection,
    },

    /// Graph is not acyclic
    #[error("graph contains a cycle through node {node}")]
    Cycle {
        /// A node on the cycle
        node: NodeId,
    },
}

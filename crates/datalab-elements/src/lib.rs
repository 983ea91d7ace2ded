//! DataLab Elements
//!
//! Node types and the node-graph editor behind the Elements workbench.
//!
//! # Core Concepts
//!
//! - [`ElementDefinition`]: a node type with ports, property schema and runtime
//! - [`ElementRegistry`]: last-write-wins lookup of definitions by type
//! - [`ElementsCatalog`]: the shared JSON catalog, validated on load
//! - [`GraphStore`]: single graph + selection cursor with atomic mutations
//! - [`validate_for_publish`]: checks a graph before it goes to the executor
//!
//! # Example
//!
//! ```rust,ignore
//! use datalab_elements::{ConnectionRequest, ElementRegistry, GraphStore};
//! use std::sync::Arc;
//!
//! let mut store = GraphStore::with_default_graph(Arc::new(ElementRegistry::with_builtins()));
//! let llm = store.add_node("llm").unwrap();
//! store.connect_with_defaults(&ConnectionRequest::between("node_prompt", llm.as_str()));
//! let order = store.validate_for_publish()?;
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod builtin;
mod catalog;
mod definition;
mod error;
mod graph;
mod presets;
mod registry;
mod store;
mod validate;

pub use builtin::builtin_definitions;
pub use catalog::{is_element_id, validate_definition, ElementsCatalog};
pub use definition::{
    ElementDefinition, Executor, PortDefinition, PortDirection, PropKind, PropValue, PropertySchema,
    RuntimeBinding,
};
pub use error::{ElementError, GraphValidationError};
pub use graph::{EdgeId, GraphDefinition, GraphEdge, NodeId, NodeInstance, PortRef, Position};
pub use presets::default_graph;
pub use registry::ElementRegistry;
pub use store::{ConnectionRequest, GraphStore};
pub use validate::validate_for_publish;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Pre-publish graph checks
//!
//! The store itself never rejects a mutation; these checks run when a graph
//! is about to be handed to the execution backend.

use crate::definition::PortDirection;
use crate::error::GraphValidationError;
use crate::graph::{GraphDefinition, NodeId};
use crate::registry::ElementRegistry;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

/// Validate a graph and return a topological execution order
///
/// Checks, in order: non-empty, every node type registered, every edge
/// endpoint exists, every edge port is declared on the right side of its
/// node's definition, and the graph is acyclic.
///
/// # Errors
/// The first [`GraphValidationError`] found.
pub fn validate_for_publish(
    graph: &GraphDefinition,
    registry: &ElementRegistry,
) -> Result<Vec<NodeId>, GraphValidationError> {
    if graph.nodes.is_empty() {
        return Err(GraphValidationError::Empty);
    }

    for node in &graph.nodes {
        if !registry.contains(&node.element_type) {
            return Err(GraphValidationError::UnknownNodeType {
                node: node.id.clone(),
                element_type: node.element_type.clone(),
            });
        }
    }

    let mut dag: DiGraph<&NodeId, ()> = DiGraph::with_capacity(graph.nodes.len(), graph.edges.len());
    let indices: HashMap<&NodeId, NodeIndex> = graph
        .nodes
        .iter()
        .map(|n| (&n.id, dag.add_node(&n.id)))
        .collect();

    for edge in &graph.edges {
        for (end, direction) in [(&edge.from, PortDirection::Out), (&edge.to, PortDirection::In)] {
            let Some(node) = graph.node(&end.node) else {
                return Err(GraphValidationError::DanglingEdge {
                    edge: edge.id.clone(),
                    node: end.node.clone(),
                });
            };
            let declared = registry
                .get(&node.element_type)
                .is_some_and(|d| d.ports(direction).contains_key(&end.port));
            if !declared {
                return Err(GraphValidationError::UnknownPort {
                    edge: edge.id.clone(),
                    node: end.node.clone(),
                    port: end.port.clone(),
                    direction,
                });
            }
        }
        dag.add_edge(indices[&edge.from.node], indices[&edge.to.node], ());
    }

    toposort(&dag, None)
        .map(|order| order.into_iter().map(|ix| dag[ix].clone()).collect())
        .map_err(|cycle| GraphValidationError::Cycle {
            node: dag[cycle.node_id()].clone(),
        })
}

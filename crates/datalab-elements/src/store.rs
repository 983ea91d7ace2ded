//! Graph editor store
//!
//! [`GraphStore`] owns exactly one [`GraphDefinition`] plus a selection
//! cursor. Every mutation is a single synchronous transition through
//! `&mut self`; there is no undo history and nothing is persisted.
//!
//! References to unknown node ids or unregistered types are tolerated as
//! silent no-ops. Return values say whether anything changed, but callers are
//! free to ignore them.

use crate::definition::{PortDirection, PropValue};
use crate::error::{ElementError, GraphValidationError};
use crate::graph::{EdgeId, GraphDefinition, GraphEdge, NodeId, NodeInstance, PortRef, Position};
use crate::presets::default_graph;
use crate::registry::ElementRegistry;
use crate::validate::validate_for_publish;
use indexmap::IndexMap;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

/// Origin of the placement region for new nodes
const PLACEMENT_ORIGIN: f64 = 120.0;

/// Side length of the placement region for new nodes
const PLACEMENT_SPAN: f64 = 320.0;

/// Canvas connection gesture
///
/// Explicit handles win; otherwise the first declared port on the relevant
/// side is used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionRequest {
    /// Node the drag started from
    pub source: NodeId,
    /// Output handle picked on the source, if any
    pub source_handle: Option<String>,
    /// Node the drag ended on
    pub target: NodeId,
    /// Input handle picked on the target, if any
    pub target_handle: Option<String>,
}

impl ConnectionRequest {
    /// Connection with no explicit handles
    #[must_use]
    pub fn between(source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Self {
            source: source.into(),
            source_handle: None,
            target: target.into(),
            target_handle: None,
        }
    }
}

/// Node-graph editor state
#[derive(Debug)]
pub struct GraphStore {
    registry: Arc<ElementRegistry>,
    graph: GraphDefinition,
    selected: Option<NodeId>,
    rng: StdRng,
}

impl GraphStore {
    /// Create store holding `graph`, nothing selected
    #[must_use]
    pub fn new(registry: Arc<ElementRegistry>, graph: GraphDefinition) -> Self {
        Self {
            registry,
            graph,
            selected: None,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Create store seeded with the demo graph and its first node selected
    #[must_use]
    pub fn with_default_graph(registry: Arc<ElementRegistry>) -> Self {
        let graph = default_graph();
        let selected = graph.nodes.first().map(|n| n.id.clone());
        let mut store = Self::new(registry, graph);
        store.selected = selected;
        store
    }

    /// Use a deterministic placement sequence
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Current graph
    #[inline]
    #[must_use]
    pub fn graph(&self) -> &GraphDefinition {
        &self.graph
    }

    /// Registry consulted by this store
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &ElementRegistry {
        &self.registry
    }

    /// Selection cursor, possibly dangling
    #[inline]
    #[must_use]
    pub fn selected_id(&self) -> Option<&NodeId> {
        self.selected.as_ref()
    }

    /// Selected node; a dangling selection reads as none
    #[must_use]
    pub fn selected_node(&self) -> Option<&NodeInstance> {
        self.selected.as_ref().and_then(|id| self.graph.node(id))
    }

    /// Find node by id
    #[inline]
    #[must_use]
    pub fn node(&self, id: &NodeId) -> Option<&NodeInstance> {
        self.graph.node(id)
    }

    /// Replace the whole graph
    pub fn set_graph(&mut self, graph: GraphDefinition) {
        tracing::debug!(graph_id = %graph.id, nodes = graph.nodes.len(), "graph replaced");
        self.graph = graph;
    }

    /// Move the selection cursor; existence is not checked
    pub fn select_node(&mut self, id: Option<NodeId>) {
        self.selected = id;
    }

    /// Add a node of a registered type at a random position and select it
    ///
    /// Returns `None` without changing anything when the type is unknown.
    pub fn add_node(&mut self, element_type: &str) -> Option<NodeId> {
        let Some(definition) = self.registry.get(element_type) else {
            tracing::debug!(element_type, "add_node ignored: unregistered type");
            return None;
        };

        let position = Position::new(
            PLACEMENT_ORIGIN + self.rng.random::<f64>() * PLACEMENT_SPAN,
            PLACEMENT_ORIGIN + self.rng.random::<f64>() * PLACEMENT_SPAN,
        );
        let node = NodeInstance {
            id: NodeId::generate(),
            element_type: element_type.to_string(),
            label: definition.label.clone(),
            props: IndexMap::new(),
            position,
        };
        let id = node.id.clone();

        self.graph.nodes.push(node);
        self.selected = Some(id.clone());
        tracing::debug!(node = %id, element_type, "node added");
        Some(id)
    }

    /// Shallow-merge props into a node
    pub fn update_node_props(&mut self, id: &NodeId, partial: IndexMap<String, PropValue>) -> bool {
        let Some(node) = self.graph.node_mut(id) else {
            return false;
        };
        node.props.extend(partial);
        true
    }

    /// Replace a node's position
    pub fn update_node_position(&mut self, id: &NodeId, position: Position) -> bool {
        let Some(node) = self.graph.node_mut(id) else {
            return false;
        };
        node.position = position;
        true
    }

    /// Append an edge; endpoints and ports are not checked
    pub fn connect_nodes(&mut self, from: PortRef, to: PortRef) -> EdgeId {
        let id = EdgeId::generate();
        tracing::debug!(edge = %id, from = %from.node, to = %to.node, "nodes connected");
        self.graph.edges.push(GraphEdge {
            id: id.clone(),
            from,
            to,
        });
        id
    }

    /// Remove a node and every edge touching it
    pub fn delete_node(&mut self, id: &NodeId) -> bool {
        let before = self.graph.nodes.len();
        self.graph.nodes.retain(|n| n.id != *id);
        self.graph.edges.retain(|e| !e.touches(id));
        if self.selected.as_ref() == Some(id) {
            self.selected = None;
        }
        let removed = self.graph.nodes.len() != before;
        if removed {
            tracing::debug!(node = %id, "node deleted");
        }
        removed
    }

    /// Resolve the ports a canvas connection gesture should use
    ///
    /// Returns `None` if either node is missing, so no edge can be created
    /// toward a node that is not in the graph; a browser canvas would still
    /// connect such a gesture using the `"out"` / `"in"` port names.
    /// Unregistered types and types without ports on the relevant side fall
    /// back to `"out"` / `"in"`.
    #[must_use]
    pub fn resolve_connection(&self, request: &ConnectionRequest) -> Option<(PortRef, PortRef)> {
        let from = self.resolve_port(&request.source, request.source_handle.as_deref(), PortDirection::Out)?;
        let to = self.resolve_port(&request.target, request.target_handle.as_deref(), PortDirection::In)?;
        Some((from, to))
    }

    /// Resolve and connect in one step
    pub fn connect_with_defaults(&mut self, request: &ConnectionRequest) -> Option<EdgeId> {
        let (from, to) = self.resolve_connection(request)?;
        Some(self.connect_nodes(from, to))
    }

    fn resolve_port(&self, id: &NodeId, handle: Option<&str>, direction: PortDirection) -> Option<PortRef> {
        let node = self.graph.node(id)?;
        let port = handle
            .or_else(|| self.registry.default_port(&node.element_type, direction))
            .unwrap_or(direction.as_str());
        Some(PortRef::new(id.clone(), port))
    }

    /// Schema defaults overlaid with the node's own props
    #[must_use]
    pub fn effective_props(&self, id: &NodeId) -> Option<IndexMap<String, PropValue>> {
        let node = self.graph.node(id)?;
        let mut props = self
            .registry
            .get(&node.element_type)
            .map(|d| d.default_props())
            .unwrap_or_default();
        props.extend(node.props.iter().map(|(k, v)| (k.clone(), v.clone())));
        Some(props)
    }

    /// Set one prop from raw editor input, interpreted through the schema
    ///
    /// Returns `Ok(false)` when the node does not exist.
    ///
    /// # Errors
    /// `UnknownElementType`, `UnknownProperty` or `InvalidPropValue`.
    pub fn set_prop_from_input(&mut self, id: &NodeId, key: &str, raw: &str) -> Result<bool, ElementError> {
        let Some(node) = self.graph.node(id) else {
            return Ok(false);
        };
        let definition = self
            .registry
            .get(&node.element_type)
            .ok_or_else(|| ElementError::UnknownElementType(node.element_type.clone()))?;
        let schema = definition
            .props_schema
            .get(key)
            .ok_or_else(|| ElementError::UnknownProperty {
                element_type: node.element_type.clone(),
                key: key.to_string(),
            })?;
        let value = schema.coerce(key, raw)?;

        let mut partial = IndexMap::new();
        partial.insert(key.to_string(), value);
        Ok(self.update_node_props(id, partial))
    }

    /// Check the graph is executable and return its execution order
    ///
    /// # Errors
    /// The first [`GraphValidationError`] found.
    pub fn validate_for_publish(&self) -> Result<Vec<NodeId>, GraphValidationError> {
        validate_for_publish(&self.graph, &self.registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn store() -> GraphStore {
        GraphStore::with_default_graph(Arc::new(ElementRegistry::with_builtins())).with_seed(7)
    }

    fn id(s: &str) -> NodeId {
        NodeId::from(s)
    }

    #[test]
    fn default_graph_selects_first_node() {
        let store = store();
        assert_eq!(store.selected_id(), Some(&id("node_prompt")));
        assert_eq!(store.graph().nodes.len(), 3);
        assert_eq!(store.graph().edges.len(), 2);
    }

    #[test]
    fn add_node_places_within_region_and_selects() {
        let mut store = store();
        let new_id = store.add_node("prompt").unwrap();

        let node = store.node(&new_id).unwrap();
        assert_eq!(node.label, "Prompt");
        assert!(node.props.is_empty());
        assert!((120.0..440.0).contains(&node.position.x));
        assert!((120.0..440.0).contains(&node.position.y));
        assert_eq!(store.selected_id(), Some(&new_id));
        assert_eq!(store.graph().nodes.last().unwrap().id, new_id);
    }

    #[test]
    fn add_unknown_type_is_noop() {
        let mut store = store();
        let before = store.graph().clone();

        assert!(store.add_node("nonexistent-type").is_none());

        assert_eq!(store.graph(), &before);
        assert_eq!(store.selected_id(), Some(&id("node_prompt")));
    }

    #[test]
    fn update_props_shallow_merges() {
        let mut store = store();
        let mut partial = IndexMap::new();
        partial.insert("temperature".to_string(), PropValue::Number(0.9));
        partial.insert("maxTokens".to_string(), PropValue::Number(256.0));

        assert!(store.update_node_props(&id("node_llm"), partial));

        let props = &store.node(&id("node_llm")).unwrap().props;
        assert_eq!(props.get("model"), Some(&PropValue::from("gpt-4o-mini")));
        assert_eq!(props.get("temperature"), Some(&PropValue::Number(0.9)));
        assert_eq!(props.get("maxTokens"), Some(&PropValue::Number(256.0)));
    }

    #[test]
    fn update_missing_node_is_noop() {
        let mut store = store();
        let before = store.graph().clone();
        assert!(!store.update_node_props(&id("ghost"), IndexMap::new()));
        assert!(!store.update_node_position(&id("ghost"), Position::new(1.0, 1.0)));
        assert_eq!(store.graph(), &before);
    }

    #[test]
    fn update_position_replaces() {
        let mut store = store();
        assert!(store.update_node_position(&id("node_llm"), Position::new(5.0, 6.0)));
        assert_eq!(store.node(&id("node_llm")).unwrap().position, Position::new(5.0, 6.0));
    }

    #[test]
    fn connect_appends_edge_without_checks() {
        let mut store = store();
        let edge = store.connect_nodes(PortRef::new("node_prompt", "text"), PortRef::new("ghost", "in"));
        let last = store.graph().edges.last().unwrap();
        assert_eq!(last.id, edge);
        assert_eq!(last.to.node, id("ghost"));
    }

    #[test]
    fn delete_node_cascades_edges_and_selection() {
        let mut store = store();
        store.select_node(Some(id("node_llm")));

        assert!(store.delete_node(&id("node_llm")));

        assert_eq!(store.graph().nodes.len(), 2);
        assert!(store.graph().edges.is_empty());
        assert_eq!(store.selected_id(), None);
    }

    #[test]
    fn delete_unselected_node_keeps_selection() {
        let mut store = store();
        assert!(store.delete_node(&id("node_notebook")));
        assert_eq!(store.selected_id(), Some(&id("node_prompt")));
        assert_eq!(store.graph().edges.len(), 1);
    }

    #[test]
    fn delete_missing_node_is_noop() {
        let mut store = store();
        assert!(!store.delete_node(&id("ghost")));
        assert_eq!(store.graph().nodes.len(), 3);
    }

    #[test]
    fn dangling_selection_reads_as_none() {
        let mut store = store();
        store.select_node(Some(id("ghost")));
        assert_eq!(store.selected_id(), Some(&id("ghost")));
        assert!(store.selected_node().is_none());
    }

    #[test]
    fn resolve_connection_uses_first_ports() {
        let store = store();
        let (from, to) = store
            .resolve_connection(&ConnectionRequest::between("node_llm", "node_notebook"))
            .unwrap();
        assert_eq!(from, PortRef::new("node_llm", "response"));
        assert_eq!(to, PortRef::new("node_notebook", "parameters"));
    }

    #[test]
    fn resolve_connection_prefers_explicit_handles() {
        let store = store();
        let request = ConnectionRequest {
            source: id("node_notebook"),
            source_handle: Some("status".to_string()),
            target: id("node_llm"),
            target_handle: Some("context".to_string()),
        };
        let (from, to) = store.resolve_connection(&request).unwrap();
        assert_eq!(from.port, "status");
        assert_eq!(to.port, "context");
    }

    #[test]
    fn resolve_connection_falls_back_for_unregistered_types() {
        let mut graph = GraphDefinition::empty("g", "g");
        graph.nodes.push(NodeInstance {
            id: id("a"),
            element_type: "mystery".to_string(),
            label: "?".to_string(),
            props: IndexMap::new(),
            position: Position::default(),
        });
        graph.nodes.push(NodeInstance {
            id: id("b"),
            element_type: "mystery".to_string(),
            label: "?".to_string(),
            props: IndexMap::new(),
            position: Position::default(),
        });
        let mut store = GraphStore::new(Arc::new(ElementRegistry::with_builtins()), graph);

        let edge = store.connect_with_defaults(&ConnectionRequest::between("a", "b"));
        assert!(edge.is_some());
        let last = store.graph().edges.last().unwrap();
        assert_eq!(last.from.port, "out");
        assert_eq!(last.to.port, "in");

        assert!(store.resolve_connection(&ConnectionRequest::between("a", "ghost")).is_none());
    }

    #[test]
    fn missing_endpoint_never_resolves_or_connects() {
        let mut store = store();
        let edges = store.graph().edges.len();

        assert!(store.resolve_connection(&ConnectionRequest::between("ghost", "node_llm")).is_none());
        assert!(store.resolve_connection(&ConnectionRequest::between("node_llm", "ghost")).is_none());
        assert!(store.connect_with_defaults(&ConnectionRequest::between("node_llm", "ghost")).is_none());
        assert_eq!(store.graph().edges.len(), edges);
    }

    #[test]
    fn effective_props_overlay_defaults() {
        let store = store();
        let props = store.effective_props(&id("node_llm")).unwrap();
        assert_eq!(props.get("temperature"), Some(&PropValue::Number(0.2)));
        assert_eq!(props.get("maxTokens"), Some(&PropValue::Number(1024.0)));
        assert!(store.effective_props(&id("ghost")).is_none());
    }

    #[test]
    fn set_prop_from_input_coerces() {
        let mut store = store();
        assert!(store.set_prop_from_input(&id("node_llm"), "temperature", "1.1").unwrap());
        assert_eq!(
            store.node(&id("node_llm")).unwrap().props.get("temperature"),
            Some(&PropValue::Number(1.1))
        );

        assert!(matches!(
            store.set_prop_from_input(&id("node_llm"), "temperature", "9"),
            Err(ElementError::InvalidPropValue { .. })
        ));
        assert!(matches!(
            store.set_prop_from_input(&id("node_llm"), "colour", "red"),
            Err(ElementError::UnknownProperty { .. })
        ));
        assert!(!store.set_prop_from_input(&id("ghost"), "temperature", "1").unwrap());
    }

    #[test]
    fn set_graph_replaces_wholesale() {
        let mut store = store();
        store.set_graph(GraphDefinition::empty("other", "Other"));
        assert_eq!(store.graph().id, "other");
        assert!(store.graph().nodes.is_empty());
    }
}

use datalab_elements::*;
use datalab_test_utils::{builtin_registry, chain_store, default_store, seeded_store};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::HashSet;

#[test]
fn test_delete_cascades_single_edge() {
    let (mut store, ids) = chain_store(&["prompt", "llm"]);
    let (a, b) = (&ids[0], &ids[1]);
    assert_eq!(store.graph().edges[0].from, PortRef::new(a.clone(), "text"));

    store.delete_node(a);

    let graph = store.graph();
    assert_eq!(graph.nodes.len(), 1);
    assert_eq!(&graph.nodes[0].id, b);
    assert!(graph.edges.is_empty());
}

#[test]
fn test_delete_middle_of_demo_graph_drops_both_edges() {
    let mut store = default_store();
    store.select_node(Some(NodeId::from("node_llm")));

    assert!(store.delete_node(&NodeId::from("node_llm")));

    assert_eq!(store.graph().nodes.len(), 2);
    assert!(store.graph().edges.is_empty());
    assert_eq!(store.selected_id(), None);
}

#[test]
fn test_unknown_type_leaves_graph_untouched() {
    let mut store = seeded_store(42);
    store.add_node("prompt");
    store.add_node("notebook");
    let selected = store.selected_id().cloned();

    assert!(store.add_node("nonexistent-type").is_none());

    assert_eq!(store.graph().nodes.len(), 2);
    assert_eq!(store.selected_id().cloned(), selected);
}

#[test]
fn test_palette_flow_produces_publishable_graph() {
    let mut store = seeded_store(42);
    let prompt = store.add_node("prompt").unwrap();
    let llm = store.add_node("llm").unwrap();
    let notebook = store.add_node("notebook").unwrap();

    store
        .connect_with_defaults(&ConnectionRequest::between(prompt.clone(), llm.clone()))
        .unwrap();
    store
        .connect_with_defaults(&ConnectionRequest::between(llm.clone(), notebook.clone()))
        .unwrap();

    let order = store.validate_for_publish().unwrap();
    assert_eq!(order, vec![prompt, llm, notebook]);
}

#[test]
fn test_hot_swapped_definition_is_used_by_new_stores() {
    let mut registry = (*builtin_registry()).clone();
    registry.register(ElementDefinition::new("prompt", "2.0.0", "Prompt v2"));

    let mut store = GraphStore::new(std::sync::Arc::new(registry), GraphDefinition::empty("g", "g"));
    let id = store.add_node("prompt").unwrap();
    assert_eq!(store.node(&id).unwrap().label, "Prompt v2");
}

#[derive(Debug, Clone)]
enum Op {
    Add(usize),
    Connect(usize, usize),
    Delete(usize),
    Select(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..4usize).prop_map(Op::Add),
        (0..16usize, 0..16usize).prop_map(|(a, b)| Op::Connect(a, b)),
        (0..16usize).prop_map(Op::Delete),
        (0..16usize).prop_map(Op::Select),
    ]
}

proptest! {
    #[test]
    fn prop_no_dangling_edges_through_public_api(ops in proptest::collection::vec(op(), 0..60)) {
        let types = ["prompt", "llm", "notebook", "unknown"];
        let mut store = seeded_store(42);

        for op in ops {
            let ids: Vec<NodeId> = store.graph().nodes.iter().map(|n| n.id.clone()).collect();
            match op {
                Op::Add(t) => { store.add_node(types[t]); }
                Op::Connect(a, b) => {
                    if let (Some(a), Some(b)) = (ids.get(a), ids.get(b)) {
                        store.connect_with_defaults(&ConnectionRequest::between(a.clone(), b.clone()));
                    }
                }
                Op::Delete(i) => {
                    if let Some(id) = ids.get(i) { store.delete_node(id); }
                }
                Op::Select(i) => store.select_node(ids.get(i).cloned()),
            }
        }

        let graph = store.graph();
        let live: HashSet<_> = graph.nodes.iter().map(|n| &n.id).collect();
        for edge in &graph.edges {
            prop_assert!(live.contains(&edge.from.node));
            prop_assert!(live.contains(&edge.to.node));
        }
        prop_assert_eq!(live.len(), graph.nodes.len());

        let edge_ids: HashSet<_> = graph.edges.iter().map(|e| &e.id).collect();
        prop_assert_eq!(edge_ids.len(), graph.edges.len());
    }
}

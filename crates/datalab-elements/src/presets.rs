//! Preset graphs

use crate::definition::PropValue;
use crate::graph::{EdgeId, GraphDefinition, GraphEdge, NodeId, NodeInstance, PortRef, Position};
use indexmap::IndexMap;

/// The "LLM QA Loop" demo graph: prompt → llm → notebook
#[must_use]
pub fn default_graph() -> GraphDefinition {
    let mut graph = GraphDefinition::empty("graph_default", "LLM QA Loop");

    graph.nodes = vec![
        node(
            "node_prompt",
            "prompt",
            "Prompt",
            &[("title", "User prompt".into())],
            Position::new(150.0, 50.0),
        ),
        node(
            "node_llm",
            "llm",
            "LLM",
            &[("model", "gpt-4o-mini".into()), ("temperature", 0.2.into())],
            Position::new(420.0, 200.0),
        ),
        node(
            "node_notebook",
            "notebook",
            "Notebook",
            &[("notebook", "control_center_playground.ipynb".into())],
            Position::new(700.0, 360.0),
        ),
    ];

    graph.edges = vec![
        GraphEdge {
            id: EdgeId::from("edge_prompt_llm"),
            from: PortRef::new("node_prompt", "text"),
            to: PortRef::new("node_llm", "prompt"),
        },
        GraphEdge {
            id: EdgeId::from("edge_llm_notebook"),
            from: PortRef::new("node_llm", "response"),
            to: PortRef::new("node_notebook", "parameters"),
        },
    ];

    graph.metadata.insert("tags".to_string(), serde_json::json!(["qa", "demo"]));
    graph.metadata.insert("createdBy".to_string(), serde_json::json!("nihil"));
    graph
}

fn node(id: &str, element_type: &str, label: &str, props: &[(&str, PropValue)], position: Position) -> NodeInstance {
    NodeInstance {
        id: NodeId::from(id),
        element_type: element_type.to_string(),
        label: label.to_string(),
        props: props
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect::<IndexMap<_, _>>(),
        position,
    }
}

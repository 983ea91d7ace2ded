//! Subcommand implementations; each returns the text to print

use anyhow::{Context, Result};
use datalab_client::ApiClient;
use datalab_core::{DataLabConfig, InteractionOutcome, ManifestPoller, PromptComposer};
use datalab_elements::{
    default_graph, validate_for_publish, ElementDefinition, ElementRegistry, ElementsCatalog,
    GraphDefinition, PortDirection,
};
use datalab_telemetry::{replay, ChatSubmissionPayload, PayloadEnvelope, ReplayScript};
use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

/// Built-in registry, or a validated catalog file
pub(crate) fn load_registry(catalog: Option<&Path>) -> Result<ElementRegistry> {
    let Some(path) = catalog else {
        return Ok(ElementRegistry::with_builtins());
    };
    let catalog = ElementsCatalog::from_path(path)
        .with_context(|| format!("loading catalog {}", path.display()))?;
    catalog
        .validate()
        .with_context(|| format!("validating catalog {}", path.display()))?;
    tracing::info!(
        version = %catalog.catalog_version,
        elements = catalog.elements.len(),
        "catalog loaded"
    );
    Ok(catalog.into_registry())
}

fn port_list(definition: &ElementDefinition, direction: PortDirection) -> String {
    let keys: Vec<&str> = definition.ports(direction).keys().map(String::as_str).collect();
    if keys.is_empty() {
        "-".to_string()
    } else {
        keys.join(",")
    }
}

/// `datalab catalog`
pub(crate) fn catalog(catalog: Option<&Path>, json: bool) -> Result<String> {
    let registry = load_registry(catalog)?;
    if json {
        return Ok(serde_json::to_string_pretty(&registry.all())?);
    }

    let mut out = String::new();
    for definition in registry.iter() {
        writeln!(
            out,
            "{:<24} {:<16} in: {:<20} out: {}",
            definition.element_id(),
            definition.label,
            port_list(definition, PortDirection::In),
            port_list(definition, PortDirection::Out),
        )?;
    }
    Ok(out)
}

/// Demo graph, or a graph JSON file
pub(crate) fn load_graph(file: Option<&Path>) -> Result<GraphDefinition> {
    let Some(path) = file else {
        return Ok(default_graph());
    };
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing graph {}", path.display()))
}

/// `datalab graph`
pub(crate) fn graph(file: Option<&Path>, catalog: Option<&Path>, validate: bool) -> Result<String> {
    let graph = load_graph(file)?;
    if !validate {
        return Ok(serde_json::to_string_pretty(&graph)?);
    }

    let registry = load_registry(catalog)?;
    let order = validate_for_publish(&graph, &registry)
        .with_context(|| format!("graph {:?} is not publishable", graph.name))?;
    let order: Vec<&str> = order.iter().map(|id| id.as_str()).collect();
    Ok(format!(
        "{} ({} nodes, {} edges) is publishable\nexecution order: {}\n",
        graph.name,
        graph.nodes.len(),
        graph.edges.len(),
        order.join(" -> "),
    ))
}

/// `datalab replay`
pub(crate) fn replay_script(script: &Path, config: &DataLabConfig) -> Result<ChatSubmissionPayload> {
    let text = std::fs::read_to_string(script).with_context(|| format!("reading {}", script.display()))?;
    let script: ReplayScript =
        serde_json::from_str(&text).with_context(|| format!("parsing script {}", script.display()))?;
    let envelope = PayloadEnvelope::new(uuid::Uuid::new_v4().to_string())
        .with_ui_version(config.ui_version.clone())
        .with_model_hint(config.model_hint.clone());
    Ok(replay(&script, config.recorder, envelope))
}

/// `datalab manifest`: one refresh of the configured playground
pub(crate) async fn manifest(config: &DataLabConfig) -> Result<String> {
    let client = ApiClient::new(&config.api_base_url)?.with_timeout(config.request_timeout());
    let poller = ManifestPoller::from_config(config, Arc::new(client));
    poller.refresh().await;

    let state = poller.state();
    if let Some(error) = state.error {
        anyhow::bail!(error);
    }
    match (state.manifest, state.status) {
        (Some(manifest), _) => Ok(format!("{}\n", serde_json::to_string_pretty(&manifest)?)),
        (None, Some(status)) => Ok(format!("{status}\n")),
        (None, None) => Ok(String::new()),
    }
}

/// `datalab chat`: type `prompt` into a fresh recorder and submit it
pub(crate) async fn chat(prompt: &str, config: &DataLabConfig) -> Result<InteractionOutcome> {
    let client = ApiClient::new(&config.api_base_url)?.with_timeout(config.request_timeout());
    let composer = PromptComposer::from_config(config, Arc::new(client));

    let recorder = composer.recorder();
    let mut typed = String::new();
    for ch in prompt.chars() {
        recorder.key_down(&ch.to_string(), "Unidentified");
        typed.push(ch);
        recorder.set_prompt(typed.clone());
    }

    Ok(composer.submit().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn builtin_catalog_lists_ports() {
        let out = catalog(None, false).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("prompt@1.0.0"));
        assert!(lines[1].contains("in: prompt,context"));
        assert!(lines[2].ends_with("out: artifact,status"));
    }

    #[test]
    fn catalog_json_is_an_array() {
        let out = catalog(None, true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value.as_array().map(Vec::len), Some(3));
        assert_eq!(value[1]["type"], "llm");
    }

    #[test]
    fn invalid_catalog_file_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"catalogVersion":"1","elements":[{{"id":"Bad Id","type":"x","version":"1.0.0","label":"X"}}]}}"#
        )
        .unwrap();
        assert!(catalog(Some(file.path()), false).is_err());
    }

    #[test]
    fn default_graph_validates() {
        let out = graph(None, None, true).unwrap();
        assert!(out.contains("execution order: node_prompt -> node_llm -> node_notebook"));
    }

    #[test]
    fn cyclic_graph_file_fails_validation() {
        let mut cyclic = default_graph();
        cyclic.edges.push(datalab_elements::GraphEdge {
            id: "edge_back".into(),
            from: datalab_elements::PortRef::new("node_llm", "response"),
            to: datalab_elements::PortRef::new("node_prompt", "text"),
        });
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", serde_json::to_string(&cyclic).unwrap()).unwrap();

        assert!(graph(Some(file.path()), None, true).is_err());
        // dumping without validation still works
        assert!(graph(Some(file.path()), None, false).is_ok());
    }

    #[tokio::test]
    async fn manifest_reports_unpublished_playground() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/playgrounds/acme/board/manifests/latest"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;
        let config = DataLabConfig::new()
            .with_api_base_url(server.uri())
            .with_playground("acme", "board");

        let out = manifest(&config).await.unwrap();

        assert_eq!(
            out,
            "No manifest published for acme/board yet. Run the Welcome Cookbook to push one.\n"
        );
    }

    #[tokio::test]
    async fn manifest_backend_error_fails_command() {
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(wiremock::matchers::any())
            .respond_with(ResponseTemplate::new(500).set_body_string("db down"))
            .mount(&server)
            .await;
        let config = DataLabConfig::new().with_api_base_url(server.uri());

        let err = manifest(&config).await.unwrap_err();
        assert_eq!(err.to_string(), "Request failed (500): db down");
    }

    #[test]
    fn replay_uses_config_envelope() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"start_ms":1000,"events":[
                {{"type":"key","at_ms":1000,"key":"a","code":"KeyA"}},
                {{"type":"text","at_ms":1000,"text":"a"}},
                {{"type":"key","at_ms":1500,"key":"b","code":"KeyB"}},
                {{"type":"text","at_ms":1500,"text":"ab"}}
            ],"submit_at_ms":2300}}"#
        )
        .unwrap();
        let config = DataLabConfig::new().with_ui_version("cli-test");

        let payload = replay_script(file.path(), &config).unwrap();

        assert_eq!(payload.ui_version, "cli-test");
        assert_eq!(payload.total_duration_ms, 1300);
        assert_eq!(payload.pause_events.len(), 1);
        assert!(uuid::Uuid::parse_str(&payload.session_id).is_ok());
    }
}

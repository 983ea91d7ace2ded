//! Built-in node types seeded at startup

use crate::definition::{ElementDefinition, Executor, PortDefinition, PropertySchema};

/// The `prompt`, `llm` and `notebook` definitions, in palette order
#[must_use]
pub fn builtin_definitions() -> Vec<ElementDefinition> {
    vec![prompt(), llm(), notebook()]
}

fn prompt() -> ElementDefinition {
    ElementDefinition::new("prompt", "1.0.0", "Prompt")
        .with_icon("🗒️")
        .with_summary("Collects or transforms user prompts")
        .with_port(PortDefinition::input("text", "Prompt text", &["text"], false))
        .with_port(PortDefinition::output("text", "Prompt", &["text"], true))
        .with_prop("title", PropertySchema::string().with_default("New prompt"))
        .with_prop("variant", PropertySchema::string().with_enum(&["raw", "template"]))
        .with_runtime(Executor::Client, "prompt.execute")
}

fn llm() -> ElementDefinition {
    ElementDefinition::new("llm", "1.0.0", "LLM Call")
        .with_icon("⚡")
        .with_summary("Calls a configured large language model")
        .with_port(PortDefinition::input("prompt", "Prompt", &["text"], true))
        .with_port(PortDefinition::input("context", "Context", &["json", "vector"], false))
        .with_port(PortDefinition::output("response", "Response", &["text"], true))
        .with_prop(
            "model",
            PropertySchema::string()
                .with_enum(&["gpt-4o-mini", "gpt-4o", "claude-3-sonnet"])
                .with_default("gpt-4o-mini"),
        )
        .with_prop(
            "temperature",
            PropertySchema::number().with_range(0.0, 2.0).with_default(0.2),
        )
        .with_prop(
            "maxTokens",
            PropertySchema::number().with_range(64.0, 4096.0).with_default(1024.0),
        )
        .with_runtime(Executor::Server, "llm.invoke")
}

fn notebook() -> ElementDefinition {
    ElementDefinition::new("notebook", "1.0.0", "Notebook")
        .with_icon("📓")
        .with_summary("Triggers a parameterized Papermill run")
        .with_port(PortDefinition::input("parameters", "Parameters", &["json"], false))
        .with_port(PortDefinition::output("artifact", "Artifact", &["file", "json"], false))
        .with_port(PortDefinition::output("status", "Run status", &["json"], true))
        .with_prop(
            "notebook",
            PropertySchema::string().with_default("control_center_playground.ipynb"),
        )
        .with_prop("kernel", PropertySchema::string().with_default("python3"))
        .with_runtime(Executor::Server, "notebooks.run")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::validate_definition;

    #[test]
    fn builtins_have_valid_ids() {
        for def in builtin_definitions() {
            validate_definition(&def).unwrap();
        }
    }

    #[test]
    fn builtin_ports() {
        let defs = builtin_definitions();
        let llm = &defs[1];
        assert_eq!(llm.inputs.len(), 2);
        assert_eq!(llm.outputs.len(), 1);
        assert_eq!(defs[2].outputs.keys().collect::<Vec<_>>(), vec!["artifact", "status"]);
    }
}

//! Element definitions
//!
//! An [`ElementDefinition`] describes one node type: its ports, its property
//! schema and the runtime that executes it. Port and property maps are
//! insertion-ordered so "first declared port" is well defined.

use crate::error::ElementError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side of a node a port sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortDirection {
    /// Input port
    In,
    /// Output port
    Out,
}

impl PortDirection {
    /// Wire name, also used as the fallback port key
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PortDirection::In => "in",
            PortDirection::Out => "out",
        }
    }
}

impl fmt::Display for PortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One port on a node type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortDefinition {
    /// Port key, unique per direction
    pub key: String,
    /// Display label
    pub label: String,
    /// Accepted data kinds (`text`, `json`, `vector`, `file`, ...)
    #[serde(default)]
    pub accepts: Vec<String>,
    /// Side of the node
    pub direction: PortDirection,
    /// Whether the port must be connected
    #[serde(default)]
    pub required: bool,
}

impl PortDefinition {
    /// Input port
    #[must_use]
    pub fn input(key: &str, label: &str, accepts: &[&str], required: bool) -> Self {
        Self::new(key, label, accepts, PortDirection::In, required)
    }

    /// Output port
    #[must_use]
    pub fn output(key: &str, label: &str, accepts: &[&str], required: bool) -> Self {
        Self::new(key, label, accepts, PortDirection::Out, required)
    }

    fn new(key: &str, label: &str, accepts: &[&str], direction: PortDirection, required: bool) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            accepts: accepts.iter().map(|s| (*s).to_string()).collect(),
            direction,
            required,
        }
    }
}

/// Primitive kind of a property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropKind {
    /// Free text or enum
    String,
    /// Floating-point number
    Number,
    /// Toggle
    Boolean,
}

/// A node property value
///
/// Untagged on the wire so graphs round-trip with plain JSON props.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropValue {
    /// Boolean
    Bool(bool),
    /// Number
    Number(f64),
    /// String
    String(String),
    /// Anything else (arrays, objects, null)
    Json(serde_json::Value),
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Schema for one property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySchema {
    /// Value kind
    #[serde(rename = "type")]
    pub kind: PropKind,
    /// Default applied when the node has no value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<PropValue>,
    /// Allowed string values
    #[serde(default, rename = "enum", skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<String>>,
    /// Inclusive lower bound for numbers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    /// Inclusive upper bound for numbers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
}

impl PropertySchema {
    /// String property
    #[must_use]
    pub fn string() -> Self {
        Self::of(PropKind::String)
    }

    /// Number property
    #[must_use]
    pub fn number() -> Self {
        Self::of(PropKind::Number)
    }

    /// Boolean property
    #[must_use]
    pub fn boolean() -> Self {
        Self::of(PropKind::Boolean)
    }

    fn of(kind: PropKind) -> Self {
        Self {
            kind,
            default: None,
            allowed: None,
            minimum: None,
            maximum: None,
        }
    }

    /// With default value
    #[inline]
    #[must_use]
    pub fn with_default(mut self, value: impl Into<PropValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// With allowed values
    #[inline]
    #[must_use]
    pub fn with_enum(mut self, values: &[&str]) -> Self {
        self.allowed = Some(values.iter().map(|s| (*s).to_string()).collect());
        self
    }

    /// With inclusive numeric range
    #[inline]
    #[must_use]
    pub fn with_range(mut self, minimum: f64, maximum: f64) -> Self {
        self.minimum = Some(minimum);
        self.maximum = Some(maximum);
        self
    }

    /// Interpret raw editor input according to this schema
    ///
    /// # Errors
    /// `ElementError::InvalidPropValue` if the input cannot be parsed as the
    /// schema's kind or violates its enum/range.
    pub fn coerce(&self, key: &str, raw: &str) -> Result<PropValue, ElementError> {
        let value = match self.kind {
            PropKind::String => PropValue::String(raw.to_string()),
            PropKind::Number => raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map(PropValue::Number)
                .ok_or_else(|| invalid(key, format!("\"{raw}\" is not a number")))?,
            PropKind::Boolean => match raw.trim() {
                "true" => PropValue::Bool(true),
                "false" => PropValue::Bool(false),
                other => return Err(invalid(key, format!("\"{other}\" is not a boolean"))),
            },
        };
        self.validate(key, &value)?;
        Ok(value)
    }

    /// Check an already-typed value against this schema
    ///
    /// # Errors
    /// `ElementError::InvalidPropValue` on kind, enum or range violations.
    pub fn validate(&self, key: &str, value: &PropValue) -> Result<(), ElementError> {
        match (self.kind, value) {
            (PropKind::String, PropValue::String(s)) => {
                if let Some(allowed) = &self.allowed {
                    if !allowed.iter().any(|a| a == s) {
                        return Err(invalid(key, format!("\"{s}\" is not one of {allowed:?}")));
                    }
                }
                Ok(())
            }
            (PropKind::Number, PropValue::Number(n)) => {
                if let Some(min) = self.minimum {
                    if *n < min {
                        return Err(invalid(key, format!("{n} is below minimum {min}")));
                    }
                }
                if let Some(max) = self.maximum {
                    if *n > max {
                        return Err(invalid(key, format!("{n} is above maximum {max}")));
                    }
                }
                Ok(())
            }
            (PropKind::Boolean, PropValue::Bool(_)) => Ok(()),
            (kind, other) => Err(invalid(key, format!("expected {kind:?}, got {other:?}"))),
        }
    }
}

fn invalid(key: &str, reason: String) -> ElementError {
    ElementError::InvalidPropValue {
        key: key.to_string(),
        reason,
    }
}

/// Where a node type executes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Executor {
    /// In the browser shell
    Client,
    /// On the graph-execution backend
    Server,
}

/// Runtime binding for a node type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeBinding {
    /// Execution side
    pub executor: Executor,
    /// Handler name, e.g. `llm.invoke`
    pub handler: String,
}

/// A node type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementDefinition {
    /// Explicit `type@version` identifier, when supplied by a catalog
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Registry key
    #[serde(rename = "type")]
    pub element_type: String,
    /// Semantic version
    pub version: String,
    /// Display label, copied onto new nodes
    pub label: String,
    /// Palette icon
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// One-line description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Input ports by key
    #[serde(default)]
    pub inputs: IndexMap<String, PortDefinition>,
    /// Output ports by key
    #[serde(default)]
    pub outputs: IndexMap<String, PortDefinition>,
    /// Property schema by key
    #[serde(default)]
    pub props_schema: IndexMap<String, PropertySchema>,
    /// Execution binding
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<RuntimeBinding>,
}

impl ElementDefinition {
    /// Create definition with no ports or properties
    #[must_use]
    pub fn new(element_type: impl Into<String>, version: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: None,
            element_type: element_type.into(),
            version: version.into(),
            label: label.into(),
            icon: None,
            summary: None,
            inputs: IndexMap::new(),
            outputs: IndexMap::new(),
            props_schema: IndexMap::new(),
            runtime: None,
        }
    }

    /// With icon
    #[inline]
    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// With summary
    #[inline]
    #[must_use]
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// With a port; direction decides which map it lands in
    #[must_use]
    pub fn with_port(mut self, port: PortDefinition) -> Self {
        let ports = match port.direction {
            PortDirection::In => &mut self.inputs,
            PortDirection::Out => &mut self.outputs,
        };
        ports.insert(port.key.clone(), port);
        self
    }

    /// With a property schema entry
    #[must_use]
    pub fn with_prop(mut self, key: impl Into<String>, schema: PropertySchema) -> Self {
        self.props_schema.insert(key.into(), schema);
        self
    }

    /// With runtime binding
    #[inline]
    #[must_use]
    pub fn with_runtime(mut self, executor: Executor, handler: impl Into<String>) -> Self {
        self.runtime = Some(RuntimeBinding {
            executor,
            handler: handler.into(),
        });
        self
    }

    /// `type@version`
    #[must_use]
    pub fn element_id(&self) -> String {
        format!("{}@{}", self.element_type, self.version)
    }

    /// Ports on one side
    #[inline]
    #[must_use]
    pub fn ports(&self, direction: PortDirection) -> &IndexMap<String, PortDefinition> {
        match direction {
            PortDirection::In => &self.inputs,
            PortDirection::Out => &self.outputs,
        }
    }

    /// First declared port key on one side
    #[must_use]
    pub fn default_port(&self, direction: PortDirection) -> Option<&str> {
        self.ports(direction).keys().next().map(String::as_str)
    }

    /// Defaults from the property schema
    #[must_use]
    pub fn default_props(&self) -> IndexMap<String, PropValue> {
        self.props_schema
            .iter()
            .filter_map(|(key, schema)| schema.default.clone().map(|v| (key.clone(), v)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn llm_like() -> ElementDefinition {
        ElementDefinition::new("llm", "1.0.0", "LLM Call")
            .with_port(PortDefinition::input("prompt", "Prompt", &["text"], true))
            .with_port(PortDefinition::input("context", "Context", &["json"], false))
            .with_port(PortDefinition::output("response", "Response", &["text"], true))
            .with_prop(
                "model",
                PropertySchema::string()
                    .with_enum(&["gpt-4o-mini", "gpt-4o"])
                    .with_default("gpt-4o-mini"),
            )
            .with_prop("temperature", PropertySchema::number().with_range(0.0, 2.0).with_default(0.2))
    }

    #[test]
    fn element_id_joins_type_and_version() {
        assert_eq!(llm_like().element_id(), "llm@1.0.0");
    }

    #[test]
    fn default_port_is_first_declared() {
        let def = llm_like();
        assert_eq!(def.default_port(PortDirection::In), Some("prompt"));
        assert_eq!(def.default_port(PortDirection::Out), Some("response"));
    }

    #[test]
    fn default_props_from_schema() {
        let defaults = llm_like().default_props();
        assert_eq!(defaults.get("model"), Some(&PropValue::from("gpt-4o-mini")));
        assert_eq!(defaults.get("temperature"), Some(&PropValue::Number(0.2)));
    }

    #[test]
    fn coerce_number_in_range() {
        let schema = PropertySchema::number().with_range(0.0, 2.0);
        assert_eq!(schema.coerce("t", " 1.5 ").unwrap(), PropValue::Number(1.5));
        assert!(schema.coerce("t", "2.5").is_err());
        assert!(schema.coerce("t", "warm").is_err());
        assert!(schema.coerce("t", "NaN").is_err());
    }

    #[test]
    fn coerce_enum_membership() {
        let schema = PropertySchema::string().with_enum(&["raw", "template"]);
        assert!(schema.coerce("variant", "raw").is_ok());
        assert!(matches!(
            schema.coerce("variant", "fancy"),
            Err(ElementError::InvalidPropValue { .. })
        ));
    }

    #[test]
    fn coerce_boolean() {
        let schema = PropertySchema::boolean();
        assert_eq!(schema.coerce("b", "true").unwrap(), PropValue::Bool(true));
        assert!(schema.coerce("b", "yes").is_err());
    }

    #[test]
    fn validate_rejects_kind_mismatch() {
        let schema = PropertySchema::number();
        assert!(schema.validate("n", &PropValue::from("1")).is_err());
    }

    #[test]
    fn definition_json_uses_catalog_names() {
        let json = serde_json::to_value(llm_like()).unwrap();
        assert_eq!(json["type"], "llm");
        assert!(json.get("propsSchema").is_some());
        assert_eq!(json["propsSchema"]["model"]["enum"][1], "gpt-4o");
        assert_eq!(json["inputs"]["prompt"]["direction"], "in");
    }

    #[test]
    fn prop_value_untagged_round_trip() {
        let values: Vec<PropValue> = serde_json::from_str(r#"[true, 0.5, "x", [1, 2]]"#).unwrap();
        assert_eq!(values[0], PropValue::Bool(true));
        assert_eq!(values[1], PropValue::Number(0.5));
        assert_eq!(values[2], PropValue::from("x"));
        assert!(matches!(values[3], PropValue::Json(_)));
    }
}

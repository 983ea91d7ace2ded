//! Shared elements catalog
//!
//! The catalog is the JSON document both the dashboard and the execution
//! backend read node types from:
//!
//! ```json
//! { "catalogVersion": "1.0.0", "elements": [ { "id": "llm@1.0.0", "type": "llm", ... } ] }
//! ```

use crate::definition::ElementDefinition;
use crate::error::ElementError;
use crate::registry::ElementRegistry;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[allow(clippy::expect_used)]
static ELEMENT_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9-]+@\d+\.\d+\.\d+$").expect("static pattern"));

/// Whether `value` looks like `type@major.minor.patch`
#[must_use]
pub fn is_element_id(value: &str) -> bool {
    ELEMENT_ID_PATTERN.is_match(value)
}

/// Validate a definition's identifier
///
/// The derived `type@version` must match the id pattern, and an explicit `id`,
/// when present, must equal it.
///
/// # Errors
/// `InvalidElementId` or `ElementIdMismatch`.
pub fn validate_definition(definition: &ElementDefinition) -> Result<(), ElementError> {
    let expected = definition.element_id();
    let found = definition.id.as_deref().unwrap_or(&expected);
    if !is_element_id(found) {
        return Err(ElementError::InvalidElementId(found.to_string()));
    }
    if found != expected {
        return Err(ElementError::ElementIdMismatch {
            found: found.to_string(),
            expected,
        });
    }
    Ok(())
}

/// A versioned list of element definitions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementsCatalog {
    /// Catalog schema version
    pub catalog_version: String,
    /// Definitions
    pub elements: Vec<ElementDefinition>,
}

impl ElementsCatalog {
    /// Parse and validate catalog JSON
    ///
    /// # Errors
    /// Parse errors or the first invalid identifier.
    pub fn from_json_str(json: &str) -> Result<Self, ElementError> {
        let catalog: Self = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Read, parse and validate a catalog file
    ///
    /// # Errors
    /// IO, parse or validation errors.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ElementError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&raw)
    }

    /// Validate every definition's identifier
    ///
    /// # Errors
    /// The first invalid definition.
    pub fn validate(&self) -> Result<(), ElementError> {
        self.elements.iter().try_for_each(validate_definition)
    }

    /// Find by `type@version`
    #[must_use]
    pub fn find(&self, element_id: &str) -> Option<&ElementDefinition> {
        self.elements.iter().find(|d| d.element_id() == element_id)
    }

    /// Sorted identifiers
    #[must_use]
    pub fn element_ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.elements.iter().map(ElementDefinition::element_id).collect();
        ids.sort();
        ids
    }

    /// Registry seeded from this catalog, in catalog order
    #[must_use]
    pub fn into_registry(self) -> ElementRegistry {
        let mut registry = ElementRegistry::new();
        registry.register_many(self.elements);
        registry
    }
}

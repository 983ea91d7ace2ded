//! Element registry
//!
//! Provides [`ElementRegistry`], the lookup table from node type to its
//! [`ElementDefinition`]. Registration is last-write-wins per type; iteration
//! follows the order in which each type was first registered.

use crate::builtin::builtin_definitions;
use crate::definition::{ElementDefinition, PortDirection};
use indexmap::IndexMap;

/// Registry of node types
#[derive(Debug, Default, Clone)]
pub struct ElementRegistry {
    definitions: IndexMap<String, ElementDefinition>,
}

impl ElementRegistry {
    /// Create new empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            definitions: IndexMap::new(),
        }
    }

    /// Create registry with the built-in `prompt`, `llm` and `notebook` types
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_many(builtin_definitions());
        registry
    }

    /// Register a definition, replacing any previous one for the same type
    pub fn register(&mut self, definition: ElementDefinition) {
        let element_type = definition.element_type.clone();
        if let Some(previous) = self.definitions.insert(element_type, definition) {
            tracing::debug!(
                element_type = %previous.element_type,
                previous_version = %previous.version,
                "element definition replaced"
            );
        }
    }

    /// Register in order; later entries win over earlier ones of the same type
    pub fn register_many(&mut self, definitions: impl IntoIterator<Item = ElementDefinition>) {
        for definition in definitions {
            self.register(definition);
        }
    }

    /// All definitions in first-registration order
    #[must_use]
    pub fn all(&self) -> Vec<&ElementDefinition> {
        self.definitions.values().collect()
    }

    /// Look up a type
    #[inline]
    #[must_use]
    pub fn get(&self, element_type: &str) -> Option<&ElementDefinition> {
        self.definitions.get(element_type)
    }

    /// Check if type is registered
    #[inline]
    #[must_use]
    pub fn contains(&self, element_type: &str) -> bool {
        self.definitions.contains_key(element_type)
    }

    /// Registered type keys
    #[must_use]
    pub fn types(&self) -> Vec<&str> {
        self.definitions.keys().map(String::as_str).collect()
    }

    /// First declared port of a type on one side
    #[must_use]
    pub fn default_port(&self, element_type: &str, direction: PortDirection) -> Option<&str> {
        self.get(element_type)?.default_port(direction)
    }

    /// Get number of registered types
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Check if registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Iterate over definitions
    pub fn iter(&self) -> impl Iterator<Item = &ElementDefinition> {
        self.definitions.values()
    }
}

//! Type registry
//!
//! The plugin-factory catalog as seen by configuration: a table from
//! component type name to [`Schema`]. Every typed construction goes through
//! [`TypeRegistry::resolve_type`].

use crate::error::{CatalogError, CatalogResult};
use gconf_property::Schema;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Known component types
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    schemas: BTreeMap<String, Arc<Schema>>,
}

impl TypeRegistry {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema, returning the one it replaces
    pub fn register(&mut self, schema: Schema) -> Option<Arc<Schema>> {
        let name = schema.type_name().to_string();
        tracing::debug!("registering configurable type {}", name);
        self.schemas.insert(name, Arc::new(schema))
    }

    /// Schema for a type name
    ///
    /// # Errors
    /// Returns [`CatalogError::UnknownType`] when the type is not registered.
    pub fn resolve_type(&self, name: &str) -> CatalogResult<Arc<Schema>> {
        self.schemas
            .get(name)
            .cloned()
            .ok_or_else(|| CatalogError::UnknownType(name.to_string()))
    }

    /// Schema lookup without error
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<Schema>> {
        self.schemas.get(name)
    }

    /// Check if a type is registered
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    /// Registered type names, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    /// Number of registered types
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Check if registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Register every schema of another registry, replacing duplicates
    pub fn extend(&mut self, other: &TypeRegistry) {
        for (name, schema) in &other.schemas {
            self.schemas.insert(name.clone(), Arc::clone(schema));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gconf_property::ComponentKind;

    #[test]
    fn test_register_and_resolve() {
        let mut types = TypeRegistry::new();
        assert!(types.register(Schema::new("MyAlg", ComponentKind::Algorithm)).is_none());
        assert!(types.contains("MyAlg"));
        assert_eq!(types.resolve_type("MyAlg").unwrap().type_name(), "MyAlg");
        assert_eq!(
            types.resolve_type("Nope").unwrap_err(),
            CatalogError::UnknownType("Nope".into())
        );
    }

    #[test]
    fn test_replace_returns_previous() {
        let mut types = TypeRegistry::new();
        types.register(Schema::new("T", ComponentKind::Service));
        let old = types.register(Schema::new("T", ComponentKind::AlgTool));
        assert_eq!(old.unwrap().kind(), ComponentKind::Service);
        assert_eq!(types.len(), 1);
    }
}

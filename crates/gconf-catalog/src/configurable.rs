//! Configurable instances

use crate::name::QualifiedName;
use gconf_property::{ComponentKind, ComponentRef, Property, Schema, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Lifecycle state of a configurable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Lifecycle {
    /// Created, not yet read through a handle or applied
    #[default]
    Fresh,
    /// Instantiated or read on behalf of another component
    Queried,
    /// User-level apply action has run
    Applied,
    /// Removed from its catalog
    Purged,
}

/// Plain-data form of a configurable, used by snapshots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigurableParts {
    /// Qualified name
    pub name: QualifiedName,
    /// Declared type name
    pub type_name: String,
    /// Component kind
    pub kind: ComponentKind,
    /// Property slots
    pub properties: IndexMap<String, Property>,
    /// Private tools by leaf name
    pub tools: IndexMap<String, QualifiedName>,
    /// Lifecycle state
    pub state: Lifecycle,
    /// Apply flag for user-level configurables
    pub enabled: bool,
}

/// Named component instance with typed properties
///
/// Property writes go through [`Catalog`](crate::Catalog) so that key
/// resolution, freeze checks and diagnostics apply uniformly.
#[derive(Debug, Clone)]
pub struct Configurable {
    pub(crate) name: QualifiedName,
    pub(crate) type_name: String,
    pub(crate) kind: ComponentKind,
    pub(crate) schema: Option<Arc<Schema>>,
    pub(crate) properties: IndexMap<String, Property>,
    pub(crate) tools: IndexMap<String, QualifiedName>,
    pub(crate) state: Lifecycle,
    pub(crate) enabled: bool,
}

impl Configurable {
    /// Create a typed instance holding schema defaults
    #[must_use]
    pub fn typed(name: QualifiedName, schema: Arc<Schema>) -> Self {
        Self {
            type_name: schema.type_name().to_string(),
            kind: schema.kind(),
            properties: schema.instantiate(),
            schema: Some(schema),
            name,
            tools: IndexMap::new(),
            state: Lifecycle::Fresh,
            enabled: true,
        }
    }

    /// Create a generic instance accepting any key from options text
    #[must_use]
    pub fn generic(name: QualifiedName, type_name: impl Into<String>) -> Self {
        Self {
            name,
            type_name: type_name.into(),
            kind: ComponentKind::Generic,
            schema: None,
            properties: IndexMap::new(),
            tools: IndexMap::new(),
            state: Lifecycle::Fresh,
            enabled: true,
        }
    }

    /// Rebuild an instance from plain data
    ///
    /// The schema, when given, is attached as-is; values are not
    /// re-validated.
    #[must_use]
    pub fn from_parts(parts: ConfigurableParts, schema: Option<Arc<Schema>>) -> Self {
        Self {
            name: parts.name,
            type_name: parts.type_name,
            kind: parts.kind,
            schema,
            properties: parts.properties,
            tools: parts.tools,
            state: parts.state,
            enabled: parts.enabled,
        }
    }

    /// Plain-data copy of this instance
    #[must_use]
    pub fn to_parts(&self) -> ConfigurableParts {
        ConfigurableParts {
            name: self.name.clone(),
            type_name: self.type_name.clone(),
            kind: self.kind,
            properties: self.properties.clone(),
            tools: self.tools.clone(),
            state: self.state,
            enabled: self.enabled,
        }
    }

    /// Qualified name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &QualifiedName {
        &self.name
    }

    /// Short leaf name
    #[inline]
    #[must_use]
    pub fn leaf(&self) -> &str {
        self.name.leaf()
    }

    /// Declared type name (empty for untyped generics)
    #[inline]
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Component kind
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    /// Check for a generic configurable
    #[inline]
    #[must_use]
    pub fn is_generic(&self) -> bool {
        self.schema.is_none()
    }

    /// Check for a user-level meta configurable
    #[inline]
    #[must_use]
    pub fn is_user(&self) -> bool {
        self.kind == ComponentKind::User
    }

    /// Schema, for typed instances
    #[inline]
    #[must_use]
    pub fn schema(&self) -> Option<&Arc<Schema>> {
        self.schema.as_ref()
    }

    /// Property slots in declaration (or assignment) order
    #[inline]
    #[must_use]
    pub fn properties(&self) -> &IndexMap<String, Property> {
        &self.properties
    }

    /// Property slot by exact key
    #[inline]
    #[must_use]
    pub fn property(&self, key: &str) -> Option<&Property> {
        self.properties.get(key)
    }

    /// Current value by exact key
    #[inline]
    #[must_use]
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.properties.get(key).map(Property::value)
    }

    /// Explicitly set properties, sorted by key
    #[must_use]
    pub fn overridden(&self) -> Vec<(&str, &Property)> {
        let mut out: Vec<(&str, &Property)> = self
            .properties
            .iter()
            .filter(|(_, p)| p.is_overridden())
            .map(|(k, p)| (k.as_str(), p))
            .collect();
        out.sort_by(|a, b| a.0.cmp(b.0));
        out
    }

    /// All properties, sorted by key
    #[must_use]
    pub fn sorted_properties(&self) -> Vec<(&str, &Property)> {
        let mut out: Vec<(&str, &Property)> =
            self.properties.iter().map(|(k, p)| (k.as_str(), p)).collect();
        out.sort_by(|a, b| a.0.cmp(b.0));
        out
    }

    /// Private tools by leaf name
    #[inline]
    #[must_use]
    pub fn tools(&self) -> &IndexMap<String, QualifiedName> {
        &self.tools
    }

    /// Lifecycle state
    #[inline]
    #[must_use]
    pub fn state(&self) -> Lifecycle {
        self.state
    }

    /// Advance the lifecycle state
    pub fn set_state(&mut self, state: Lifecycle) {
        self.state = state;
    }

    /// Whether a user-level configurable will run its apply action
    #[inline]
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable the apply action
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Runtime name: `Type/leaf` for tools, `Type/Name` otherwise
    #[must_use]
    pub fn full_name(&self) -> String {
        self.component_ref().full_name()
    }

    /// Reference used when this configurable is stored in a handle
    #[must_use]
    pub fn component_ref(&self) -> ComponentRef {
        let name = if self.kind == ComponentKind::AlgTool {
            self.leaf().to_string()
        } else {
            self.name.to_string()
        };
        let type_name = if self.type_name.is_empty() {
            name.clone()
        } else {
            self.type_name.clone()
        };
        ComponentRef::new(type_name, name)
    }

    pub(crate) fn insert_property(&mut self, key: String, property: Property) {
        self.properties.insert(key, property);
    }

    pub(crate) fn property_mut(&mut self, key: &str) -> Option<&mut Property> {
        self.properties.get_mut(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gconf_property::{IntKind, TypeSpec};

    fn tool_schema() -> Arc<Schema> {
        Arc::new(
            Schema::new("MyTool", ComponentKind::AlgTool)
                .with_property("Level", TypeSpec::Int(IntKind::I32), 1)
                .expect("valid schema"),
        )
    }

    #[test]
    fn test_tool_full_name_uses_leaf() {
        let c = Configurable::typed("ToolSvc.X".parse().unwrap(), tool_schema());
        assert_eq!(c.full_name(), "MyTool/X");
    }

    #[test]
    fn test_algorithm_full_name() {
        let schema = Arc::new(Schema::new("MyAlg", ComponentKind::Algorithm));
        let c = Configurable::typed("Top".parse().unwrap(), schema);
        assert_eq!(c.full_name(), "MyAlg/Top");
    }

    #[test]
    fn test_generic_has_no_schema() {
        let c = Configurable::generic("Alg".parse().unwrap(), "");
        assert!(c.is_generic());
        assert!(c.properties().is_empty());
        assert_eq!(c.full_name(), "Alg/Alg");
    }

    #[test]
    fn test_parts_roundtrip() {
        let c = Configurable::typed("ToolSvc.X".parse().unwrap(), tool_schema());
        let back = Configurable::from_parts(c.to_parts(), c.schema().cloned());
        assert_eq!(back.to_parts(), c.to_parts());
        assert!(!back.is_generic());
    }

    #[test]
    fn test_defaults_are_not_overridden() {
        let c = Configurable::typed("ToolSvc.X".parse().unwrap(), tool_schema());
        assert_eq!(c.value("Level"), Some(&Value::Int(1)));
        assert!(c.overridden().is_empty());
        assert_eq!(c.sorted_properties().len(), 1);
    }
}

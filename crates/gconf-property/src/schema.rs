//! Component schemas
//!
//! A [`Schema`] is the table of property descriptors for one component type.
//! It replaces dynamic attribute lookup: each key resolves to a descriptor
//! exactly, case-insensitively (with a warning at the call site), or not at
//! all (with an optional near-match suggestion).

use crate::error::{PropertyError, PropertyResult};
use crate::property::Property;
use crate::spec::TypeSpec;
use crate::value::Value;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Component category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    /// Event-processing algorithm (may appear in control flow)
    Algorithm,
    /// Tool, owned by a component or by the tool service
    AlgTool,
    /// Service
    Service,
    /// Auditor
    Auditor,
    /// Meta-configurable applied before freeze; never emitted
    User,
    /// Untyped placeholder created by the options parser
    Generic,
}

impl ComponentKind {
    /// Parse a kind name as written in component databases
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name.to_ascii_lowercase().as_str() {
            "algorithm" | "alg" => Self::Algorithm,
            "algtool" | "tool" => Self::AlgTool,
            "service" | "svc" => Self::Service,
            "auditor" => Self::Auditor,
            "user" | "configurableuser" => Self::User,
            "generic" => Self::Generic,
            _ => return None,
        })
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Algorithm => "Algorithm",
            Self::AlgTool => "AlgTool",
            Self::Service => "Service",
            Self::Auditor => "Auditor",
            Self::User => "User",
            Self::Generic => "Generic",
        };
        f.write_str(name)
    }
}

/// One declared property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDescriptor {
    /// Key with canonical casing
    pub name: String,
    /// Declared type
    pub spec: TypeSpec,
    /// Validated default
    pub default: Value,
    /// Documentation string
    pub doc: String,
}

/// Outcome of resolving a property key against a schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyMatch<'a> {
    /// Key spelled exactly
    Exact(&'a str),
    /// Key matched ignoring case; carries the canonical spelling
    CaseInsensitive(&'a str),
    /// No such key; carries the closest declared key, if any is close
    Unknown(Option<&'a str>),
}

/// Property table of a component type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    type_name: String,
    kind: ComponentKind,
    properties: IndexMap<String, PropertyDescriptor>,
    doc: String,
}

impl Schema {
    /// Create an empty schema
    #[must_use]
    pub fn new(type_name: impl Into<String>, kind: ComponentKind) -> Self {
        Self {
            type_name: type_name.into(),
            kind,
            properties: IndexMap::new(),
            doc: String::new(),
        }
    }

    /// Declare a property, validating the default
    ///
    /// # Errors
    /// Fails on duplicate keys or when the default does not fit `spec`.
    pub fn declare(
        &mut self,
        name: impl Into<String>,
        spec: TypeSpec,
        default: Value,
        doc: impl Into<String>,
    ) -> PropertyResult<&mut Self> {
        let name = name.into();
        if self.properties.contains_key(&name) {
            return Err(PropertyError::DuplicateDeclaration {
                type_name: self.type_name.clone(),
                property: name,
            });
        }
        let default = spec
            .coerce(default)
            .map_err(|shape| PropertyError::InvalidDefault {
                property: name.clone(),
                shape,
            })?;
        self.properties.insert(
            name.clone(),
            PropertyDescriptor {
                name,
                spec,
                default,
                doc: doc.into(),
            },
        );
        Ok(self)
    }

    /// Builder form of [`Schema::declare`] without documentation
    ///
    /// # Errors
    /// Same as [`Schema::declare`].
    pub fn with_property(
        mut self,
        name: impl Into<String>,
        spec: TypeSpec,
        default: impl Into<Value>,
    ) -> PropertyResult<Self> {
        self.declare(name, spec, default.into(), "")?;
        Ok(self)
    }

    /// Attach a type-level doc string
    #[must_use]
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = doc.into();
        self
    }

    /// Component type name
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

    /// Type-level documentation
    #[inline]
    #[must_use]
    pub fn doc(&self) -> &str {
        &self.doc
    }

    /// Descriptor for an exactly spelled key
    #[inline]
    #[must_use]
    pub fn descriptor(&self, key: &str) -> Option<&PropertyDescriptor> {
        self.properties.get(key)
    }

    /// Declared descriptors in declaration order
    pub fn descriptors(&self) -> impl Iterator<Item = &PropertyDescriptor> {
        self.properties.values()
    }

    /// Number of declared properties
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Check for a schema without properties
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Resolve a possibly mis-cased key
    #[must_use]
    pub fn resolve_key(&self, key: &str) -> KeyMatch<'_> {
        if let Some((name, _)) = self.properties.get_key_value(key) {
            return KeyMatch::Exact(name);
        }
        if let Some(name) = self
            .properties
            .keys()
            .find(|name| name.eq_ignore_ascii_case(key))
        {
            return KeyMatch::CaseInsensitive(name);
        }
        KeyMatch::Unknown(self.suggest(key))
    }

    fn suggest(&self, key: &str) -> Option<&str> {
        let limit = (key.len() / 3).max(2);
        self.properties
            .keys()
            .map(|name| (strsim::levenshtein(name, key), name))
            .filter(|(distance, _)| *distance <= limit)
            .min_by_key(|(distance, _)| *distance)
            .map(|(_, name)| name.as_str())
    }

    /// Fresh property slots holding the declared defaults
    #[must_use]
    pub fn instantiate(&self) -> IndexMap<String, Property> {
        self.properties
            .values()
            .map(|d| (d.name.clone(), Property::new(d.spec.clone(), d.default.clone())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::IntKind;

    fn schema() -> Schema {
        Schema::new("MyAlg", ComponentKind::Algorithm)
            .with_property("TestProperty", TypeSpec::Int(IntKind::I32), 0)
            .and_then(|s| s.with_property("OutputLevel", TypeSpec::Int(IntKind::I32), 3))
            .expect("valid schema")
    }

    #[test]
    fn test_resolve_exact_and_case() {
        let s = schema();
        assert_eq!(s.resolve_key("TestProperty"), KeyMatch::Exact("TestProperty"));
        assert_eq!(
            s.resolve_key("testproperty"),
            KeyMatch::CaseInsensitive("TestProperty")
        );
    }

    #[test]
    fn test_suggestion_for_typo() {
        let s = schema();
        assert_eq!(s.resolve_key("OutputLevl"), KeyMatch::Unknown(Some("OutputLevel")));
        assert_eq!(s.resolve_key("Completely"), KeyMatch::Unknown(None));
    }

    #[test]
    fn test_invalid_default_rejected() {
        let err = Schema::new("T", ComponentKind::Service)
            .with_property("Flag", TypeSpec::Bool, "no")
            .unwrap_err();
        assert!(matches!(err, PropertyError::InvalidDefault { .. }));
    }

    #[test]
    fn test_duplicate_rejected() {
        let err = schema()
            .with_property("OutputLevel", TypeSpec::Int(IntKind::I32), 1)
            .unwrap_err();
        assert!(matches!(err, PropertyError::DuplicateDeclaration { .. }));
    }

    #[test]
    fn test_instantiate_defaults() {
        let props = schema().instantiate();
        assert_eq!(props.len(), 2);
        assert_eq!(props["OutputLevel"].value(), &Value::Int(3));
        assert!(!props["OutputLevel"].is_overridden());
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!(ComponentKind::parse("AlgTool"), Some(ComponentKind::AlgTool));
        assert_eq!(ComponentKind::parse("user"), Some(ComponentKind::User));
        assert_eq!(ComponentKind::parse("widget"), None);
    }
}

//! Error types for the configurable registry

use gconf_property::PropertyError;

/// Errors raised by catalog operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CatalogError {
    /// Type name unknown to the type registry
    #[error("unknown configurable type '{0}'")]
    UnknownType(String),

    /// Name already bound to a configurable of another type
    #[error("'{name}' already exists with type '{existing}', cannot create it as '{requested}'")]
    TypeMismatch {
        /// Qualified name
        name: String,
        /// Type of the live instance
        existing: String,
        /// Type asked for
        requested: String,
    },

    /// Key not declared by a strictly typed configurable
    #[error("configurable '{component}' has no property '{property}'{}", suggestion_suffix(.suggestion))]
    UnknownProperty {
        /// Qualified name
        component: String,
        /// Offending key
        property: String,
        /// Closest declared key
        suggestion: Option<String>,
    },

    /// Property-level failure on a named configurable
    #[error("{component}: {source}")]
    Property {
        /// Qualified name
        component: String,
        /// Underlying failure
        #[source]
        source: PropertyError,
    },

    /// No configurable with that name
    #[error("no configurable named '{0}'")]
    NotFound(String),

    /// Name already taken
    #[error("configurable '{0}' already exists")]
    AlreadyExists(String),

    /// Malformed qualified name
    #[error("invalid configurable name '{0}'")]
    InvalidName(String),

    /// Tool operation on a non-tool type
    #[error("'{name}' has type '{type_name}' which is not a tool")]
    NotATool {
        /// Name requested
        name: String,
        /// Its type
        type_name: String,
    },

    /// Handle operation on a non-handle property
    #[error("property '{component}.{property}' is not a component handle")]
    NotAHandle {
        /// Qualified name
        component: String,
        /// Property key
        property: String,
    },

    /// Mutation attempted after freeze
    #[error("the configuration is frozen and cannot be modified ({0})")]
    Frozen(String),

    /// `@ref` target does not exist
    #[error("Cannot find property '{target}' referenced by {component}.{property}")]
    UnresolvedReference {
        /// Referencing component
        component: String,
        /// Referencing property
        property: String,
        /// Referenced `Comp.Prop`
        target: String,
    },

    /// `@ref` pointing at itself
    #[error("property {component}.{property} references itself")]
    SelfReference {
        /// Component
        component: String,
        /// Property
        property: String,
    },

    /// `@ref` chain that loops
    #[error("circular property references: {0}")]
    ReferenceCycle(String),
}

fn suggestion_suffix(suggestion: &Option<String>) -> String {
    suggestion
        .as_ref()
        .map(|s| format!(" (did you mean '{s}'?)"))
        .unwrap_or_default()
}

impl CatalogError {
    /// Wrap a property error with the component name
    pub fn property(component: impl Into<String>, source: PropertyError) -> Self {
        Self::Property {
            component: component.into(),
            source,
        }
    }
}

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

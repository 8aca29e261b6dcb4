//! Error types for the property model

/// Shape violation found while coercing a value against a [`TypeSpec`](crate::TypeSpec)
///
/// Carries no property name; callers attach it via [`ShapeError::for_property`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected {expected}, received {received}{}", reason_suffix(.reason))]
pub struct ShapeError {
    /// Human-readable expected shape (C++-style type name)
    pub expected: String,
    /// Shape of the value that was offered
    pub received: String,
    /// Optional extra detail (range, element position)
    pub reason: Option<String>,
}

fn reason_suffix(reason: &Option<String>) -> String {
    reason
        .as_ref()
        .map(|r| format!(" ({r})"))
        .unwrap_or_default()
}

impl ShapeError {
    /// Create a shape error without extra detail
    pub fn new(expected: impl Into<String>, received: impl Into<String>) -> Self {
        Self {
            expected: expected.into(),
            received: received.into(),
            reason: None,
        }
    }

    /// Attach a detail message
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Promote to a [`PropertyError`] naming the property
    pub fn for_property(self, property: impl Into<String>) -> PropertyError {
        PropertyError::TypeMismatch {
            property: property.into(),
            shape: self,
        }
    }
}

/// Errors raised by the property model
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PropertyError {
    /// Assigned value does not match the declared type
    #[error("type mismatch for property '{property}': {shape}")]
    TypeMismatch {
        /// Property key
        property: String,
        /// What was expected and what was received
        shape: ShapeError,
    },

    /// Operation not defined for the property's shape (e.g. `+=` on a scalar)
    #[error("cannot {operation} property '{property}' holding {shape}")]
    UnsupportedOperation {
        /// Property key
        property: String,
        /// Operation name (append, merge, remove)
        operation: &'static str,
        /// Shape of the current value
        shape: String,
    },

    /// Type specification text could not be understood
    #[error("invalid type specification: '{0}'")]
    InvalidTypeSpec(String),

    /// Property declared twice in one schema
    #[error("property '{property}' declared twice for type '{type_name}'")]
    DuplicateDeclaration {
        /// Component type
        type_name: String,
        /// Property key
        property: String,
    },

    /// Declared default does not satisfy its own type
    #[error("invalid default for property '{property}': {shape}")]
    InvalidDefault {
        /// Property key
        property: String,
        /// Shape failure
        shape: ShapeError,
    },
}

/// Result type for property operations
pub type PropertyResult<T> = Result<T, PropertyError>;

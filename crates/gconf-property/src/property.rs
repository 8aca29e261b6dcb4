//! Property slots
//!
//! A [`Property`] pairs a declared [`TypeSpec`] with a default, a current
//! value, the overridden bit and the [`Source`] of the last write.

use crate::error::{PropertyError, PropertyResult, ShapeError};
use crate::spec::TypeSpec;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where the last write to a property came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Source {
    /// Declared default
    #[default]
    Default,
    /// Scripted configuration
    Script,
    /// Parsed options text
    Options,
    /// Command-line `--option`
    CommandLine,
    /// Post-config action
    PostAction,
    /// Restored from a dump
    Restore,
}

impl Source {
    /// Check whether writes from this source may create keys on generic configurables
    #[inline]
    #[must_use]
    pub fn is_textual(self) -> bool {
        matches!(
            self,
            Self::Options | Self::CommandLine | Self::PostAction | Self::Restore
        )
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Default => "default",
            Self::Script => "script",
            Self::Options => "options",
            Self::CommandLine => "command-line",
            Self::PostAction => "post-action",
            Self::Restore => "restore",
        };
        f.write_str(name)
    }
}

/// Typed, override-tracked value slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    spec: TypeSpec,
    default: Value,
    value: Value,
    overridden: bool,
    source: Source,
}

impl Property {
    /// Create a slot holding its default
    #[must_use]
    pub fn new(spec: TypeSpec, default: Value) -> Self {
        Self {
            spec,
            value: default.clone(),
            default,
            overridden: false,
            source: Source::Default,
        }
    }

    /// Create an untyped slot for a generic configurable
    ///
    /// The value counts as explicitly set.
    #[must_use]
    pub fn generic(value: Value, source: Source) -> Self {
        Self {
            spec: TypeSpec::Any,
            default: value.clone(),
            value,
            overridden: true,
            source,
        }
    }

    /// Restore a slot from previously captured parts
    #[must_use]
    pub fn from_parts(
        spec: TypeSpec,
        default: Value,
        value: Value,
        overridden: bool,
        source: Source,
    ) -> Self {
        Self {
            spec,
            default,
            value,
            overridden,
            source,
        }
    }

    /// Declared type
    #[inline]
    #[must_use]
    pub fn spec(&self) -> &TypeSpec {
        &self.spec
    }

    /// Current value
    #[inline]
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Declared default
    #[inline]
    #[must_use]
    pub fn default_value(&self) -> &Value {
        &self.default
    }

    /// Whether an explicit assignment happened
    #[inline]
    #[must_use]
    pub fn is_overridden(&self) -> bool {
        self.overridden
    }

    /// Source of the last write
    #[inline]
    #[must_use]
    pub fn source(&self) -> Source {
        self.source
    }

    /// Replace the value after type checking
    ///
    /// # Errors
    /// Returns [`ShapeError`] when the value does not fit the declared type.
    pub fn set(&mut self, value: Value, source: Source) -> Result<(), ShapeError> {
        self.value = self.spec.coerce(value)?;
        self.mark(source);
        Ok(())
    }

    /// Store a value that has already been validated
    pub fn set_unchecked(&mut self, value: Value, source: Source) {
        self.value = value;
        self.mark(source);
    }

    fn mark(&mut self, source: Source) {
        if source != Source::Default {
            self.overridden = true;
        }
        self.source = source;
    }

    /// Append to a sequence, add to a set, or insert into a mapping
    ///
    /// A collection delta is spliced element-wise; a scalar delta is a
    /// single element. Mappings require a mapping delta.
    ///
    /// # Errors
    /// Fails on scalar properties, unresolved references, and element-type
    /// violations.
    pub fn append(&mut self, key: &str, delta: Value, source: Source) -> PropertyResult<()> {
        let combined = combine(key, self.value.clone(), delta, "append")?;
        self.value = self
            .spec
            .coerce(combined)
            .map_err(|shape| shape.for_property(key))?;
        self.mark(source);
        Ok(())
    }

    /// Union for sets and mappings; append for sequences
    ///
    /// # Errors
    /// Same as [`Property::append`].
    pub fn merge(&mut self, key: &str, delta: Value, source: Source) -> PropertyResult<()> {
        self.append(key, delta, source)
    }

    /// Remove matching elements (or mapping keys); returns how many were removed
    ///
    /// # Errors
    /// Fails on scalar and fixed-arity tuple properties.
    pub fn remove(&mut self, key: &str, delta: &Value, source: Source) -> PropertyResult<usize> {
        let targets: Vec<&Value> = match delta {
            Value::List(items) | Value::Tuple(items) | Value::Set(items) => items.iter().collect(),
            Value::Map(entries) => entries.iter().map(|(k, _)| k).collect(),
            other => vec![other],
        };
        let removed = match &mut self.value {
            Value::List(items) | Value::Set(items) => {
                let before = items.len();
                items.retain(|item| !targets.contains(&item));
                before - items.len()
            }
            Value::Map(entries) => {
                let before = entries.len();
                entries.retain(|(k, _)| !targets.contains(&k));
                before - entries.len()
            }
            other => {
                return Err(PropertyError::UnsupportedOperation {
                    property: key.to_string(),
                    operation: "remove from",
                    shape: other.shape().to_string(),
                })
            }
        };
        if removed > 0 {
            self.mark(source);
        }
        Ok(removed)
    }

    /// Restore the declared default and clear the overridden bit
    pub fn reset(&mut self) {
        self.value = self.default.clone();
        self.overridden = false;
        self.source = Source::Default;
    }
}

fn combine(key: &str, current: Value, delta: Value, operation: &'static str) -> PropertyResult<Value> {
    let unsupported = |shape: &str| PropertyError::UnsupportedOperation {
        property: key.to_string(),
        operation,
        shape: shape.to_string(),
    };
    match current {
        Value::List(mut items) => {
            extend_items(&mut items, delta, false);
            Ok(Value::List(items))
        }
        Value::Set(mut items) => {
            extend_items(&mut items, delta, true);
            Ok(Value::Set(items))
        }
        Value::Map(mut entries) => match delta {
            Value::Map(new_entries) => {
                for (k, v) in new_entries {
                    match entries.iter_mut().find(|(existing, _)| *existing == k) {
                        Some(slot) => slot.1 = v,
                        None => entries.push((k, v)),
                    }
                }
                Ok(Value::Map(entries))
            }
            Value::List(items) | Value::Set(items) if items.is_empty() => Ok(Value::Map(entries)),
            other => Err(PropertyError::TypeMismatch {
                property: key.to_string(),
                shape: ShapeError::new("mapping", other.shape())
                    .with_reason("mapping append requires key and value"),
            }),
        },
        other => Err(unsupported(other.shape())),
    }
}

fn extend_items(items: &mut Vec<Value>, delta: Value, unique: bool) {
    let new_items = match delta {
        Value::List(v) | Value::Tuple(v) | Value::Set(v) => v,
        Value::Map(entries) if entries.is_empty() => Vec::new(),
        single => vec![single],
    };
    for item in new_items {
        if !unique || !items.contains(&item) {
            items.push(item);
        }
    }
}

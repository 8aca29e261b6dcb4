//! gconf Property Model
//!
//! Typed, validated, override-tracked values attached to configurable
//! components.
//!
//! # Core Concepts
//!
//! - **Value**: dynamic payload whose `Display` is options-language text
//! - **TypeSpec**: declared type; validates and normalizes assignments
//! - **Property**: slot with default, current value, overridden bit, source
//! - **Schema**: the property table of one component type
//!
//! # Example
//!
//! ```rust,ignore
//! use gconf_property::{ComponentKind, IntKind, Schema, Source, TypeSpec, Value};
//!
//! let schema = Schema::new("MyAlg", ComponentKind::Algorithm)
//!     .with_property("OutputLevel", TypeSpec::Int(IntKind::I32), 3)?;
//!
//! let mut props = schema.instantiate();
//! props["OutputLevel"].set(Value::Int(2), Source::Script)?;
//! assert!(props["OutputLevel"].is_overridden());
//! ```

#![warn(unreachable_pub)]

pub mod error;
pub mod level;
pub mod property;
pub mod schema;
pub mod spec;
pub mod value;

// Re-exports
pub use error::{PropertyError, PropertyResult, ShapeError};
pub use property::{Property, Source};
pub use schema::{ComponentKind, KeyMatch, PropertyDescriptor, Schema};
pub use spec::{AccessMode, HandleKind, HandleSpec, IntKind, TypeSpec};
pub use value::{escape, format_float, quote, unescape, ComponentRef, PropertyRef, Value};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with properties
    pub use crate::{
        ComponentKind, ComponentRef, HandleKind, IntKind, Property, PropertyError, PropertyRef,
        Schema, Source, TypeSpec, Value,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

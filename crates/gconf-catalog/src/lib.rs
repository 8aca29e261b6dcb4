//! gconf Catalog
//!
//! Registry of uniquely named configurable instances.
//!
//! # Overview
//!
//! The catalog provides:
//! - **QualifiedName**: dotted ownership path (`ToolSvc.Public.Private`)
//! - **TypeRegistry**: `resolve_type(name) -> Schema`
//! - **Configurable**: typed or generic instance with lifecycle state
//! - **Catalog**: singleton-by-name construction, tools, handles, freeze
//!
//! # Example
//!
//! ```rust,ignore
//! use gconf_catalog::{Catalog, TypeRegistry};
//! use gconf_property::Source;
//!
//! let mut catalog = Catalog::new(types);
//! catalog.get_or_create("MyAlg", "MyAlg1")?;
//! catalog.set("MyAlg1", "OutputLevel", 2, Source::Script)?;
//! catalog.add_tool("MyAlg1", "MyTool", "Helper")?;
//! catalog.freeze()?;
//! ```

#![warn(unreachable_pub)]

pub mod catalog;
pub mod configurable;
pub mod diagnostic;
pub mod error;
pub mod name;
pub mod registry;
mod resolve;

// Re-exports
pub use catalog::{spelling_warning, AssignOp, Catalog};
pub use configurable::{Configurable, ConfigurableParts, Lifecycle};
pub use diagnostic::{Diagnostic, Diagnostics, Severity};
pub use error::{CatalogError, CatalogResult};
pub use name::{QualifiedName, TOOL_SVC};
pub use registry::TypeRegistry;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for catalog operations
    pub use crate::{
        AssignOp, Catalog, CatalogError, Configurable, Lifecycle, QualifiedName, TypeRegistry,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

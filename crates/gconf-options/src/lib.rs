//! gconf Options
//!
//! Reads options text onto a [`Catalog`](gconf_catalog::Catalog) and writes
//! the configured catalog back out.
//!
//! # Core Concepts
//!
//! - **Parser**: `Component.Property (=|+=|-=) value;` statements, `//` and
//!   `/* */` comments, `#include`, `#units`, `#pragma print`, `#printOptions`
//! - **Interpreter**: applies statements in textual order through an
//!   [`OptionsHost`]; includes resolve against a [`SearchPath`] and are read
//!   once
//! - **Dumpers**: `.opts`, `.py`, `.json`, `.yaml`, `.pkl` selected by file
//!   extension from a [`FormatRegistry`]
//!
//! # Example
//!
//! ```rust,ignore
//! use gconf_options::{import_options, CatalogHost, DumpInput, SearchPath, default_formats};
//!
//! let mut host = CatalogHost::new(catalog, SearchPath::from_env());
//! import_options(&mut host, Path::new("job.opts"))?;
//! default_formats().write(Path::new("job.json"), &DumpInput::new(&host.catalog))?;
//! ```

#![warn(unreachable_pub)]

pub mod ast;
pub mod dump;
pub mod error;
pub mod include;
pub mod interp;
pub mod lexer;
pub mod parser;
pub mod units;

// Re-exports
pub use ast::{Expr, Statement};
pub use dump::{
    default_formats, flat_options, nested_options, restore_flat, ActionRecord, DumpInput, Dumper,
    FormatRegistry, JsonDumper, OptsDumper, PickleDumper, PyDumper, Snapshot, YamlDumper,
    SNAPSHOT_VERSION,
};
pub use error::{DumpError, DumpResult, LineIndex, Location, OptionsError, OptionsResult};
pub use include::{expand_env, SearchPath, SEARCH_PATH_VAR};
pub use interp::{
    apply_statement, canonical, import_options, is_options_file, CatalogHost, Interpreter,
    OptionsHost, COMMAND_LINE,
};
pub use parser::{parse, parse_value};
pub use units::Units;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for reading and dumping options
    pub use crate::{
        import_options, parse, parse_value, DumpInput, FormatRegistry, OptionsError,
        OptionsHost, SearchPath,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

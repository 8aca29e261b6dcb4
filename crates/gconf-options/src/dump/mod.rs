//! Configuration dumps
//!
//! Every format walks the needed configurables in alphabetical order of
//! qualified name and their properties in alphabetical order of key:
//! - `.opts`: options statements, readable by the parser
//! - `.py`: nested `{"Comp": {"Prop": value}}` text
//! - `.json`, `.yaml`/`.yml`: flat `{"Comp.Prop": "<options value>"}`
//! - `.pkl`: binary [`Snapshot`]

use crate::error::{DumpError, DumpResult};
use crate::parser::parse_value;
use gconf_catalog::{AssignOp, Catalog, Configurable};
use gconf_property::{Source, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

mod json;
mod opts;
mod pickle;
mod py;
mod yaml;

pub use json::JsonDumper;
pub use opts::OptsDumper;
pub use pickle::{PickleDumper, Snapshot, SNAPSHOT_VERSION};
pub use py::PyDumper;
pub use yaml::YamlDumper;

/// Serializable form of a pending post-config action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ActionRecord {
    /// Replace a property value
    SetProperty {
        /// Qualified component name
        component: String,
        /// Property key
        property: String,
        /// New value
        value: Value,
    },
    /// Append to a collection property
    Append {
        /// Qualified component name
        component: String,
        /// Property key
        property: String,
        /// Delta
        value: Value,
    },
    /// Call a registered script by name
    Invoke {
        /// Script name
        name: String,
        /// Positional arguments
        args: Vec<Value>,
    },
    /// Options statement text
    Statement(String),
}

/// What a dumper reads
#[derive(Debug, Clone, Copy)]
pub struct DumpInput<'a> {
    /// Configured catalog
    pub catalog: &'a Catalog,
    /// Pending post-config actions
    pub actions: &'a [ActionRecord],
    /// Include properties still at their defaults
    pub all: bool,
}

impl<'a> DumpInput<'a> {
    /// Input with explicitly set properties only and no actions
    #[must_use]
    pub fn new(catalog: &'a Catalog) -> Self {
        Self {
            catalog,
            actions: &[],
            all: false,
        }
    }

    /// Include default-valued properties
    #[must_use]
    pub fn with_all(mut self, all: bool) -> Self {
        self.all = all;
        self
    }

    /// Attach pending actions
    #[must_use]
    pub fn with_actions(mut self, actions: &'a [ActionRecord]) -> Self {
        self.actions = actions;
        self
    }
}

/// Writer for one dump format
pub trait Dumper: Send + Sync + 'static {
    /// Format label
    fn name(&self) -> &'static str;

    /// Handled file extensions, without the dot
    fn extensions(&self) -> &[&str];

    /// Check if this dumper handles `path`
    fn can_dump(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions().contains(&ext))
    }

    /// Encode the input
    ///
    /// # Errors
    /// Fails when encoding fails.
    fn dump(&self, input: &DumpInput<'_>) -> DumpResult<Vec<u8>>;
}

/// Dumpers by file extension
pub struct FormatRegistry {
    dumpers: Vec<Box<dyn Dumper>>,
}

impl Default for FormatRegistry {
    fn default() -> Self {
        default_formats()
    }
}

impl std::fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormatRegistry")
            .field("extensions", &self.all_extensions())
            .finish()
    }
}

impl FormatRegistry {
    /// Empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            dumpers: Vec::new(),
        }
    }

    /// Register a dumper; later registrations win on shared extensions
    pub fn register<D: Dumper>(&mut self, dumper: D) {
        self.dumpers.insert(0, Box::new(dumper));
    }

    /// Dumper for a path
    #[must_use]
    pub fn find_for_path(&self, path: &Path) -> Option<&dyn Dumper> {
        self.dumpers.iter().find(|d| d.can_dump(path)).map(|d| &**d)
    }

    /// All handled extensions
    #[must_use]
    pub fn all_extensions(&self) -> Vec<&str> {
        self.dumpers
            .iter()
            .flat_map(|d| d.extensions())
            .copied()
            .collect()
    }

    /// Encode for `path` without writing
    ///
    /// # Errors
    /// Returns [`DumpError::UnknownFormat`] for unhandled extensions.
    pub fn render(&self, path: &Path, input: &DumpInput<'_>) -> DumpResult<Vec<u8>> {
        let dumper = self
            .find_for_path(path)
            .ok_or_else(|| DumpError::UnknownFormat(path.display().to_string()))?;
        dumper.dump(input)
    }

    /// Encode and write to `path`
    ///
    /// # Errors
    /// Fails on unknown formats and write errors.
    pub fn write(&self, path: &Path, input: &DumpInput<'_>) -> DumpResult<()> {
        let bytes = self.render(path, input)?;
        std::fs::write(path, bytes).map_err(|e| DumpError::io(path.display(), &e))?;
        tracing::info!("configuration written to {}", path.display());
        Ok(())
    }
}

/// Registry with every built-in format
#[must_use]
pub fn default_formats() -> FormatRegistry {
    let mut registry = FormatRegistry::new();
    registry.register(OptsDumper);
    registry.register(PyDumper);
    registry.register(JsonDumper);
    registry.register(YamlDumper);
    registry.register(PickleDumper);
    registry
}

fn dumped_properties(conf: &Configurable, all: bool) -> Vec<(&str, &Value)> {
    conf.sorted_properties()
        .into_iter()
        .filter(|(_, p)| all || p.is_overridden())
        .map(|(k, p)| (k, p.value()))
        .collect()
}

/// `Comp.Prop -> value text` for every dumped property
#[must_use]
pub fn flat_options(catalog: &Catalog, all: bool) -> IndexMap<String, String> {
    let mut out = IndexMap::new();
    for conf in catalog.needed() {
        for (key, value) in dumped_properties(conf, all) {
            out.insert(format!("{}.{key}", conf.name()), value.to_string());
        }
    }
    out
}

/// `Comp -> Prop -> value text`; components without dumped properties are
/// listed empty
#[must_use]
pub fn nested_options(catalog: &Catalog, all: bool) -> IndexMap<String, IndexMap<String, String>> {
    catalog
        .needed()
        .into_iter()
        .map(|conf| {
            let props = dumped_properties(conf, all)
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            (conf.name().to_string(), props)
        })
        .collect()
}

/// Apply a flat dump to a catalog; returns the number of entries
///
/// # Errors
/// Fails on malformed keys, unparsable values and catalog rejections.
pub fn restore_flat(catalog: &mut Catalog, entries: &IndexMap<String, String>) -> DumpResult<usize> {
    for (key, text) in entries {
        let (component, property) = key
            .rsplit_once('.')
            .filter(|(c, p)| !c.is_empty() && !p.is_empty())
            .ok_or_else(|| DumpError::BadKey(key.clone()))?;
        let value = parse_value(text).map_err(|source| DumpError::Value {
            key: key.clone(),
            source,
        })?;
        catalog.lookup_or_generic(component)?;
        catalog.assign(component, property, AssignOp::Set, value, Source::Restore)?;
    }
    Ok(entries.len())
}

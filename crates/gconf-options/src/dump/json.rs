//! Flat JSON dump

use super::{flat_options, restore_flat, DumpInput, Dumper};
use crate::error::DumpResult;
use gconf_catalog::Catalog;
use indexmap::IndexMap;

/// Writes `{"Comp.Prop": "<options value>"}`
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDumper;

impl Dumper for JsonDumper {
    fn name(&self) -> &'static str {
        "json"
    }

    fn extensions(&self) -> &[&str] {
        &["json"]
    }

    fn dump(&self, input: &DumpInput<'_>) -> DumpResult<Vec<u8>> {
        let mut bytes = serde_json::to_vec_pretty(&flat_options(input.catalog, input.all))?;
        bytes.push(b'\n');
        Ok(bytes)
    }
}

impl JsonDumper {
    /// Restore a JSON dump into `catalog`
    ///
    /// # Errors
    /// Fails on malformed JSON or entries the catalog rejects.
    pub fn load(catalog: &mut Catalog, text: &str) -> DumpResult<usize> {
        let entries: IndexMap<String, String> = serde_json::from_str(text)?;
        restore_flat(catalog, &entries)
    }
}

//! Flat YAML dump, same structure as JSON

use super::{flat_options, restore_flat, DumpInput, Dumper};
use crate::error::DumpResult;
use gconf_catalog::Catalog;
use indexmap::IndexMap;

/// Writes `Comp.Prop: '<options value>'` entries
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlDumper;

impl Dumper for YamlDumper {
    fn name(&self) -> &'static str {
        "yaml"
    }

    fn extensions(&self) -> &[&str] {
        &["yaml", "yml"]
    }

    fn dump(&self, input: &DumpInput<'_>) -> DumpResult<Vec<u8>> {
        Ok(serde_yaml::to_string(&flat_options(input.catalog, input.all))?.into_bytes())
    }
}

impl YamlDumper {
    /// Restore a YAML dump into `catalog`
    ///
    /// # Errors
    /// Fails on malformed YAML or entries the catalog rejects.
    pub fn load(catalog: &mut Catalog, text: &str) -> DumpResult<usize> {
        let entries: IndexMap<String, String> = serde_yaml::from_str(text)?;
        restore_flat(catalog, &entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dump::tests::sample;

    #[test]
    fn test_round_trip() {
        let catalog = sample();
        let text = String::from_utf8(YamlDumper.dump(&DumpInput::new(&catalog)).unwrap()).unwrap();
        let mut types = gconf_catalog::TypeRegistry::new();
        types.extend(catalog.types());
        let mut restored = Catalog::new(types);
        assert_eq!(YamlDumper::load(&mut restored, &text).unwrap(), 3);
        assert_eq!(flat_options(&restored, false), flat_options(&catalog, false));
    }

    #[test]
    fn test_same_structure_as_json() {
        let catalog = sample();
        let yaml = YamlDumper.dump(&DumpInput::new(&catalog)).unwrap();
        let json = super::super::JsonDumper.dump(&DumpInput::new(&catalog)).unwrap();
        let from_yaml: IndexMap<String, String> = serde_yaml::from_slice(&yaml).unwrap();
        let from_json: IndexMap<String, String> = serde_json::from_slice(&json).unwrap();
        assert_eq!(from_yaml, from_json);
    }
}

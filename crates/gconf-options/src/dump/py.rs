//! Nested dictionary dump

use super::{nested_options, DumpInput, Dumper};
use crate::error::DumpResult;
use gconf_property::quote;

/// Writes `{"Comp": {"Prop": value, ...}, ...}` on one line
#[derive(Debug, Clone, Copy, Default)]
pub struct PyDumper;

impl PyDumper {
    /// Render as text
    #[must_use]
    pub fn render(input: &DumpInput<'_>) -> String {
        let components: Vec<String> = nested_options(input.catalog, input.all)
            .into_iter()
            .map(|(name, props)| {
                let props: Vec<String> = props
                    .into_iter()
                    .map(|(key, value)| format!("{}: {value}", quote(&key)))
                    .collect();
                format!("{}: {{{}}}", quote(&name), props.join(", "))
            })
            .collect();
        format!("{{{}}}\n", components.join(", "))
    }
}

impl Dumper for PyDumper {
    fn name(&self) -> &'static str {
        "python"
    }

    fn extensions(&self) -> &[&str] {
        &["py"]
    }

    fn dump(&self, input: &DumpInput<'_>) -> DumpResult<Vec<u8>> {
        Ok(Self::render(input).into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dump::tests::sample;
    use gconf_catalog::{Catalog, TypeRegistry};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render() {
        let catalog = sample();
        assert_eq!(
            PyDumper::render(&DumpInput::new(&catalog)),
            "{\"Alg\": {\"Flag\": True, \"Names\": [\"a\", \"b\"]}, \"MessageSvc\": {\"OutputLevel\": 5}}\n"
        );
    }

    #[test]
    fn test_empty_catalog() {
        let catalog = Catalog::new(TypeRegistry::new());
        assert_eq!(PyDumper::render(&DumpInput::new(&catalog)), "{}\n");
    }
}

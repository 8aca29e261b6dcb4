//! Options-statement dump

use super::{flat_options, DumpInput, Dumper};
use crate::error::DumpResult;
use std::fmt::Write;

/// Writes `Comp.Prop = value;` lines sorted by key
#[derive(Debug, Clone, Copy, Default)]
pub struct OptsDumper;

impl OptsDumper {
    /// Render as text
    #[must_use]
    pub fn render(input: &DumpInput<'_>) -> String {
        let mut out = String::new();
        for (key, value) in flat_options(input.catalog, input.all) {
            let _ = writeln!(out, "{key} = {value};");
        }
        out
    }
}

impl Dumper for OptsDumper {
    fn name(&self) -> &'static str {
        "options"
    }

    fn extensions(&self) -> &[&str] {
        &["opts"]
    }

    fn dump(&self, input: &DumpInput<'_>) -> DumpResult<Vec<u8>> {
        Ok(Self::render(input).into_bytes())
    }
}

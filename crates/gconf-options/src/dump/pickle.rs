//! Binary snapshot dump

use super::{ActionRecord, DumpInput, Dumper};
use crate::error::{DumpError, DumpResult};
use gconf_catalog::{AssignOp, Catalog, Configurable, ConfigurableParts};
use gconf_property::Source;
use serde::{Deserialize, Serialize};

/// Snapshot layout version
pub const SNAPSHOT_VERSION: u32 = 1;

/// Complete configured state: configurables with their slots plus pending
/// post-config actions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Layout version
    pub version: u32,
    /// Needed configurables in dump order
    pub configurables: Vec<ConfigurableParts>,
    /// Pending actions in registration order
    pub actions: Vec<ActionRecord>,
}

impl Snapshot {
    /// Capture the needed configurables of a catalog
    #[must_use]
    pub fn capture(catalog: &Catalog, actions: &[ActionRecord]) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            configurables: catalog.needed().into_iter().map(Configurable::to_parts).collect(),
            actions: actions.to_vec(),
        }
    }

    /// Encode with postcard
    ///
    /// # Errors
    /// Fails when encoding fails.
    pub fn encode(&self) -> DumpResult<Vec<u8>> {
        Ok(postcard::to_stdvec(self)?)
    }

    /// Decode and check the version
    ///
    /// # Errors
    /// Fails on corrupt input or a foreign version.
    pub fn decode(bytes: &[u8]) -> DumpResult<Self> {
        let snapshot: Self = postcard::from_bytes(bytes)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(DumpError::Version {
                found: snapshot.version,
                expected: SNAPSHOT_VERSION,
            });
        }
        Ok(snapshot)
    }

    /// Repopulate `catalog`, returning the pending actions
    ///
    /// Missing configurables are inserted as captured, keeping their slots
    /// and lifecycle. For existing ones, every explicitly set property is
    /// assigned again.
    ///
    /// # Errors
    /// Fails when the catalog rejects an entry.
    pub fn restore(self, catalog: &mut Catalog) -> DumpResult<Vec<ActionRecord>> {
        for parts in self.configurables {
            let key = parts.name.to_string();
            if catalog.contains(&key) {
                for (property, slot) in &parts.properties {
                    if slot.is_overridden() {
                        catalog.assign(
                            &key,
                            property,
                            AssignOp::Set,
                            slot.value().clone(),
                            Source::Restore,
                        )?;
                    }
                }
            } else {
                let schema = catalog.types().get(&parts.type_name).cloned();
                catalog.insert(Configurable::from_parts(parts, schema))?;
            }
        }
        tracing::debug!("restored {} configurables", catalog.len());
        Ok(self.actions)
    }
}

/// Writes a [`Snapshot`]
#[derive(Debug, Clone, Copy, Default)]
pub struct PickleDumper;

impl Dumper for PickleDumper {
    fn name(&self) -> &'static str {
        "pickle"
    }

    fn extensions(&self) -> &[&str] {
        &["pkl"]
    }

    fn dump(&self, input: &DumpInput<'_>) -> DumpResult<Vec<u8>> {
        Snapshot::capture(input.catalog, input.actions).encode()
    }
}

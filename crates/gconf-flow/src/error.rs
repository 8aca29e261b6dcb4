//! Error types for control-flow composition

use gconf_catalog::CatalogError;
use gconf_property::PropertyError;

/// Errors during control-flow construction and materialization
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FlowError {
    /// Leaf does not name an algorithm or sequencer
    #[error("'{name}' cannot appear in control flow: it is a {kind}")]
    NotAnAlgorithm {
        /// Qualified name
        name: String,
        /// Its component kind
        kind: String,
    },

    /// Configurable is not a sequencer
    #[error("'{0}' is not a sequencer")]
    NotASequencer(String),

    /// Sequencer membership would contain itself
    #[error("sequencer '{0}' would contain itself")]
    Cycle(String),

    /// Catalog operation failed
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Sequencer schema declaration failed
    #[error(transparent)]
    Property(#[from] PropertyError),
}

/// Result type for control-flow operations
pub type FlowResult<T> = Result<T, FlowError>;

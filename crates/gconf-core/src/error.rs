//! Error types for configuration sessions

use gconf_catalog::CatalogError;
use gconf_flow::FlowError;
use gconf_options::{DumpError, OptionsError};
use gconf_property::PropertyError;

/// Main session error type
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Catalog operation failed
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Property model failure outside a catalog write
    #[error(transparent)]
    Property(#[from] PropertyError),

    /// Reading options failed
    #[error(transparent)]
    Options(#[from] OptionsError),

    /// Reading or writing a dump failed
    #[error(transparent)]
    Dump(#[from] DumpError),

    /// Control-flow construction failed
    #[error(transparent)]
    Flow(#[from] FlowError),

    /// No script registered under that name
    #[error("no script registered as '{0}'")]
    UnknownScript(String),

    /// Script returned a name that is not in the catalog
    #[error("script '{script}' returned '{name}', which is not a configurable")]
    NotConfigurable {
        /// Script name
        script: String,
        /// Returned name
        name: String,
    },

    /// User-level type has no registered apply action
    #[error("'{0}' is not a ConfigurableUser type")]
    NotAUser(String),

    /// Queried dependency is not user-level
    #[error("'{user}': Cannot make passive use of '{other}', it is not a ConfigurableUser")]
    PassiveUse {
        /// Querying user-level configurable
        user: String,
        /// Dependency
        other: String,
    },

    /// ConfigurableUser dependencies loop
    #[error("Detected loop in the ConfigurableUser dependencies: {0:?}")]
    DependencyLoop(Vec<String>),

    /// A user-level apply action failed
    #[error("applying configuration of {name}: {source}")]
    Apply {
        /// User-level configurable
        name: String,
        /// Underlying failure
        #[source]
        source: Box<CoreError>,
    },

    /// A post-config action failed
    #[error("post-config action {label}: {source}")]
    PostAction {
        /// Action description
        label: String,
        /// Underlying failure
        #[source]
        source: Box<CoreError>,
    },

    /// Source file with an extension no loader handles
    #[error("cannot load '{0}': unsupported file type")]
    UnsupportedSource(String),

    /// Source file missing
    #[error("cannot find file '{0}'")]
    MissingFile(String),

    /// Reading a file failed
    #[error("cannot read '{path}': {message}")]
    Io {
        /// File path
        path: String,
        /// OS error text
        message: String,
    },

    /// Component database entry invalid
    #[error("component database {path}: {message}")]
    ComponentDb {
        /// Database file
        path: String,
        /// What was wrong
        message: String,
    },

    /// Error raised by script code
    #[error("{0}")]
    Script(String),
}

impl CoreError {
    /// I/O failure on a path
    pub fn io(path: impl std::fmt::Display, err: &std::io::Error) -> Self {
        Self::Io {
            path: path.to_string(),
            message: err.to_string(),
        }
    }

    /// Check for an error caused by a missing input file
    #[must_use]
    pub fn is_missing_input(&self) -> bool {
        match self {
            Self::MissingFile(_) => true,
            Self::Options(e) => e.is_not_found(),
            Self::Apply { source, .. } | Self::PostAction { source, .. } => source.is_missing_input(),
            _ => false,
        }
    }
}

/// Result type for session operations
pub type CoreResult<T> = Result<T, CoreError>;

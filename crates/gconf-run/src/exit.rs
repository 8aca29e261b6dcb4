//! Process exit status

use crate::runtime::RuntimeError;
use gconf_core::CoreError;

/// Outcome of a driver run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Everything went fine
    Success,
    /// Invalid configuration or usage
    ConfigurationError,
    /// An input file does not exist
    MissingInput,
    /// The runtime could not be started
    RuntimeFailure,
    /// The job asked to be reported as skipped
    Skipped,
    /// Status returned by the runtime
    Native(i32),
}

impl ExitCode {
    /// Numeric process status
    #[must_use]
    pub fn code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::ConfigurationError => 1,
            Self::MissingInput => 2,
            Self::RuntimeFailure => 3,
            Self::Skipped => 77,
            Self::Native(status) => status,
        }
    }

    /// Exit code for a status reported by the runtime
    #[must_use]
    pub fn from_status(status: i32) -> Self {
        match status {
            0 => Self::Success,
            77 => Self::Skipped,
            other => Self::Native(other),
        }
    }

    /// Exit code for a failed run
    #[must_use]
    pub fn for_error(err: &anyhow::Error) -> Self {
        for cause in err.chain() {
            if let Some(core) = cause.downcast_ref::<CoreError>() {
                if core.is_missing_input() {
                    return Self::MissingInput;
                }
            }
            if let Some(runtime) = cause.downcast_ref::<RuntimeError>() {
                return match runtime {
                    RuntimeError::Skipped(_) => Self::Skipped,
                    _ => Self::RuntimeFailure,
                };
            }
        }
        Self::ConfigurationError
    }

    /// Check for a successful run
    #[inline]
    #[must_use]
    pub fn is_success(self) -> bool {
        self == Self::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ExitCode::from_status(0), ExitCode::Success);
        assert_eq!(ExitCode::from_status(77).code(), 77);
        assert_eq!(ExitCode::from_status(4), ExitCode::Native(4));
    }

    #[test]
    fn test_error_classes() {
        let missing = anyhow::Error::new(CoreError::MissingFile("job.opts".into()))
            .context("loading job.opts");
        assert_eq!(ExitCode::for_error(&missing), ExitCode::MissingInput);

        let runtime: anyhow::Result<()> = Err(RuntimeError::Unavailable).context("starting");
        assert_eq!(ExitCode::for_error(&runtime.unwrap_err()), ExitCode::RuntimeFailure);

        let skipped = anyhow::Error::new(RuntimeError::Skipped("no input".into()));
        assert_eq!(ExitCode::for_error(&skipped).code(), 77);

        let other = anyhow::Error::new(CoreError::UnknownScript("x".into()));
        assert_eq!(ExitCode::for_error(&other), ExitCode::ConfigurationError);
    }
}

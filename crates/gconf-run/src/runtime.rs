//! Handoff to the runtime
//!
//! The runtime receives the flat `Comp.Prop -> value text` map of the frozen
//! configuration. No native runtime is linked into this workspace, so the
//! shipped [`StandaloneRuntime`] can only relaunch the driver.

use indexmap::IndexMap;
use std::path::Path;
use std::process::Command;

use crate::env::TEMP_OPTS_VAR;

/// Runtime start-up failures
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// This build has no runtime to start
    #[error("no native runtime is available in this build")]
    Unavailable,

    /// The runtime failed to start
    #[error("runtime failure: {0}")]
    Failed(String),

    /// The job reports itself as skipped
    #[error("job skipped: {0}")]
    Skipped(String),

    /// Relaunching the driver failed
    #[error("cannot relaunch {program}: {message}")]
    Relaunch {
        /// Program path
        program: String,
        /// OS error text
        message: String,
    },
}

/// Something that can execute a configured job
#[cfg_attr(test, mockall::automock)]
pub trait Runtime {
    /// Create `application` with `options` and run it; returns its status
    ///
    /// # Errors
    /// Fails when the application cannot be created or started.
    fn run(&mut self, application: &str, options: &IndexMap<String, String>) -> Result<i32, RuntimeError>;

    /// Run the driver again with `args`, reading `temp_opts` as its only source
    ///
    /// # Errors
    /// Fails when the process cannot be started.
    fn relaunch(&mut self, args: &[String], temp_opts: &Path) -> Result<i32, RuntimeError>;
}

/// Runtime of the shipped binary
#[derive(Debug, Clone, Copy, Default)]
pub struct StandaloneRuntime;

impl Runtime for StandaloneRuntime {
    fn run(&mut self, application: &str, options: &IndexMap<String, String>) -> Result<i32, RuntimeError> {
        tracing::debug!("cannot start {} with {} options", application, options.len());
        Err(RuntimeError::Unavailable)
    }

    fn relaunch(&mut self, args: &[String], temp_opts: &Path) -> Result<i32, RuntimeError> {
        let program = std::env::current_exe().map_err(|e| RuntimeError::Relaunch {
            program: "gaudirun".to_string(),
            message: e.to_string(),
        })?;
        tracing::info!("Restarting from {}", temp_opts.display());
        let status = Command::new(&program)
            .args(args)
            .env(TEMP_OPTS_VAR, temp_opts)
            .status()
            .map_err(|e| RuntimeError::Relaunch {
                program: program.display().to_string(),
                message: e.to_string(),
            })?;
        status
            .code()
            .ok_or_else(|| RuntimeError::Failed(format!("{} terminated by a signal", program.display())))
    }
}

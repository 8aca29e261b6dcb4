//! Environment read by the driver

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Transient options file loaded first and always removed
pub const TEMP_OPTS_VAR: &str = "GAUDI_TEMP_OPTS_FILE";
/// Overrides `ApplicationMgr.AppName`
pub const APP_NAME_VAR: &str = "GAUDIAPPNAME";
/// Overrides `ApplicationMgr.AppVersion`
pub const APP_VERSION_VAR: &str = "GAUDIAPPVERSION";
/// Print full error chains with a backtrace
pub const BACKTRACE_VAR: &str = "ENABLE_BACKTRACE";

/// Snapshot of the variables the driver looks at
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    /// `GAUDI_TEMP_OPTS_FILE`
    pub temp_opts: Option<PathBuf>,
    /// `GAUDIAPPNAME`
    pub app_name: Option<String>,
    /// `GAUDIAPPVERSION`
    pub app_version: Option<String>,
    /// `ENABLE_BACKTRACE` is set
    pub backtrace: bool,
}

impl Environment {
    /// Read the process environment
    #[must_use]
    pub fn from_env() -> Self {
        let var = |name: &str| env::var(name).ok().filter(|v: &String| !v.is_empty());
        Self {
            temp_opts: var(TEMP_OPTS_VAR).map(PathBuf::from),
            app_name: var(APP_NAME_VAR),
            app_version: var(APP_VERSION_VAR),
            backtrace: env::var_os(BACKTRACE_VAR).is_some(),
        }
    }
}

/// Removes the transient options file when dropped
#[derive(Debug)]
pub struct TempOptsGuard {
    path: PathBuf,
}

impl TempOptsGuard {
    /// Guard `path`
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Guarded path
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempOptsGuard {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!("removed {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("cannot remove {}: {}", self.path.display(), e),
        }
    }
}

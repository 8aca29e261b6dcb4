//! gconf Run
//!
//! The `gaudirun` driver: reads option sources, applies the configuration
//! and hands the frozen catalog to a runtime or writes it out.
//!
//! # Core Concepts
//!
//! - **RunOptions**: the parsed command line
//! - **Driver**: the configuration pipeline over a [`Session`](gconf_core::Session)
//! - **Runtime**: seam to whatever executes the configured job
//! - **ExitCode**: 0 success, 1 configuration error, 2 missing input,
//!   3 runtime failure, 77 skipped, otherwise the runtime's status
//!
//! # Example
//!
//! ```rust,ignore
//! use gconf_run::{Driver, Environment, RunOptions, StandaloneRuntime};
//!
//! let options = RunOptions::try_parse_from(["gaudirun", "-n", "-o", "job.pkl", "job.opts"])?;
//! let mut session = gconf_core::Session::new()?;
//! let code = Driver::new(options, Environment::from_env(), StandaloneRuntime)
//!     .run(&mut session, &mut std::io::stdout());
//! ```

#![warn(unreachable_pub)]

pub mod cli;
pub mod driver;
pub mod env;
pub mod exit;
pub mod logging;
pub mod runtime;

// Re-exports
pub use cli::{command, RunOptions, DEFAULT_APPLICATION};
pub use driver::{runtime_options, Driver};
pub use env::{Environment, TempOptsGuard, APP_NAME_VAR, APP_VERSION_VAR, BACKTRACE_VAR, TEMP_OPTS_VAR};
pub use exit::ExitCode;
pub use runtime::{Runtime, RuntimeError, StandaloneRuntime};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! gconf Core
//!
//! Configuration sessions: the state one job configuration run builds up
//! before handing a catalog to the runtime.
//!
//! # Core Concepts
//!
//! - **Session**: owns the catalog, registered scripts, user-level types,
//!   the post-config chain and the include bookkeeping
//! - **ConfigurableUser**: user-level type whose apply action derives
//!   low-level configuration; applies are ordered by declared dependencies
//! - **PostConfigChain**: actions run in registration order once scripted
//!   options are read
//! - **ComponentDb**: component types declared in YAML, JSON or TOML
//!
//! # Example
//!
//! ```rust,ignore
//! use gconf_core::{PostConfigAction, Session};
//!
//! let mut session = Session::new()?;
//! session.import_options("job.opts")?;
//! session.append_post_config_action(PostConfigAction::set("MessageSvc", "OutputLevel", 2));
//! session.run_post_config_actions()?;
//! session.apply_configurable_users()?;
//! session.write_dump(Path::new("job.pkl"), false)?;
//! ```

#![warn(unreachable_pub)]

pub mod action;
pub mod builtins;
pub mod component_db;
pub mod error;
pub mod script;
pub mod session;
pub mod user;

// Re-exports
pub use action::{CallbackFn, PostConfigAction, PostConfigChain};
pub use builtins::{builtin_types, APPLICATION_MGR, EVENT_SELECTOR, MESSAGE_SVC};
pub use component_db::{ComponentDb, ComponentEntry, PropertyEntry};
pub use error::{CoreError, CoreResult};
pub use script::{is_function_token, Script, ScriptFn, ScriptRegistry};
pub use session::Session;
pub use user::{ConfigurableUser, Dependency, DependencyName};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for configuration sessions
    pub use crate::{
        ConfigurableUser, CoreError, CoreResult, Dependency, PostConfigAction, Session,
    };
    pub use gconf_property::{ComponentKind, Source, TypeSpec, Value};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

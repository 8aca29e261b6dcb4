//! Scripted configuration
//!
//! Scripts are Rust functions registered by name. A `.py` source resolves to
//! the script registered under its file name or stem; a `module:function`
//! token resolves to the script registered under that exact token.

use crate::error::CoreResult;
use crate::session::Session;
use gconf_property::Value;
use indexmap::IndexMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Script body: receives the session and positional arguments, returns the
/// names of the configurables it produced
pub type ScriptFn = dyn Fn(&mut Session, &[Value]) -> CoreResult<Vec<String>> + Send + Sync;

/// Shared handle to a script body
#[derive(Clone)]
pub struct Script {
    name: String,
    body: Arc<ScriptFn>,
}

impl Script {
    /// Wrap a function
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&mut Session, &[Value]) -> CoreResult<Vec<String>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            body: Arc::new(body),
        }
    }

    /// Registered name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run against a session
    ///
    /// # Errors
    /// Propagates whatever the body returns.
    pub fn call(&self, session: &mut Session, args: &[Value]) -> CoreResult<Vec<String>> {
        (self.body)(session, args)
    }
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Script").field("name", &self.name).finish()
    }
}

/// Scripts by name
#[derive(Debug, Clone, Default)]
pub struct ScriptRegistry {
    scripts: IndexMap<String, Script>,
}

impl ScriptRegistry {
    /// Empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a script, replacing any previous one with the same name
    pub fn register<F>(&mut self, name: impl Into<String>, body: F) -> &mut Self
    where
        F: Fn(&mut Session, &[Value]) -> CoreResult<Vec<String>> + Send + Sync + 'static,
    {
        let script = Script::new(name, body);
        self.scripts.insert(script.name.clone(), script);
        self
    }

    /// Script by exact name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Script> {
        self.scripts.get(name)
    }

    /// Script standing for a scripted options file
    #[must_use]
    pub fn for_file(&self, path: &Path) -> Option<&Script> {
        let file_name = path.file_name().and_then(|n| n.to_str());
        let stem = path.file_stem().and_then(|n| n.to_str());
        file_name
            .and_then(|n| self.get(n))
            .or_else(|| stem.and_then(|n| self.get(n)))
    }

    /// Registered names in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.scripts.keys().map(String::as_str)
    }

    /// Number of scripts
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    /// Check for an empty registry
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }
}

/// Check whether a command-line source is a `module:function` token
///
/// Tokens have no path separator or extension before the colon.
#[must_use]
pub fn is_function_token(source: &str) -> bool {
    let Some((module, function)) = source.split_once(':') else {
        return false;
    };
    let ident = |s: &str| {
        !s.is_empty()
            && s.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
    };
    ident(module) && ident(function) && !function.contains('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_resolution_by_name_then_stem() {
        let mut scripts = ScriptRegistry::new();
        scripts.register("options", |_, _| Ok(vec![]));
        scripts.register("special.py", |_, _| Ok(vec!["x".into()]));
        assert_eq!(scripts.for_file(Path::new("/a/b/options.py")).unwrap().name(), "options");
        assert_eq!(scripts.for_file(Path::new("special.py")).unwrap().name(), "special.py");
        assert!(scripts.for_file(Path::new("missing.py")).is_none());
    }

    #[test]
    fn test_function_tokens() {
        assert!(is_function_token("MyModule:configure"));
        assert!(is_function_token("pkg.module:setup_job"));
        assert!(!is_function_token("job.opts"));
        assert!(!is_function_token("/tmp/x:y/z.opts"));
        assert!(!is_function_token("C:job.opts"));
    }
}

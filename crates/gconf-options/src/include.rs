//! Include-path resolution
//!
//! Only include paths are environment-expanded; property values keep `$NAME`
//! verbatim.

use crate::error::{OptionsError, OptionsResult};
use regex::{Captures, Regex};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Environment variable listing include directories
pub const SEARCH_PATH_VAR: &str = "JOBOPTSEARCHPATH";

fn env_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(r"\$(?:\{([A-Za-z_][A-Za-z0-9_]*)\}|\(([A-Za-z_][A-Za-z0-9_]*)\)|([A-Za-z_][A-Za-z0-9_]*))").ok()
        })
        .as_ref()
}

/// Expand `$NAME`, `${NAME}` and `$(NAME)` from the process environment
///
/// Undefined variables are left as written.
#[must_use]
pub fn expand_env(text: &str) -> String {
    expand_with(text, |name| std::env::var(name).ok())
}

/// Expand variables with a custom lookup
pub fn expand_with(text: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let Some(pattern) = env_pattern() else {
        return text.to_string();
    };
    pattern
        .replace_all(text, |caps: &Captures<'_>| {
            let name = caps
                .get(1)
                .or_else(|| caps.get(2))
                .or_else(|| caps.get(3))
                .map_or("", |m| m.as_str());
            lookup(name).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Ordered include directories
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPath {
    dirs: Vec<PathBuf>,
}

impl SearchPath {
    /// Empty search path
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `:` or `,` separated directory list
    #[must_use]
    pub fn parse(list: &str) -> Self {
        let dirs = list
            .split([':', ','])
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(PathBuf::from)
            .collect();
        Self { dirs }
    }

    /// Read [`SEARCH_PATH_VAR`]
    #[must_use]
    pub fn from_env() -> Self {
        std::env::var(SEARCH_PATH_VAR)
            .map(|list| Self::parse(&list))
            .unwrap_or_default()
    }

    /// Append a directory
    pub fn push(&mut self, dir: impl Into<PathBuf>) {
        self.dirs.push(dir.into());
    }

    /// Directories in lookup order
    #[inline]
    #[must_use]
    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// Find an include target
    ///
    /// Tries the expanded path as given, then relative to `including_dir`,
    /// the current directory and each search directory.
    ///
    /// # Errors
    /// Returns [`OptionsError::IncludeNotFound`] listing what was searched.
    pub fn resolve(&self, path: &str, including_dir: Option<&Path>) -> OptionsResult<PathBuf> {
        let expanded = expand_env(path);
        let candidate = PathBuf::from(&expanded);
        if candidate.is_file() {
            return Ok(candidate);
        }
        let mut tried: Vec<PathBuf> = Vec::new();
        if candidate.is_relative() {
            tried.extend(including_dir.map(Path::to_path_buf));
            if let Ok(cwd) = std::env::current_dir() {
                tried.push(cwd);
            }
            tried.extend(self.dirs.iter().cloned());
            for dir in &tried {
                let full = dir.join(&candidate);
                if full.is_file() {
                    tracing::debug!("resolved include {} to {}", path, full.display());
                    return Ok(full);
                }
            }
        }
        Err(OptionsError::IncludeNotFound {
            path: expanded,
            search_path: tried.iter().map(|d| d.display().to_string()).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_expand_forms() {
        let lookup = |name: &str| (name == "ROOT").then(|| "/opt".to_string());
        assert_eq!(expand_with("$ROOT/a.opts", lookup), "/opt/a.opts");
        assert_eq!(expand_with("${ROOT}/a.opts", lookup), "/opt/a.opts");
        assert_eq!(expand_with("$(ROOT)/a.opts", lookup), "/opt/a.opts");
        assert_eq!(expand_with("$MISSING/a.opts", lookup), "$MISSING/a.opts");
    }

    #[test]
    fn test_parse_separators() {
        let path = SearchPath::parse("/a:/b,/c::");
        assert_eq!(
            path.dirs(),
            &[PathBuf::from("/a"), PathBuf::from("/b"), PathBuf::from("/c")]
        );
    }

    #[test]
    fn test_resolve_order() {
        let including = tempfile::tempdir().unwrap();
        let search = tempfile::tempdir().unwrap();
        fs::write(search.path().join("common.opts"), "").unwrap();
        let mut path = SearchPath::new();
        path.push(search.path());

        let found = path.resolve("common.opts", Some(including.path())).unwrap();
        assert_eq!(found, search.path().join("common.opts"));

        fs::write(including.path().join("common.opts"), "").unwrap();
        let found = path.resolve("common.opts", Some(including.path())).unwrap();
        assert_eq!(found, including.path().join("common.opts"));
    }

    #[test]
    fn test_resolve_not_found_lists_search_path() {
        let search = tempfile::tempdir().unwrap();
        let mut path = SearchPath::new();
        path.push(search.path());
        let err = path.resolve("nowhere-to-be-found.opts", None).unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains(&search.path().display().to_string()));
    }
}

//! Error types for options parsing and dumps

use gconf_catalog::CatalogError;
use std::fmt;

/// Position in an options source
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    /// File name, or a label such as `<command line>`
    pub file: String,
    /// 1-based line
    pub line: usize,
    /// 1-based column
    pub column: usize,
}

impl Location {
    /// Create a location
    pub fn new(file: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }

    /// Location of a byte offset in `text`; columns count bytes
    #[must_use]
    pub fn of_offset(file: &str, text: &str, offset: usize) -> Self {
        let offset = offset.min(text.len());
        let before = &text[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        Self::new(file, line, offset - line_start + 1)
    }
}

/// Byte offset to line/column conversion for one source text
#[derive(Debug, Clone)]
pub struct LineIndex {
    file: String,
    line_starts: Vec<usize>,
}

impl LineIndex {
    /// Index the line starts of `text`
    #[must_use]
    pub fn new(file: &str, text: &str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            file: file.to_string(),
            line_starts,
        }
    }

    /// File label
    #[inline]
    #[must_use]
    pub fn file(&self) -> &str {
        &self.file
    }

    /// Location of a byte offset
    #[must_use]
    pub fn location(&self, offset: usize) -> Location {
        let line = self.line_starts.partition_point(|&start| start <= offset);
        let start = self.line_starts[line.saturating_sub(1)];
        Location::new(self.file.clone(), line.max(1), offset - start + 1)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({},{})", self.file, self.line, self.column)
    }
}

/// Errors while reading options sources
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OptionsError {
    /// Malformed options text
    #[error("{location}: {message}")]
    Syntax {
        /// Where the offending token starts
        location: Location,
        /// What was wrong
        message: String,
    },

    /// Numeric value multiplied by an undefined unit
    #[error("{location}: unknown unit '{unit}'")]
    UnknownUnit {
        /// Where the unit appears
        location: Location,
        /// Unit name
        unit: String,
    },

    /// Assignment rejected by the catalog
    #[error("{location}: {source}")]
    Catalog {
        /// Statement location
        location: Location,
        /// Underlying failure
        source: CatalogError,
    },

    /// Include target not found anywhere on the search path
    #[error("cannot find file '{path}' (search path: [{}])", .search_path.join(", "))]
    IncludeNotFound {
        /// Path as written, after environment expansion
        path: String,
        /// Directories that were tried
        search_path: Vec<String>,
    },

    /// Reading a file failed
    #[error("cannot read '{path}': {message}")]
    Io {
        /// File path
        path: String,
        /// OS error text
        message: String,
    },

    /// Include of a file type the host cannot import
    #[error("cannot import '{0}': unsupported file type")]
    Unsupported(String),

    /// Import handled by the host failed
    #[error("{0}")]
    Host(String),
}

impl OptionsError {
    /// Syntax error at a location
    pub fn syntax(location: Location, message: impl Into<String>) -> Self {
        Self::Syntax {
            location,
            message: message.into(),
        }
    }

    /// I/O failure on a path
    pub fn io(path: impl fmt::Display, err: &std::io::Error) -> Self {
        Self::Io {
            path: path.to_string(),
            message: err.to_string(),
        }
    }

    /// Check for a missing include or source file
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::IncludeNotFound { .. })
    }
}

/// Result type for options operations
pub type OptionsResult<T> = Result<T, OptionsError>;

/// Errors while writing or restoring configuration dumps
#[derive(Debug, thiserror::Error)]
pub enum DumpError {
    /// No format is registered for the file extension
    #[error("unknown output format for '{0}'")]
    UnknownFormat(String),

    /// Reading or writing a dump failed
    #[error("cannot access '{path}': {message}")]
    Io {
        /// File path
        path: String,
        /// OS error text
        message: String,
    },

    /// JSON encoding or decoding failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML encoding or decoding failed
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Binary snapshot encoding or decoding failed
    #[error("snapshot error: {0}")]
    Snapshot(#[from] postcard::Error),

    /// Snapshot written by an incompatible version
    #[error("snapshot version {found} is not supported (expected {expected})")]
    Version {
        /// Version in the file
        found: u32,
        /// Version this build writes
        expected: u32,
    },

    /// Flat dump key without a `Component.Property` shape
    #[error("malformed option key '{0}'")]
    BadKey(String),

    /// Value text of a flat dump entry does not parse
    #[error("option '{key}': {source}")]
    Value {
        /// `Component.Property` key
        key: String,
        /// Parse failure
        source: OptionsError,
    },

    /// Restoring into the catalog failed
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl DumpError {
    /// I/O failure on a path
    pub fn io(path: impl fmt::Display, err: &std::io::Error) -> Self {
        Self::Io {
            path: path.to_string(),
            message: err.to_string(),
        }
    }
}

/// Result type for dump operations
pub type DumpResult<T> = Result<T, DumpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_of_offset() {
        let text = "a = 1;\nbb = 2;\n";
        assert_eq!(Location::of_offset("f.opts", text, 0).to_string(), "f.opts(1,1)");
        assert_eq!(Location::of_offset("f.opts", text, 9).to_string(), "f.opts(2,3)");
    }

    #[test]
    fn test_line_index_agrees_with_scan() {
        let text = "a = 1;\nbb = 2;\n\nc = 3;";
        let index = LineIndex::new("f.opts", text);
        for offset in 0..text.len() {
            assert_eq!(index.location(offset), Location::of_offset("f.opts", text, offset));
        }
    }

    #[test]
    fn test_include_not_found_message() {
        let err = OptionsError::IncludeNotFound {
            path: "x.opts".into(),
            search_path: vec!["/a".into(), "/b".into()],
        };
        assert_eq!(
            err.to_string(),
            "cannot find file 'x.opts' (search path: [/a, /b])"
        );
        assert!(err.is_not_found());
    }
}

//! Non-fatal diagnostics collected during configuration

use std::fmt;

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Informational
    Info,
    /// Warning; configuration continues
    Warning,
    /// Error reported without aborting
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        })
    }
}

/// One recorded diagnostic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Severity
    pub severity: Severity,
    /// Message text
    pub message: String,
}

impl Diagnostic {
    /// Create a warning
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    /// Create an informational note
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)
    }
}

/// Ordered diagnostic sink that mirrors every entry to `tracing`
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Record and log a warning
    pub fn warn(&mut self, message: impl Into<String>) {
        let d = Diagnostic::warning(message);
        tracing::warn!("{}", d.message);
        self.entries.push(d);
    }

    /// Record and log an informational note
    pub fn info(&mut self, message: impl Into<String>) {
        let d = Diagnostic::info(message);
        tracing::info!("{}", d.message);
        self.entries.push(d);
    }

    /// Entries in recording order
    #[inline]
    #[must_use]
    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// Warning messages only
    pub fn warnings(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .map(|d| d.message.as_str())
    }

    /// Drop all entries
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

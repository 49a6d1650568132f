//! Per-phase execution results and analyzer diagnostics.

use super::DocumentBatch;
use crate::config::LogLevel;
use crate::graph::PhaseKind;
use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// The result of one successful phase execution.
///
/// Populated exactly once per successful phase; absent when the phase was
/// skipped or failed.
#[derive(Debug, Clone)]
pub struct PhaseResult {
    /// Which phase produced this result.
    pub kind: PhaseKind,
    /// The phase's output batch.
    pub outputs: DocumentBatch,
    /// When the phase started.
    pub start: DateTime<Utc>,
    /// How long the phase ran, in milliseconds.
    pub elapsed_ms: f64,
}

impl PhaseResult {
    /// When the phase finished.
    #[must_use]
    pub fn end(&self) -> DateTime<Utc> {
        self.start + chrono::Duration::microseconds((self.elapsed_ms * 1000.0) as i64)
    }
}

/// A diagnostic record produced by an analyzer, keyed to a phase.
///
/// Collected even when the phase itself fails.
#[derive(Debug, Clone)]
pub struct AnalyzerResult {
    /// The analyzer that produced this record.
    pub analyzer: String,
    /// The severity it was reported at.
    pub level: LogLevel,
    /// The diagnostic message.
    pub message: String,
    /// The offending document's destination, when applicable.
    pub document: Option<PathBuf>,
}

impl AnalyzerResult {
    /// Creates a diagnostic record.
    #[must_use]
    pub fn new(analyzer: impl Into<String>, level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            analyzer: analyzer.into(),
            level,
            message: message.into(),
            document: None,
        }
    }

    /// Attaches the offending document's destination path.
    #[must_use]
    pub fn with_document(mut self, path: impl Into<PathBuf>) -> Self {
        self.document = Some(path.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_result_end_accounts_for_elapsed() {
        let start = Utc::now();
        let result = PhaseResult {
            kind: PhaseKind::Process,
            outputs: DocumentBatch::empty(),
            start,
            elapsed_ms: 250.0,
        };
        let delta = result.end() - start;
        assert_eq!(delta.num_milliseconds(), 250);
    }

    #[test]
    fn analyzer_result_builder() {
        let result = AnalyzerResult::new("LinkChecker", LogLevel::Warning, "dangling link")
            .with_document("posts/a.html");
        assert_eq!(result.analyzer, "LinkChecker");
        assert_eq!(result.level, LogLevel::Warning);
        assert!(result.document.is_some());
    }
}

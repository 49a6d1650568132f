//! Analyzers: optional per-phase diagnostics.
//!
//! Analyzers are registered on the engine and activated through the
//! `Analyzers` setting. Each entry is `"name"`, `"name=level"`, or
//! `"All=level"`; a bare name (or `=true`) keeps the analyzer's default
//! level. Results are logged at their level, which means they feed the
//! failure threshold like any other log record.

use crate::config::LogLevel;
use crate::core::{AnalyzerResult, DocumentBatch};
use crate::errors::EngineError;
use crate::graph::PhaseKind;
use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;
use tracing::warn;

/// Everything an analyzer sees about the phase it inspects.
#[derive(Debug)]
pub struct AnalyzerContext<'a> {
    /// The owning pipeline's display name.
    pub pipeline: &'a str,
    /// The phase being analyzed.
    pub phase: PhaseKind,
    /// The documents to inspect: the phase's outputs, or its inputs when
    /// the phase failed.
    pub documents: &'a DocumentBatch,
}

/// A diagnostic inspector run after each phase.
#[async_trait]
pub trait Analyzer: Send + Sync + Debug {
    /// The registered name, matched case-insensitively by the
    /// `Analyzers` setting.
    fn name(&self) -> &str;

    /// The level results are reported at unless overridden.
    fn default_level(&self) -> LogLevel {
        LogLevel::Warning
    }

    /// Inspects a phase's documents.
    async fn analyze(&self, ctx: &AnalyzerContext<'_>) -> Result<Vec<AnalyzerResult>, EngineError>;
}

/// An analyzer activated for one execution, with its effective level.
#[derive(Debug, Clone)]
pub(crate) struct ActivatedAnalyzer {
    pub analyzer: Arc<dyn Analyzer>,
    pub level: LogLevel,
}

/// Resolves the `Analyzers` setting entries against the registered
/// analyzers. Unknown names are logged and skipped; later entries for the
/// same analyzer win.
pub(crate) fn activate_analyzers(
    registered: &[Arc<dyn Analyzer>],
    entries: &[String],
) -> Result<Vec<ActivatedAnalyzer>, EngineError> {
    let mut active: Vec<ActivatedAnalyzer> = Vec::new();

    for entry in entries {
        let (name, level) = parse_entry(entry)?;

        if name.eq_ignore_ascii_case("All") {
            for analyzer in registered {
                upsert(&mut active, analyzer.clone(), level);
            }
            continue;
        }

        match registered
            .iter()
            .find(|a| a.name().eq_ignore_ascii_case(name))
        {
            Some(analyzer) => upsert(&mut active, analyzer.clone(), level),
            None => warn!(analyzer = name, "ignoring unknown analyzer"),
        }
    }

    Ok(active)
}

fn upsert(active: &mut Vec<ActivatedAnalyzer>, analyzer: Arc<dyn Analyzer>, level: Option<LogLevel>) {
    let level = level.unwrap_or_else(|| analyzer.default_level());
    if let Some(existing) = active
        .iter_mut()
        .find(|a| a.analyzer.name().eq_ignore_ascii_case(analyzer.name()))
    {
        existing.level = level;
    } else {
        active.push(ActivatedAnalyzer { analyzer, level });
    }
}

/// Splits `"name=level"`. An omitted value or `"true"` keeps the default.
fn parse_entry(entry: &str) -> Result<(&str, Option<LogLevel>), EngineError> {
    match entry.split_once('=') {
        None => Ok((entry.trim(), None)),
        Some((name, value)) if value.trim().eq_ignore_ascii_case("true") => {
            Ok((name.trim(), None))
        }
        Some((name, value)) => Ok((name.trim(), Some(value.parse()?))),
    }
}

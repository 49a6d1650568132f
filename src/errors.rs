//! Error types for the siteflow engine.
//!
//! Configuration-time failures (phase graph construction) are kept separate
//! from execution-time failures so that callers can distinguish "your
//! pipeline declarations are wrong" from "a module failed while running".

use crate::config::{LogLevel, LogRecord};
use crate::graph::PhaseKind;
use thiserror::Error;
use uuid::Uuid;

/// The main error type for engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A configuration error detected while building the phase graph.
    #[error("{0}")]
    Graph(#[from] GraphError),

    /// An explicitly requested pipeline does not exist.
    #[error("unknown pipeline '{0}'")]
    UnknownPipeline(String),

    /// A module failed, wrapped with its pipeline/phase/module breadcrumbs.
    #[error("module '{module}' failed in {pipeline}/{phase}: {message}")]
    Module {
        /// The owning pipeline.
        pipeline: String,
        /// The phase that was executing.
        phase: PhaseKind,
        /// The module name.
        module: String,
        /// The underlying failure.
        message: String,
    },

    /// A raw execution failure produced by a module or event handler.
    #[error("execution error: {0}")]
    Execution(String),

    /// A phase was skipped because one of its dependencies did not
    /// complete successfully. Synthetic; used only for the skip cascade.
    #[error("{pipeline}/{phase} was skipped because a dependency did not complete successfully")]
    DependencySkipped {
        /// The skipped pipeline.
        pipeline: String,
        /// The skipped phase.
        phase: PhaseKind,
    },

    /// The execution was cancelled through the cancellation token.
    #[error("execution was cancelled")]
    Cancelled,

    /// Log records at or above the failure threshold were observed.
    #[error("{} log message(s) at or above the {threshold} failure threshold", .records.len())]
    FailuresLogged {
        /// The configured threshold.
        threshold: LogLevel,
        /// The captured records.
        records: Vec<LogRecord>,
    },

    /// Multiple phases failed during a single execution.
    #[error("execution completed with {} phase failure(s)", .errors.len())]
    Aggregate {
        /// The individual failures.
        errors: Vec<EngineError>,
    },

    /// A second `execute` was attempted while one is already in flight.
    #[error("an execution is already in progress (execution {0})")]
    AlreadyExecuting(Uuid),

    /// The engine has been disposed.
    #[error("the engine has been disposed")]
    Disposed,

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Creates a raw execution error, the conventional way for modules to
    /// report a failure.
    #[must_use]
    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution(message.into())
    }

    /// Returns `true` for errors produced by the skip cascade rather than
    /// by a failing module.
    #[must_use]
    pub fn is_skip(&self) -> bool {
        matches!(self, Self::DependencySkipped { .. })
    }

    /// Returns `true` if this error (or every aggregated inner error) is a
    /// cancellation.
    #[must_use]
    pub fn is_cancellation(&self) -> bool {
        match self {
            Self::Cancelled => true,
            Self::Aggregate { errors } => {
                !errors.is_empty() && errors.iter().all(EngineError::is_cancellation)
            }
            _ => false,
        }
    }
}

/// A fatal configuration error detected while compiling pipeline
/// declarations into the phase graph. Reported before any phase runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// A pipeline name was empty or whitespace-only.
    #[error("pipeline name cannot be empty or whitespace-only")]
    InvalidName,

    /// Two pipelines share a name under case-insensitive comparison.
    #[error("a pipeline named '{0}' is already registered")]
    DuplicateName(String),

    /// A declared dependency does not exist.
    #[error("pipeline '{pipeline}' depends on unknown pipeline '{dependency}'")]
    UnknownDependency {
        /// The declaring pipeline.
        pipeline: String,
        /// The missing dependency name.
        dependency: String,
    },

    /// An isolated pipeline declared dependencies.
    #[error("isolated pipeline '{0}' cannot declare dependencies")]
    IsolatedWithDependencies(String),

    /// A pipeline declared a dependency on an isolated pipeline.
    #[error("pipeline '{pipeline}' cannot depend on isolated pipeline '{dependency}'")]
    DependencyOnIsolated {
        /// The declaring pipeline.
        pipeline: String,
        /// The isolated dependency name.
        dependency: String,
    },

    /// A non-deployment pipeline declared a dependency on a deployment
    /// pipeline.
    #[error("non-deployment pipeline '{pipeline}' cannot depend on deployment pipeline '{dependency}'")]
    DependencyOnDeployment {
        /// The declaring pipeline.
        pipeline: String,
        /// The deployment dependency name.
        dependency: String,
    },

    /// A dependency cycle among pipelines.
    #[error("pipeline dependency cycle: {}", .cycle.join(" -> "))]
    Cycle {
        /// The pipelines forming the cycle, first repeated at the end.
        cycle: Vec<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_error_renders_path() {
        let err = GraphError::Cycle {
            cycle: vec!["a".into(), "b".into(), "a".into()],
        };
        assert!(err.to_string().contains("a -> b -> a"));
    }

    #[test]
    fn module_error_carries_breadcrumbs() {
        let err = EngineError::Module {
            pipeline: "Content".into(),
            phase: PhaseKind::Process,
            module: "RenderMarkdown".into(),
            message: "bad input".into(),
        };
        let text = err.to_string();
        assert!(text.contains("Content"));
        assert!(text.contains("Process"));
        assert!(text.contains("RenderMarkdown"));
    }

    #[test]
    fn skip_errors_are_distinguished() {
        let err = EngineError::DependencySkipped {
            pipeline: "Assets".into(),
            phase: PhaseKind::Output,
        };
        assert!(err.is_skip());
        assert!(!EngineError::Cancelled.is_skip());
    }

    #[test]
    fn aggregate_of_cancellations_is_cancellation() {
        let err = EngineError::Aggregate {
            errors: vec![EngineError::Cancelled, EngineError::Cancelled],
        };
        assert!(err.is_cancellation());

        let mixed = EngineError::Aggregate {
            errors: vec![EngineError::Cancelled, EngineError::execution("boom")],
        };
        assert!(!mixed.is_cancellation());
    }
}

//! # Siteflow
//!
//! The pipeline execution engine of a static-content generation system.
//!
//! Authors declare named pipelines, each an ordered list of modules
//! grouped into four fixed phases (Input, Process, PostProcess, Output).
//! The engine compiles the declarations into a phase dependency graph,
//! schedules phases concurrently subject to that graph, streams immutable
//! document batches through each phase's module chain, and aggregates
//! per-phase results.
//!
//! - **Phase graph**: per-pipeline chains plus cross-pipeline edges for
//!   dependencies, same-group PostProcess barriers, and the deployment
//!   gate
//! - **Scheduling**: one task per phase, edge-triggered joins, skip
//!   cascade on failure, optional serial mode
//! - **Events**: ordered async handler lists around engine, deployment,
//!   and module boundaries, with output overrides
//! - **Cancellation**: cooperative, polled at module boundaries
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use siteflow::prelude::*;
//!
//! let mut engine = Engine::new();
//! engine.add_pipeline(
//!     Pipeline::new("content")?
//!         .with_input_module(Arc::new(ReadPages::new()))
//!         .with_process_module(Arc::new(RenderMarkdown::new())),
//! )?;
//!
//! let outputs = engine
//!     .execute(&[], true, Arc::new(CancellationToken::new()))
//!     .await?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod analysis;
pub mod cancellation;
pub mod config;
pub mod context;
pub mod core;
pub mod engine;
pub mod errors;
pub mod events;
pub mod fs;
pub mod graph;
pub mod modules;
pub mod pipeline;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::analysis::{Analyzer, AnalyzerContext};
    pub use crate::cancellation::CancellationToken;
    pub use crate::config::{CleanMode, LogLevel, Settings};
    pub use crate::context::{ExecutionState, ModuleContext};
    pub use crate::core::{
        AnalyzerResult, ContentProvider, Document, DocumentBatch, PhaseResult, StringContent,
    };
    pub use crate::engine::{Engine, ExecutionOutputs, ExecutionSummary};
    pub use crate::errors::{EngineError, GraphError};
    pub use crate::events::EventBus;
    pub use crate::fs::{FileSystem, LocalFileSystem, MemoryFileSystem};
    pub use crate::graph::{PhaseGraph, PhaseKind};
    pub use crate::modules::{ExecuteIf, ForEachDocument, Module, NoOpModule};
    pub use crate::pipeline::{ExecutionPolicy, Pipeline, PipelineCollection};
}

//! Core value types passed between modules.
//!
//! This module provides:
//! - Immutable documents and document batches
//! - Lazy content providers
//! - Per-phase execution results

mod batch;
mod content;
mod document;
mod result;

pub use batch::DocumentBatch;
pub use content::{BytesContent, ContentProvider, FileContent, StringContent};
pub use document::Document;
pub use result::{AnalyzerResult, PhaseResult};

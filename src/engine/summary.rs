//! Post-execution summary rendering.

use crate::context::ExecutionState;
use crate::core::PhaseResult;
use crate::graph::{PhaseGraph, PhaseKind};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::fmt::Write as _;

/// Number of columns in the timeline strip.
const TIMELINE_SLICES: usize = 80;

/// A per-pipeline row of the execution summary.
#[derive(Debug, Clone)]
pub struct SummaryRow {
    /// The pipeline's display name.
    pub pipeline: String,
    /// The pipeline's four result slots; empty slots were skipped or
    /// failed.
    pub results: [Option<PhaseResult>; 4],
}

/// The rendered view of one execution: a result table plus a best-effort
/// timeline strip.
#[derive(Debug, Clone, Default)]
pub struct ExecutionSummary {
    rows: Vec<SummaryRow>,
}

impl ExecutionSummary {
    /// Collects the summary for the selected pipelines, in registration
    /// order.
    #[must_use]
    pub(crate) fn build(
        graph: &PhaseGraph,
        selected: &HashSet<String>,
        state: &ExecutionState,
    ) -> Self {
        let rows = graph
            .pipelines()
            .iter()
            .filter(|(key, _)| selected.contains(*key))
            .map(|(key, ids)| SummaryRow {
                pipeline: graph.phase(ids[0]).pipeline.clone(),
                results: state.pipeline_results(key),
            })
            .collect();
        Self { rows }
    }

    /// The summary rows.
    #[must_use]
    pub fn rows(&self) -> &[SummaryRow] {
        &self.rows
    }

    /// Renders the output-count/elapsed table followed by the timeline.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_table(&mut out);
        out.push('\n');
        self.render_timeline(&mut out);
        out
    }

    fn render_table(&self, out: &mut String) {
        let name_width = self
            .rows
            .iter()
            .map(|r| r.pipeline.len())
            .chain(std::iter::once("pipeline".len()))
            .max()
            .unwrap_or(8);

        let _ = write!(out, "{:name_width$}", "pipeline");
        for kind in PhaseKind::ALL {
            let _ = write!(out, " | {:13}", kind.to_string());
        }
        out.push('\n');

        let _ = write!(out, "{}", "-".repeat(name_width));
        for _ in PhaseKind::ALL {
            let _ = write!(out, "-+-{}", "-".repeat(13));
        }
        out.push('\n');

        for row in &self.rows {
            let _ = write!(out, "{:name_width$}", row.pipeline);
            for slot in &row.results {
                let cell = match slot {
                    Some(result) => {
                        format!("{} ({:.0}ms)", result.outputs.len(), result.elapsed_ms)
                    }
                    None => String::new(),
                };
                let _ = write!(out, " | {cell:13}");
            }
            out.push('\n');
        }
    }

    /// Renders one strip per pipeline across the min-to-max timespan.
    /// Phase starts are marked with their letter (I/P/T/O), continuation
    /// with `-`. Diagnostic output only; column positions are
    /// best-effort when phases squeeze together.
    fn render_timeline(&self, out: &mut String) {
        let results: Vec<&PhaseResult> = self
            .rows
            .iter()
            .flat_map(|r| r.results.iter().flatten())
            .collect();
        let Some(min_start) = results.iter().map(|r| r.start).min() else {
            return;
        };
        let max_end = results
            .iter()
            .map(|r| r.end())
            .max()
            .unwrap_or(min_start);
        let span_us = (max_end - min_start).num_microseconds().unwrap_or(0).max(1);

        let slice_of = |at: DateTime<Utc>| -> usize {
            let offset = (at - min_start).num_microseconds().unwrap_or(0).max(0);
            (((offset as f64 / span_us as f64) * TIMELINE_SLICES as f64) as usize)
                .min(TIMELINE_SLICES - 1)
        };

        let name_width = self
            .rows
            .iter()
            .map(|r| r.pipeline.len())
            .max()
            .unwrap_or(8);

        for row in &self.rows {
            let mut strip = [' '; TIMELINE_SLICES];
            for result in row.results.iter().flatten() {
                let start = slice_of(result.start);
                let end = slice_of(result.end());
                for cell in strip.iter_mut().take(end + 1).skip(start) {
                    if *cell == ' ' {
                        *cell = '-';
                    }
                }
                // Place the letter at the start, sliding right when an
                // earlier phase already owns the column.
                let mut at = start;
                while at < TIMELINE_SLICES && strip[at].is_alphabetic() {
                    at += 1;
                }
                if at < TIMELINE_SLICES {
                    strip[at] = result.kind.letter();
                }
            }
            let strip: String = strip.iter().collect();
            let _ = writeln!(out, "{:name_width$} {strip}", row.pipeline);
        }
    }
}

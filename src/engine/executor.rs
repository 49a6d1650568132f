//! Phase and module-chain execution.

use crate::analysis::{ActivatedAnalyzer, AnalyzerContext};
use crate::config::LogLevel;
use crate::context::{ExecutionState, ModuleContext};
use crate::core::{AnalyzerResult, DocumentBatch, PhaseResult};
use crate::errors::EngineError;
use crate::events::{AfterModuleExecution, BeforeModuleExecution, EventBus};
use crate::graph::{PhaseGraph, PhaseId, PhaseKind};
use crate::modules::Module;
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Runs one phase: gathers inputs from the intra-pipeline predecessor,
/// streams them through the module chain, runs analyzers, and stores the
/// result on success.
pub(crate) async fn execute_phase(
    graph: &PhaseGraph,
    id: PhaseId,
    state: &Arc<ExecutionState>,
    bus: &Arc<EventBus>,
    analyzers: &[ActivatedAnalyzer],
) -> Result<(), EngineError> {
    let phase = graph.phase(id);

    if state.is_cancelled() {
        return Err(EngineError::Cancelled);
    }

    // The Input phase starts from the empty batch; every other phase
    // consumes its predecessor's outputs, which must exist because the
    // predecessor is a dependency and completed successfully.
    let inputs = match phase.kind.predecessor() {
        None => DocumentBatch::empty(),
        Some(prev) => state
            .phase_outputs(&phase.key, prev)
            .unwrap_or_else(DocumentBatch::empty),
    };

    let start = Utc::now();
    let stopwatch = Instant::now();
    debug!(
        pipeline = %phase.pipeline,
        phase = %phase.kind,
        inputs = inputs.len(),
        "phase starting"
    );

    let chain = execute_module_chain(
        state,
        bus,
        &phase.pipeline,
        phase.kind,
        &phase.modules,
        inputs.clone(),
    )
    .await;
    let elapsed_ms = stopwatch.elapsed().as_secs_f64() * 1000.0;

    // Analyzers see the phase's outputs, or its inputs when it failed, so
    // their diagnostics survive a throwing phase.
    let analysis_batch = match &chain {
        Ok(outputs) => outputs.clone(),
        Err(_) => inputs,
    };
    run_analyzers(state, analyzers, &phase.pipeline, &phase.key, phase.kind, &analysis_batch).await;

    match chain {
        Ok(outputs) => {
            debug!(
                pipeline = %phase.pipeline,
                phase = %phase.kind,
                outputs = outputs.len(),
                elapsed_ms,
                "phase completed"
            );
            state.store_phase_result(
                &phase.key,
                PhaseResult {
                    kind: phase.kind,
                    outputs,
                    start,
                    elapsed_ms,
                },
            );
            Ok(())
        }
        Err(err) => {
            state.log(
                LogLevel::Error,
                format!("{}/{} failed: {err}", phase.pipeline, phase.kind),
            );
            Err(err)
        }
    }
}

/// Streams a batch through a module list.
///
/// Re-entrant: container modules call back into this through
/// [`ModuleContext::execute_modules`]. The cancellation token is polled
/// before each module; the Before/After module events interleave around
/// each execution and may override outputs.
pub(crate) async fn execute_module_chain(
    state: &Arc<ExecutionState>,
    bus: &Arc<EventBus>,
    pipeline: &str,
    phase: PhaseKind,
    modules: &[Arc<dyn Module>],
    mut batch: DocumentBatch,
) -> Result<DocumentBatch, EngineError> {
    for module in modules {
        if state.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        let module_name = module.name().to_string();

        let mut before = BeforeModuleExecution {
            pipeline: pipeline.to_string(),
            phase,
            module: module_name.clone(),
            inputs: batch.clone(),
            overridden_outputs: None,
        };
        bus.before_module_execution()
            .raise(&mut before)
            .await
            .map_err(|e| wrap_module_error(pipeline, phase, &module_name, e))?;

        let stopwatch = Instant::now();
        let outputs = match before.overridden_outputs {
            Some(overridden) => {
                debug!(
                    pipeline,
                    phase = %phase,
                    module = %module_name,
                    "module execution overridden by event handler"
                );
                overridden
            }
            None => {
                let ctx = ModuleContext::new(
                    state.clone(),
                    bus.clone(),
                    pipeline.to_string(),
                    phase,
                    batch.clone(),
                );
                module
                    .execute(&ctx)
                    .await
                    .map_err(|e| wrap_module_error(pipeline, phase, &module_name, e))?
            }
        };
        let elapsed_ms = stopwatch.elapsed().as_secs_f64() * 1000.0;

        let mut after = AfterModuleExecution {
            pipeline: pipeline.to_string(),
            phase,
            module: module_name.clone(),
            outputs: outputs.clone(),
            elapsed_ms,
            overridden_outputs: None,
        };
        bus.after_module_execution()
            .raise(&mut after)
            .await
            .map_err(|e| wrap_module_error(pipeline, phase, &module_name, e))?;

        batch = after.overridden_outputs.unwrap_or(outputs);
        debug!(
            pipeline,
            phase = %phase,
            module = %module_name,
            outputs = batch.len(),
            elapsed_ms,
            "module completed"
        );
    }
    Ok(batch)
}

/// Wraps a failure with module breadcrumbs. Cancellations and already
/// wrapped failures pass through so nested chains keep the innermost
/// module's context.
fn wrap_module_error(
    pipeline: &str,
    phase: PhaseKind,
    module: &str,
    err: EngineError,
) -> EngineError {
    match err {
        EngineError::Cancelled => EngineError::Cancelled,
        wrapped @ EngineError::Module { .. } => wrapped,
        other => EngineError::Module {
            pipeline: pipeline.to_string(),
            phase,
            module: module.to_string(),
            message: other.to_string(),
        },
    }
}

async fn run_analyzers(
    state: &Arc<ExecutionState>,
    analyzers: &[ActivatedAnalyzer],
    pipeline: &str,
    key: &str,
    phase: PhaseKind,
    documents: &DocumentBatch,
) {
    for activated in analyzers {
        let ctx = AnalyzerContext {
            pipeline,
            phase,
            documents,
        };
        match activated.analyzer.analyze(&ctx).await {
            Ok(results) => {
                let results: Vec<AnalyzerResult> = results
                    .into_iter()
                    .map(|r| AnalyzerResult {
                        level: activated.level,
                        ..r
                    })
                    .collect();
                for result in &results {
                    let location = result
                        .document
                        .as_ref()
                        .map(|p| format!(" ({})", p.display()))
                        .unwrap_or_default();
                    state.log(
                        result.level,
                        format!("[{}] {}{location}", result.analyzer, result.message),
                    );
                }
                state.add_analyzer_results(key, phase, results);
            }
            Err(err) => {
                state.log(
                    LogLevel::Error,
                    format!(
                        "analyzer '{}' failed in {pipeline}/{phase}: {err}",
                        activated.analyzer.name()
                    ),
                );
            }
        }
    }
}

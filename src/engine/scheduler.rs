//! Concurrent phase scheduling.
//!
//! Each selected phase becomes one task gated on a `watch` channel per
//! dependency. Completion is edge-triggered: a phase broadcasts its status
//! once, dependents wake when every dependency has left the `Pending`
//! state, and any non-success dependency turns the dependent into a skip
//! that cascades the same way. One pipeline's failure never aborts
//! unrelated branches.

use super::executor;
use crate::analysis::ActivatedAnalyzer;
use crate::config::LogLevel;
use crate::context::ExecutionState;
use crate::errors::EngineError;
use crate::events::{BeforeDeployment, EventBus};
use crate::graph::{PhaseGraph, PhaseId, PhaseKind};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// The tri-state broadcast by every phase task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PhaseStatus {
    Pending,
    Succeeded,
    Failed,
}

/// A phase task's wiring, assembled before anything is spawned so that
/// every subscription exists while all senders are still alive.
struct PreparedPhase {
    id: PhaseId,
    tx: watch::Sender<PhaseStatus>,
    dep_rxs: Vec<watch::Receiver<PhaseStatus>>,
    order_rxs: Vec<watch::Receiver<PhaseStatus>>,
    gate_rx: Option<watch::Receiver<PhaseStatus>>,
}

/// Runs every selected phase of the graph and returns the collected
/// failures. Skips are logged but not returned; only root causes are.
pub(crate) async fn execute_graph(
    graph: Arc<PhaseGraph>,
    selected: HashSet<String>,
    state: Arc<ExecutionState>,
    bus: Arc<EventBus>,
    analyzers: Arc<Vec<ActivatedAnalyzer>>,
    serial: bool,
) -> Vec<EngineError> {
    // Partition the topological order into the non-deployment group, which
    // runs first, and the deployment group, which the gate holds back.
    // Validation guarantees no edge points from the deployment group into
    // the non-deployment group, so the partition is still a valid
    // topological order.
    let non_deployment: Vec<PhaseId> = graph
        .order()
        .iter()
        .copied()
        .filter(|&id| selected.contains(&graph.phase(id).key) && !graph.phase(id).deployment)
        .collect();
    let deployment: Vec<PhaseId> = graph
        .order()
        .iter()
        .copied()
        .filter(|&id| selected.contains(&graph.phase(id).key) && graph.phase(id).deployment)
        .collect();
    let split = non_deployment.len();
    let ordered: Vec<PhaseId> = non_deployment.iter().chain(deployment.iter()).copied().collect();

    let mut senders: Vec<Option<watch::Sender<PhaseStatus>>> =
        (0..graph.phases().len()).map(|_| None).collect();
    for &id in &ordered {
        let (tx, _) = watch::channel(PhaseStatus::Pending);
        senders[id] = Some(tx);
    }
    let (gate_tx, _gate_rx) = watch::channel(PhaseStatus::Pending);

    // Subscribe everything up front, then drain the senders into their
    // tasks.
    let gate_waits: Vec<watch::Receiver<PhaseStatus>> = non_deployment
        .iter()
        .filter_map(|&id| senders[id].as_ref().map(watch::Sender::subscribe))
        .collect();

    type Wiring = (
        Vec<watch::Receiver<PhaseStatus>>,
        Vec<watch::Receiver<PhaseStatus>>,
        Option<watch::Receiver<PhaseStatus>>,
    );
    let mut wiring: Vec<Wiring> = Vec::with_capacity(ordered.len());
    for &id in &ordered {
        let phase = graph.phase(id);
        let dep_rxs = phase
            .dependencies
            .iter()
            .filter_map(|&dep| senders[dep].as_ref().map(watch::Sender::subscribe))
            .collect();
        let order_rxs = phase
            .ordering
            .iter()
            .filter_map(|&dep| senders[dep].as_ref().map(watch::Sender::subscribe))
            .collect();
        let gate_rx = (phase.deployment && phase.kind == PhaseKind::Input)
            .then(|| gate_tx.subscribe());
        wiring.push((dep_rxs, order_rxs, gate_rx));
    }

    let mut prepared: Vec<PreparedPhase> = Vec::with_capacity(ordered.len());
    for (&id, (dep_rxs, order_rxs, gate_rx)) in ordered.iter().zip(wiring) {
        if let Some(tx) = senders[id].take() {
            prepared.push(PreparedPhase {
                id,
                tx,
                dep_rxs,
                order_rxs,
                gate_rx,
            });
        }
    }

    let errors = Arc::new(Mutex::new(Vec::new()));
    let gate = gate_task(gate_waits, gate_tx, state.clone(), bus.clone(), errors.clone());

    if serial {
        // Await each phase before the next is scheduled; the dependency
        // graph still holds because the iteration order is topological.
        // The gate runs between the two groups so deployment Inputs never
        // wait on a gate that has not been driven yet.
        let mut gate = Some(gate);
        for (index, phase) in prepared.into_iter().enumerate() {
            if index == split {
                if let Some(gate) = gate.take() {
                    gate.await;
                }
            }
            run_phase(
                phase,
                graph.clone(),
                state.clone(),
                bus.clone(),
                analyzers.clone(),
                errors.clone(),
            )
            .await;
        }
        if let Some(gate) = gate.take() {
            gate.await;
        }
    } else {
        // Tasks are created eagerly in dependency-sorted order; each one
        // parks on its dependencies' channels until they resolve.
        let mut handles = Vec::with_capacity(prepared.len() + 1);
        for phase in prepared {
            handles.push(tokio::spawn(run_phase(
                phase,
                graph.clone(),
                state.clone(),
                bus.clone(),
                analyzers.clone(),
                errors.clone(),
            )));
        }
        handles.push(tokio::spawn(gate));
        for handle in handles {
            let _ = handle.await;
        }
    }

    let taken = std::mem::take(&mut *errors.lock());
    taken
}

/// One phase task: wait for dependencies, self-skip on any non-success,
/// execute, broadcast.
async fn run_phase(
    phase: PreparedPhase,
    graph: Arc<PhaseGraph>,
    state: Arc<ExecutionState>,
    bus: Arc<EventBus>,
    analyzers: Arc<Vec<ActivatedAnalyzer>>,
    errors: Arc<Mutex<Vec<EngineError>>>,
) {
    let PreparedPhase {
        id,
        tx,
        dep_rxs,
        order_rxs,
        gate_rx,
    } = phase;

    for mut rx in dep_rxs {
        if !wait_for_success(&mut rx).await {
            skip(&graph, id, &tx);
            return;
        }
    }
    // Ordering barriers (the same-group PostProcess cross-links) only
    // wait for completion; a failure behind them does not cascade here.
    for mut rx in order_rxs {
        let _ = rx.wait_for(|status| *status != PhaseStatus::Pending).await;
    }
    if let Some(mut rx) = gate_rx {
        if !wait_for_success(&mut rx).await {
            skip(&graph, id, &tx);
            return;
        }
    }

    match executor::execute_phase(&graph, id, &state, &bus, &analyzers).await {
        Ok(()) => {
            let _ = tx.send(PhaseStatus::Succeeded);
        }
        Err(err) => {
            errors.lock().push(err);
            let _ = tx.send(PhaseStatus::Failed);
        }
    }
}

/// Waits for a dependency to resolve. A dropped sender counts as failure;
/// it means the dependency task died without reporting.
async fn wait_for_success(rx: &mut watch::Receiver<PhaseStatus>) -> bool {
    match rx.wait_for(|status| *status != PhaseStatus::Pending).await {
        Ok(status) => *status == PhaseStatus::Succeeded,
        Err(_) => false,
    }
}

fn skip(graph: &PhaseGraph, id: PhaseId, tx: &watch::Sender<PhaseStatus>) {
    let phase = graph.phase(id);
    let err = EngineError::DependencySkipped {
        pipeline: phase.pipeline.clone(),
        phase: phase.kind,
    };
    debug!(pipeline = %phase.pipeline, phase = %phase.kind, "{err}");
    let _ = tx.send(PhaseStatus::Failed);
}

/// The synthetic gate task: waits for every non-deployment phase task to
/// complete (whatever its status), raises `BeforeDeployment`, and releases
/// the deployment Inputs. Runs even when there are no deployment
/// pipelines.
async fn gate_task(
    gate_waits: Vec<watch::Receiver<PhaseStatus>>,
    gate_tx: watch::Sender<PhaseStatus>,
    state: Arc<ExecutionState>,
    bus: Arc<EventBus>,
    errors: Arc<Mutex<Vec<EngineError>>>,
) {
    for mut rx in gate_waits {
        let _ = rx.wait_for(|status| *status != PhaseStatus::Pending).await;
    }

    let mut args = BeforeDeployment {
        execution_id: state.execution_id(),
    };
    match bus.before_deployment().raise(&mut args).await {
        Ok(_) => {
            let _ = gate_tx.send(PhaseStatus::Succeeded);
        }
        Err(err) => {
            state.log(
                LogLevel::Error,
                format!("BeforeDeployment handler failed: {err}"),
            );
            errors.lock().push(err);
            let _ = gate_tx.send(PhaseStatus::Failed);
        }
    }
}

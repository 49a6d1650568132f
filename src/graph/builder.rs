//! Compiles pipeline declarations into the phase graph.
//!
//! The build runs in two passes plus a final sort:
//!
//! 1. A per-pipeline DFS creates each pipeline's four phases, recursing
//!    into dependencies first and validating them as it goes. Isolated
//!    pipelines become a linear chain immediately.
//! 2. Cross-link passes append the Process phases of same-group pipelines
//!    to every PostProcess, and gate every deployment Input behind all
//!    non-deployment Outputs.
//! 3. A DFS topological sort emits every phase after its dependencies.
//!    Iteration follows pipeline registration order and phase-kind order,
//!    so the result is deterministic.

use super::{Phase, PhaseGraph, PhaseId, PhaseKind};
use crate::errors::GraphError;
use crate::pipeline::{Pipeline, PipelineCollection};
use indexmap::IndexMap;

/// Builds the phase graph for a pipeline collection.
///
/// # Errors
///
/// Returns a configuration error for unknown dependencies, isolated
/// pipelines with dependencies, dependencies on isolated pipelines,
/// non-deployment dependencies on deployment pipelines, or cycles.
pub fn build_phase_graph(collection: &PipelineCollection) -> Result<PhaseGraph, GraphError> {
    let mut builder = GraphBuilder {
        collection,
        phases: Vec::new(),
        registered: IndexMap::new(),
        visiting: Vec::new(),
    };

    for (key, _) in collection.iter() {
        builder.visit(key)?;
    }

    // Re-key the pipeline map into registration order; the DFS registers
    // dependencies first, which is not the order callers expect to see.
    let mut pipelines = IndexMap::new();
    for (key, _) in collection.iter() {
        pipelines.insert(key.to_string(), builder.registered[key]);
    }

    builder.cross_link_post_process(&pipelines);
    builder.gate_deployment_inputs(&pipelines);

    let order = topological_sort(&builder.phases, &pipelines);
    Ok(PhaseGraph::new(builder.phases, order, pipelines))
}

struct GraphBuilder<'a> {
    collection: &'a PipelineCollection,
    phases: Vec<Phase>,
    registered: IndexMap<String, [PhaseId; 4]>,
    visiting: Vec<String>,
}

impl GraphBuilder<'_> {
    fn visit(&mut self, key: &str) -> Result<(), GraphError> {
        if self.registered.contains_key(key) {
            return Ok(());
        }

        let collection = self.collection;
        let pipeline = collection
            .get(key)
            .unwrap_or_else(|| unreachable!("visit is only called with validated keys"));

        if pipeline.is_isolated() {
            if !pipeline.dependencies().is_empty() {
                return Err(GraphError::IsolatedWithDependencies(
                    pipeline.name().to_string(),
                ));
            }
            self.register(key, pipeline);
            return Ok(());
        }

        if let Some(pos) = self.visiting.iter().position(|k| k.as_str() == key) {
            let mut cycle: Vec<String> = self.visiting[pos..]
                .iter()
                .map(|k| self.display_name(k))
                .collect();
            cycle.push(self.display_name(key));
            return Err(GraphError::Cycle { cycle });
        }

        self.visiting.push(key.to_string());
        for dependency in pipeline.dependencies() {
            let dep_key = PipelineCollection::key_for(dependency);
            let dep = collection
                .get(dependency)
                .ok_or_else(|| GraphError::UnknownDependency {
                    pipeline: pipeline.name().to_string(),
                    dependency: dependency.clone(),
                })?;
            if dep.is_isolated() {
                return Err(GraphError::DependencyOnIsolated {
                    pipeline: pipeline.name().to_string(),
                    dependency: dep.name().to_string(),
                });
            }
            if dep.is_deployment() && !pipeline.is_deployment() {
                return Err(GraphError::DependencyOnDeployment {
                    pipeline: pipeline.name().to_string(),
                    dependency: dep.name().to_string(),
                });
            }
            self.visit(&dep_key)?;
        }
        self.visiting.pop();

        self.register(key, pipeline);
        Ok(())
    }

    /// Creates the pipeline's four phases. The intra-pipeline chain is
    /// always Input -> Process -> PostProcess -> Output; non-isolated
    /// pipelines also hang their Process on every dependency's Process.
    fn register(&mut self, key: &str, pipeline: &Pipeline) {
        let base = self.phases.len();
        let ids = [base, base + 1, base + 2, base + 3];

        let mut process_deps = vec![ids[0]];
        if !pipeline.is_isolated() {
            for dependency in pipeline.dependencies() {
                let dep_key = PipelineCollection::key_for(dependency);
                process_deps.push(self.registered[&dep_key][PhaseKind::Process.index()]);
            }
        }

        for kind in PhaseKind::ALL {
            let dependencies = match kind {
                PhaseKind::Input => Vec::new(),
                PhaseKind::Process => process_deps.clone(),
                PhaseKind::PostProcess => vec![ids[PhaseKind::Process.index()]],
                PhaseKind::Output => vec![ids[PhaseKind::PostProcess.index()]],
            };
            self.phases.push(Phase {
                pipeline: pipeline.name().to_string(),
                key: key.to_string(),
                kind,
                modules: pipeline.modules(kind).to_vec().into(),
                dependencies,
                ordering: Vec::new(),
                deployment: pipeline.is_deployment(),
                isolated: pipeline.is_isolated(),
            });
        }

        self.registered.insert(key.to_string(), ids);
    }

    /// Appends to every non-isolated PostProcess the Process phase of
    /// every other non-isolated pipeline with the same deployment flag.
    /// These are ordering-only edges: the PostProcess waits for the other
    /// Process phases to finish but is not skipped when one of them
    /// fails, so an unrelated pipeline's failure cannot cascade through
    /// the barrier.
    fn cross_link_post_process(&mut self, pipelines: &IndexMap<String, [PhaseId; 4]>) {
        let flags: Vec<(String, [PhaseId; 4], bool, bool)> = pipelines
            .iter()
            .map(|(key, ids)| {
                let phase = &self.phases[ids[0]];
                (key.clone(), *ids, phase.isolated, phase.deployment)
            })
            .collect();

        for (key, ids, isolated, deployment) in &flags {
            if *isolated {
                continue;
            }
            let post = ids[PhaseKind::PostProcess.index()];
            for (other_key, other_ids, other_isolated, other_deployment) in &flags {
                if other_key == key || *other_isolated || other_deployment != deployment {
                    continue;
                }
                self.phases[post]
                    .ordering
                    .push(other_ids[PhaseKind::Process.index()]);
            }
        }
    }

    /// Appends to every non-isolated deployment Input the Output phase of
    /// every non-deployment pipeline. Isolated deployment pipelines keep
    /// their chain edge-free; the scheduler's deployment gate still holds
    /// them back at run time.
    fn gate_deployment_inputs(&mut self, pipelines: &IndexMap<String, [PhaseId; 4]>) {
        let flags: Vec<([PhaseId; 4], bool, bool)> = pipelines
            .values()
            .map(|ids| {
                let phase = &self.phases[ids[0]];
                (*ids, phase.isolated, phase.deployment)
            })
            .collect();

        for (ids, isolated, deployment) in &flags {
            if !deployment || *isolated {
                continue;
            }
            let input = ids[PhaseKind::Input.index()];
            for (other_ids, _, other_deployment) in &flags {
                if *other_deployment {
                    continue;
                }
                self.phases[input]
                    .dependencies
                    .push(other_ids[PhaseKind::Output.index()]);
            }
        }
    }

    fn display_name(&self, key: &str) -> String {
        self.collection
            .get(key)
            .map(|p| p.name().to_string())
            .unwrap_or_else(|| key.to_string())
    }
}

/// Emits every phase after its dependencies. The cross-link passes only
/// add edges that the per-pipeline chains do not reverse, so no cycle can
/// arise here.
fn topological_sort(phases: &[Phase], pipelines: &IndexMap<String, [PhaseId; 4]>) -> Vec<PhaseId> {
    let mut visited = vec![false; phases.len()];
    let mut order = Vec::with_capacity(phases.len());

    for ids in pipelines.values() {
        for &id in ids {
            sort_visit(phases, id, &mut visited, &mut order);
        }
    }

    order
}

fn sort_visit(phases: &[Phase], id: PhaseId, visited: &mut [bool], order: &mut Vec<PhaseId>) {
    if visited[id] {
        return;
    }
    visited[id] = true;
    for &dep in phases[id].dependencies.iter().chain(&phases[id].ordering) {
        sort_visit(phases, dep, visited, order);
    }
    order.push(id);
}

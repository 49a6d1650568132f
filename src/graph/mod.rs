//! The phase dependency graph.
//!
//! Pipeline declarations compile into an arena of [`Phase`] nodes plus a
//! topologically sorted execution order. Phases reference each other by
//! arena index, so the graph is a plain `Vec` with no reference cycles.

mod builder;

pub use builder::build_phase_graph;

use crate::modules::Module;
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// Index of a phase in the graph arena.
pub type PhaseId = usize;

/// One of the four fixed phases of a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PhaseKind {
    /// Gathers input documents.
    Input,
    /// The main processing phase.
    Process,
    /// Runs after every same-group Process phase has completed.
    PostProcess,
    /// Writes results.
    Output,
}

impl PhaseKind {
    /// All four kinds, in intra-pipeline execution order.
    pub const ALL: [PhaseKind; 4] = [
        PhaseKind::Input,
        PhaseKind::Process,
        PhaseKind::PostProcess,
        PhaseKind::Output,
    ];

    /// The slot index for per-pipeline arrays.
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::Input => 0,
            Self::Process => 1,
            Self::PostProcess => 2,
            Self::Output => 3,
        }
    }

    /// The intra-pipeline predecessor, if any.
    #[must_use]
    pub fn predecessor(self) -> Option<PhaseKind> {
        match self {
            Self::Input => None,
            Self::Process => Some(Self::Input),
            Self::PostProcess => Some(Self::Process),
            Self::Output => Some(Self::PostProcess),
        }
    }

    /// The single-letter marker used in the execution timeline.
    #[must_use]
    pub fn letter(self) -> char {
        match self {
            Self::Input => 'I',
            Self::Process => 'P',
            Self::PostProcess => 'T',
            Self::Output => 'O',
        }
    }
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Input => "Input",
            Self::Process => "Process",
            Self::PostProcess => "PostProcess",
            Self::Output => "Output",
        };
        write!(f, "{name}")
    }
}

/// A runnable node of the phase graph: one pipeline × one phase kind.
#[derive(Clone)]
pub struct Phase {
    /// The owning pipeline's display name.
    pub pipeline: String,
    /// The owning pipeline's lookup key (lowercased name).
    pub key: String,
    /// Which of the four phases this is.
    pub kind: PhaseKind,
    /// The module chain to run.
    pub modules: Arc<[Arc<dyn Module>]>,
    /// Phases that must complete successfully before this one starts.
    /// A failure here skips this phase and cascades.
    pub dependencies: Vec<PhaseId>,
    /// Phases that must merely finish (with any status) before this one
    /// starts: the same-group PostProcess barrier. A failure here does
    /// not skip this phase.
    pub ordering: Vec<PhaseId>,
    /// Whether the owning pipeline is a deployment pipeline.
    pub deployment: bool,
    /// Whether the owning pipeline is isolated.
    pub isolated: bool,
}

impl fmt::Debug for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Phase")
            .field("pipeline", &self.pipeline)
            .field("kind", &self.kind)
            .field("modules", &self.modules.len())
            .field("dependencies", &self.dependencies)
            .field("ordering", &self.ordering)
            .field("deployment", &self.deployment)
            .field("isolated", &self.isolated)
            .finish()
    }
}

/// The compiled phase graph.
#[derive(Debug)]
pub struct PhaseGraph {
    phases: Vec<Phase>,
    order: Vec<PhaseId>,
    pipelines: IndexMap<String, [PhaseId; 4]>,
}

impl PhaseGraph {
    pub(crate) fn new(
        phases: Vec<Phase>,
        order: Vec<PhaseId>,
        pipelines: IndexMap<String, [PhaseId; 4]>,
    ) -> Self {
        Self {
            phases,
            order,
            pipelines,
        }
    }

    /// The phase arena.
    #[must_use]
    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    /// A phase by id.
    #[must_use]
    pub fn phase(&self, id: PhaseId) -> &Phase {
        &self.phases[id]
    }

    /// The topologically sorted execution order: every phase appears after
    /// all of its dependencies.
    #[must_use]
    pub fn order(&self) -> &[PhaseId] {
        &self.order
    }

    /// Pipeline key → the pipeline's four phase ids, in registration order.
    #[must_use]
    pub fn pipelines(&self) -> &IndexMap<String, [PhaseId; 4]> {
        &self.pipelines
    }

    /// The phase id for a pipeline key and kind.
    #[must_use]
    pub fn phase_id(&self, key: &str, kind: PhaseKind) -> Option<PhaseId> {
        self.pipelines.get(key).map(|ids| ids[kind.index()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_order_and_predecessors() {
        assert_eq!(PhaseKind::Input.predecessor(), None);
        assert_eq!(PhaseKind::Process.predecessor(), Some(PhaseKind::Input));
        assert_eq!(
            PhaseKind::PostProcess.predecessor(),
            Some(PhaseKind::Process)
        );
        assert_eq!(PhaseKind::Output.predecessor(), Some(PhaseKind::PostProcess));
    }

    #[test]
    fn kind_letters() {
        let letters: String = PhaseKind::ALL.iter().map(|k| k.letter()).collect();
        assert_eq!(letters, "IPTO");
    }
}

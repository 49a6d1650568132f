//! Pipeline declaration and execution policy.

use crate::errors::GraphError;
use crate::graph::PhaseKind;
use crate::modules::Module;
use indexmap::IndexSet;
use std::fmt;
use std::sync::Arc;

/// Per-pipeline selection rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionPolicy {
    /// Resolves to `Manual` for deployment pipelines and `Normal`
    /// otherwise.
    #[default]
    Default,
    /// Always executed, whether or not it was requested.
    Always,
    /// Executed only when explicitly requested by name.
    Manual,
    /// Executed when the caller asks for normal pipelines.
    Normal,
}

impl ExecutionPolicy {
    /// Resolves `Default` against the pipeline's deployment flag.
    #[must_use]
    pub fn resolve(self, deployment: bool) -> Self {
        match self {
            Self::Default if deployment => Self::Manual,
            Self::Default => Self::Normal,
            other => other,
        }
    }
}

/// A named pipeline declaration: four ordered module lists, dependencies,
/// and scheduling flags.
///
/// Declarations are inert; the engine compiles the registered collection
/// into a phase graph on the first execution.
#[derive(Clone)]
pub struct Pipeline {
    name: String,
    modules: [Vec<Arc<dyn Module>>; 4],
    dependencies: IndexSet<String>,
    isolated: bool,
    deployment: bool,
    policy: ExecutionPolicy,
}

impl Pipeline {
    /// Creates an empty pipeline declaration.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty or whitespace-only.
    pub fn new(name: impl Into<String>) -> Result<Self, GraphError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(GraphError::InvalidName);
        }
        Ok(Self {
            name,
            modules: [Vec::new(), Vec::new(), Vec::new(), Vec::new()],
            dependencies: IndexSet::new(),
            isolated: false,
            deployment: false,
            policy: ExecutionPolicy::Default,
        })
    }

    /// Appends a module to the Input phase.
    #[must_use]
    pub fn with_input_module(self, module: Arc<dyn Module>) -> Self {
        self.with_module(PhaseKind::Input, module)
    }

    /// Appends a module to the Process phase.
    #[must_use]
    pub fn with_process_module(self, module: Arc<dyn Module>) -> Self {
        self.with_module(PhaseKind::Process, module)
    }

    /// Appends a module to the PostProcess phase.
    #[must_use]
    pub fn with_post_process_module(self, module: Arc<dyn Module>) -> Self {
        self.with_module(PhaseKind::PostProcess, module)
    }

    /// Appends a module to the Output phase.
    #[must_use]
    pub fn with_output_module(self, module: Arc<dyn Module>) -> Self {
        self.with_module(PhaseKind::Output, module)
    }

    /// Appends a module to the given phase.
    #[must_use]
    pub fn with_module(mut self, kind: PhaseKind, module: Arc<dyn Module>) -> Self {
        self.modules[kind.index()].push(module);
        self
    }

    /// Declares a dependency on another pipeline by name.
    #[must_use]
    pub fn with_dependency(mut self, name: impl Into<String>) -> Self {
        self.dependencies.insert(name.into());
        self
    }

    /// Declares dependencies on other pipelines by name.
    #[must_use]
    pub fn with_dependencies(
        mut self,
        names: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        for name in names {
            self.dependencies.insert(name.into());
        }
        self
    }

    /// Marks the pipeline as isolated: it may have no dependencies and no
    /// pipeline may depend on it.
    #[must_use]
    pub fn isolated(mut self) -> Self {
        self.isolated = true;
        self
    }

    /// Marks the pipeline as a deployment pipeline, gated behind all
    /// non-deployment pipelines' Output phases.
    #[must_use]
    pub fn deployment(mut self) -> Self {
        self.deployment = true;
        self
    }

    /// Sets the execution policy.
    #[must_use]
    pub fn with_policy(mut self, policy: ExecutionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The pipeline's display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The module list for a phase.
    #[must_use]
    pub fn modules(&self, kind: PhaseKind) -> &[Arc<dyn Module>] {
        &self.modules[kind.index()]
    }

    /// The declared dependency names, in declaration order.
    #[must_use]
    pub fn dependencies(&self) -> &IndexSet<String> {
        &self.dependencies
    }

    /// Whether the pipeline is isolated.
    #[must_use]
    pub fn is_isolated(&self) -> bool {
        self.isolated
    }

    /// Whether the pipeline is a deployment pipeline.
    #[must_use]
    pub fn is_deployment(&self) -> bool {
        self.deployment
    }

    /// The declared (unresolved) execution policy.
    #[must_use]
    pub fn policy(&self) -> ExecutionPolicy {
        self.policy
    }

    /// The execution policy with `Default` resolved against the deployment
    /// flag.
    #[must_use]
    pub fn effective_policy(&self) -> ExecutionPolicy {
        self.policy.resolve(self.deployment)
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.name)
            .field(
                "modules",
                &PhaseKind::ALL.map(|k| (k, self.modules[k.index()].len())),
            )
            .field("dependencies", &self.dependencies)
            .field("isolated", &self.isolated)
            .field("deployment", &self.deployment)
            .field("policy", &self.policy)
            .finish()
    }
}

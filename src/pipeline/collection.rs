//! The registered pipeline collection.

use super::Pipeline;
use crate::errors::GraphError;
use indexmap::IndexMap;

/// An insertion-ordered collection of pipelines with case-insensitive
/// unique names.
///
/// Iteration order is the registration order; the phase graph builder
/// relies on it as the deterministic tie-break. Every mutation bumps the
/// collection version, which invalidates the engine's cached phase graph
/// for the next execution.
#[derive(Debug, Default)]
pub struct PipelineCollection {
    pipelines: IndexMap<String, Pipeline>,
    version: u64,
}

impl PipelineCollection {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The lookup key for a pipeline name.
    #[must_use]
    pub fn key_for(name: &str) -> String {
        name.to_lowercase()
    }

    /// Registers a pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error if a pipeline with the same case-insensitive name
    /// is already registered.
    pub fn add(&mut self, pipeline: Pipeline) -> Result<(), GraphError> {
        let key = Self::key_for(pipeline.name());
        if self.pipelines.contains_key(&key) {
            return Err(GraphError::DuplicateName(pipeline.name().to_string()));
        }
        self.pipelines.insert(key, pipeline);
        self.version += 1;
        Ok(())
    }

    /// Removes a pipeline by name. Returns the removed declaration.
    pub fn remove(&mut self, name: &str) -> Option<Pipeline> {
        let removed = self.pipelines.shift_remove(&Self::key_for(name));
        if removed.is_some() {
            self.version += 1;
        }
        removed
    }

    /// Looks up a pipeline by case-insensitive name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Pipeline> {
        self.pipelines.get(&Self::key_for(name))
    }

    /// Whether a pipeline with the given name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.pipelines.contains_key(&Self::key_for(name))
    }

    /// Iterates `(key, pipeline)` pairs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Pipeline)> {
        self.pipelines.iter().map(|(k, p)| (k.as_str(), p))
    }

    /// The number of registered pipelines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    /// Whether the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }

    /// The mutation counter used for phase graph cache invalidation.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }
}

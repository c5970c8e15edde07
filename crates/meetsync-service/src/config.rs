//! Orchestrator configuration.

/// Tuning for the confirmation, deletion and reconciliation fan-outs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Maximum (participant, provider) calls in flight. `1` runs them serially.
    pub max_concurrency: usize,
    /// Treat a provider "not found" on delete as already deleted.
    pub tolerate_missing_remote_on_delete: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_concurrency: Self::DEFAULT_MAX_CONCURRENCY,
            tolerate_missing_remote_on_delete: true,
        }
    }
}

impl OrchestratorConfig {
    pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

    pub fn serial() -> Self {
        Self::default().with_max_concurrency(1)
    }

    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max.max(1);
        self
    }

    pub fn with_tolerate_missing_remote(mut self, tolerate: bool) -> Self {
        self.tolerate_missing_remote_on_delete = tolerate;
        self
    }
}

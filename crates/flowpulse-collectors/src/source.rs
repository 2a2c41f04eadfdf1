use async_trait::async_trait;
use flowpulse_core::Platform;

use crate::types::CollectOutcome;

/// Uniform interface over the per-platform collectors.
///
/// `collect` never returns `Err`: transport failures travel inside the
/// [`CollectOutcome`] so the orchestrator can record them on the run without
/// losing items gathered before the failure.
#[async_trait]
pub trait SourceCollector: Send + Sync {
    /// Platform this collector observes.
    fn platform(&self) -> Platform;

    /// Runs one collection pass for `country`, gathering at most `limit` items.
    async fn collect(&self, country: &str, limit: usize) -> CollectOutcome;
}

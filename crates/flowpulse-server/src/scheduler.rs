//! Background job scheduler.
//!
//! Registers one recurring job that sweeps the full platform × country
//! matrix on the configured cron cadence. A tick that fires while a
//! previous sweep (scheduled or manually triggered) is still in flight is
//! skipped rather than queued.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use flowpulse_core::AppConfig;
use flowpulse_ingest::{Orchestrator, UnitStatus};

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive for
/// the lifetime of the process. Dropping it shuts down all scheduled jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised, the
/// job cannot be registered (e.g. an invalid cron expression), or the
/// scheduler fails to start.
pub async fn build_scheduler(
    orchestrator: Arc<Orchestrator>,
    config: Arc<AppConfig>,
    collect_lock: Arc<Mutex<()>>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    let schedule = config.cron_schedule.clone();
    let job = Job::new_async(schedule.as_str(), move |_uuid, _lock| {
        let orchestrator = Arc::clone(&orchestrator);
        let config = Arc::clone(&config);
        let collect_lock = Arc::clone(&collect_lock);

        Box::pin(async move {
            let Ok(_guard) = collect_lock.try_lock() else {
                tracing::warn!("scheduler: previous collection still running; skipping tick");
                return;
            };

            let platforms = orchestrator.available_platforms();
            if platforms.is_empty() {
                tracing::warn!("scheduler: no collectors available; skipping tick");
                return;
            }

            tracing::info!("scheduler: starting collection sweep");
            let results = orchestrator
                .run_all(
                    &platforms,
                    &config.countries,
                    config.items_per_platform,
                    config.collect_deadline(),
                )
                .await;
            let failed = results
                .iter()
                .filter(|r| r.status == UnitStatus::Failed)
                .count();
            tracing::info!(
                units = results.len(),
                failed,
                "scheduler: collection sweep complete"
            );
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;
    Ok(scheduler)
}

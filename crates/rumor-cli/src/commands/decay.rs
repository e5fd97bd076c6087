//! Decay and worker command implementations.

use crate::cli::{DecayArgs, WorkerArgs};
use crate::error::{CliError, Result};
use crate::output::Formatter;
use rumor_domain::traits::RumorRepository;
use rumor_engine::{DecayWorker, RumorService, MAX_SWEEP_INTERVAL_MINUTES};
use std::sync::Arc;
use std::time::Duration;

/// Execute the decay command.
pub fn execute_decay<R: RumorRepository>(
    args: DecayArgs,
    service: &RumorService<R>,
    formatter: &Formatter,
) -> Result<String> {
    let report = match args.as_of {
        Some(as_of) => service.decay(as_of)?,
        None => service.decay_now()?,
    };
    formatter.format_decay(&report)
}

/// Execute the worker command.
///
/// Runs in the foreground until Ctrl+C or the requested number of passes.
pub async fn execute_worker<R: RumorRepository>(
    args: WorkerArgs,
    service: Arc<RumorService<R>>,
    formatter: &Formatter,
) -> Result<String> {
    let mut worker = match args.interval_minutes {
        Some(minutes) if minutes == 0 || minutes > MAX_SWEEP_INTERVAL_MINUTES => {
            return Err(CliError::InvalidInput(format!(
                "--interval-minutes must be between 1 and {}",
                MAX_SWEEP_INTERVAL_MINUTES
            )))
        }
        Some(minutes) => DecayWorker::new(service, Duration::from_secs(minutes * 60)),
        None => DecayWorker::from_service(service),
    };

    match args.cycles {
        Some(cycles) => worker.run_cycles(cycles).await?,
        None => worker.run().await?,
    }

    let metrics = worker.metrics();
    Ok(formatter.success(&format!(
        "Decay worker stopped after {} pass(es): {} decayed, {} forgotten",
        metrics.sweep_count,
        metrics.total_updated(),
        metrics.total_forgotten()
    )))
}

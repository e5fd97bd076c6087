//! Background worker for periodic decay

use crate::{DecayMetrics, DecayReport, RumorError, RumorService};
use rumor_domain::traits::RumorRepository;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{interval, Duration};

/// Background worker that runs decay passes on a schedule
///
/// Each tick decays every rumor up to the service clock's current time.
/// Because decay is idempotent for a fixed time, a tick that fires twice
/// in the same second does no harm.
///
/// # Examples
///
/// ```no_run
/// use rumor_engine::{DecayWorker, EngineConfig, RumorService};
/// use rumor_store::SqliteStore;
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = EngineConfig::default();
///     let store = SqliteStore::new("rumors.db")?;
///     let service = Arc::new(RumorService::new(store, config.clone())?);
///     let mut worker = DecayWorker::new(service, config.sweep_interval());
///
///     // Run indefinitely (until Ctrl+C)
///     worker.run().await?;
///     Ok(())
/// }
/// ```
pub struct DecayWorker<R: RumorRepository> {
    service: Arc<RumorService<R>>,
    interval: Duration,
    metrics: DecayMetrics,
}

impl<R: RumorRepository> DecayWorker<R> {
    /// Create a worker that decays every `interval`
    pub fn new(service: Arc<RumorService<R>>, interval: Duration) -> Self {
        Self {
            service,
            interval,
            metrics: DecayMetrics::new(),
        }
    }

    /// Create a worker using the service's configured sweep interval
    pub fn from_service(service: Arc<RumorService<R>>) -> Self {
        let interval = service.config().sweep_interval();
        Self::new(service, interval)
    }

    fn pass(&mut self) -> Result<DecayReport, RumorError> {
        let started = Instant::now();
        let result = self.service.decay_now();
        self.metrics.total_runtime_ms += started.elapsed().as_millis() as u64;
        match &result {
            Ok(report) => self.metrics.record_report(report),
            Err(_) => self.metrics.record_failure(),
        }
        result
    }

    /// Run the worker until Ctrl+C
    ///
    /// A failed pass is logged and the worker keeps going.
    pub async fn run(&mut self) -> Result<(), RumorError> {
        let mut ticker = interval(self.interval);

        tracing::info!(interval = ?self.interval, "Decay worker started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    tracing::debug!("Starting decay pass");

                    match self.pass() {
                        Ok(report) => {
                            tracing::info!(
                                "Decay pass completed: {} decayed, {} forgotten across {} rumors",
                                report.entries_updated,
                                report.entries_forgotten,
                                report.rumors_changed
                            );
                        }
                        Err(e) => {
                            tracing::error!("Decay pass failed: {}", e);
                        }
                    }
                }
                signal = tokio::signal::ctrl_c() => {
                    signal.map_err(|e| RumorError::Worker(e.to_string()))?;
                    tracing::info!("Shutdown signal received, stopping decay worker");
                    break;
                }
            }
        }

        tracing::info!("Decay worker stopped. Final metrics:\n{}", self.metrics.summary());
        Ok(())
    }

    /// Run a fixed number of passes, stopping at the first failure
    ///
    /// The first pass runs immediately.
    pub async fn run_cycles(&mut self, cycles: usize) -> Result<(), RumorError> {
        let mut ticker = interval(self.interval);

        for cycle in 0..cycles {
            ticker.tick().await;

            let report = self.pass().inspect_err(|e| {
                tracing::error!("Decay pass {}/{} failed: {}", cycle + 1, cycles, e);
            })?;
            tracing::info!(
                "Decay pass {}/{} completed: {} decayed, {} forgotten",
                cycle + 1,
                cycles,
                report.entries_updated,
                report.entries_forgotten
            );
        }

        tracing::info!(
            "Decay worker finished {} passes. Final metrics:\n{}",
            cycles,
            self.metrics.summary()
        );
        Ok(())
    }

    /// Cumulative metrics since creation or the last reset
    pub fn metrics(&self) -> &DecayMetrics {
        &self.metrics
    }

    /// Reset the metrics counters
    pub fn reset_metrics(&mut self) {
        self.metrics.reset();
    }
}

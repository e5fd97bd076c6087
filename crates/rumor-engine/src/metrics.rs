//! Metrics collection for decay passes

use crate::DecayReport;
use rumor_domain::Severity;
use std::collections::BTreeMap;

/// Cumulative metrics over decay passes
///
/// Tracks entries decayed and forgotten per severity, and pass counts.
#[derive(Debug, Clone, Default)]
pub struct DecayMetrics {
    /// Entries decayed per severity
    pub updated: BTreeMap<Severity, usize>,

    /// Entries forgotten per severity
    pub forgotten: BTreeMap<Severity, usize>,

    /// Total decay passes completed
    pub sweep_count: usize,

    /// Passes that failed
    pub failed_sweeps: usize,

    /// Total runtime in milliseconds
    pub total_runtime_ms: u64,
}

impl DecayMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one completed pass into the totals
    pub fn record_report(&mut self, report: &DecayReport) {
        for (severity, count) in &report.updated_by_severity {
            *self.updated.entry(*severity).or_insert(0) += count;
        }
        for (severity, count) in &report.forgotten_by_severity {
            *self.forgotten.entry(*severity).or_insert(0) += count;
        }
        self.sweep_count += 1;
    }

    /// Record a pass that failed
    pub fn record_failure(&mut self) {
        self.failed_sweeps += 1;
    }

    /// Get total entries decayed across all severities
    pub fn total_updated(&self) -> usize {
        self.updated.values().sum()
    }

    /// Get total entries forgotten across all severities
    pub fn total_forgotten(&self) -> usize {
        self.forgotten.values().sum()
    }

    /// Reset all metrics
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Decay Metrics Summary".to_string(),
            "=====================".to_string(),
            format!("Decay passes: {}", self.sweep_count),
            format!("Failed passes: {}", self.failed_sweeps),
            format!("Total runtime: {}ms", self.total_runtime_ms),
            String::new(),
        ];

        if !self.updated.is_empty() {
            lines.push("Decayed by severity:".to_string());
            for (severity, count) in &self.updated {
                lines.push(format!("  {}: {}", severity, count));
            }
            lines.push(format!("  Total: {}", self.total_updated()));
            lines.push(String::new());
        }

        if !self.forgotten.is_empty() {
            lines.push("Forgotten by severity:".to_string());
            for (severity, count) in &self.forgotten {
                lines.push(format!("  {}: {}", severity, count));
            }
            lines.push(format!("  Total: {}", self.total_forgotten()));
        }

        lines.join("\n")
    }
}

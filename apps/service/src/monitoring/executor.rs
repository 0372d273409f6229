use std::sync::Arc;

use tracing::{debug, info, warn};

use super::parser::parse_ping_output;
use super::probe::Probe;
use super::scheduler::{MonitorState, MonitorStats};
use super::types::MetricsRecord;
use super::validation::Target;
use crate::database::MetricsStore;
use crate::error::Result;

/// Monitoring executor - runs one probe round and stores the outcome
pub struct MonitoringExecutor {
    probe: Arc<dyn Probe>,
    store: Arc<dyn MetricsStore>,
    target: Target,
    ping_count: u32,
    retention_days: u32,
    stats: Arc<MonitorStats>,
}

impl MonitoringExecutor {
    /// Create a new monitoring executor
    pub fn new(
        probe: Arc<dyn Probe>,
        store: Arc<dyn MetricsStore>,
        target: Target,
        ping_count: u32,
        retention_days: u32,
    ) -> Self {
        Self {
            probe,
            store,
            target,
            ping_count,
            retention_days,
            stats: Arc::new(MonitorStats::default()),
        }
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn ping_count(&self) -> u32 {
        self.ping_count
    }

    pub fn stats(&self) -> Arc<MonitorStats> {
        Arc::clone(&self.stats)
    }

    /// Probe, parse and append.
    ///
    /// A failed ping process still yields a record (its output usually states
    /// the loss); only a store failure makes the round fail.
    pub async fn execute_round(&self) -> Result<MetricsRecord> {
        debug!("Running ping round against {}", self.target);
        self.stats.set_state(MonitorState::Probing);
        let output = self.probe.run_round(&self.target, self.ping_count).await;

        let record = parse_ping_output(&output.text);

        if let Some(error) = &output.error {
            warn!("Ping command error: {} (packet loss: {:.1}%)", error, record.packet_loss);
        }

        self.stats.set_state(MonitorState::Recording);
        self.store.append(&record, self.retention_days).await?;

        match (record.min, record.avg, record.max, record.stddev) {
            (Some(min), Some(avg), Some(max), Some(stddev)) if record.packet_loss > 0.0 => info!(
                "Saved stats: min={:.3} avg={:.3} max={:.3} stddev={:.3} ms (packet loss: {:.1}%)",
                min, avg, max, stddev, record.packet_loss
            ),
            (Some(min), Some(avg), Some(max), Some(stddev)) => info!(
                "Saved stats: min={:.3} avg={:.3} max={:.3} stddev={:.3} ms",
                min, avg, max, stddev
            ),
            _ => info!("Saved stats: no data available (packet loss: {:.1}%)", record.packet_loss),
        }

        Ok(record)
    }
}

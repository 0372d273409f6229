use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// Statistics of one ping round.
///
/// Latency fields are `None` when no reply summary was available, which is
/// different from a measured latency of zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    /// When the round completed, always UTC
    pub timestamp: DateTime<Utc>,

    /// Fastest reply in milliseconds
    pub min: Option<f64>,

    /// Mean reply time in milliseconds
    pub avg: Option<f64>,

    /// Slowest reply in milliseconds
    pub max: Option<f64>,

    /// Spread of reply times (stddev on BSD, mdev on Linux)
    pub stddev: Option<f64>,

    /// Percentage of echo requests without a reply, 0 to 100
    pub packet_loss: f64,
}

impl MetricsRecord {
    /// A round with no latency data at all.
    ///
    /// The timestamp is truncated to microseconds, the precision the store keeps.
    pub fn unreachable(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp: timestamp.trunc_subsecs(6),
            min: None,
            avg: None,
            max: None,
            stddev: None,
            packet_loss: 100.0,
        }
    }

    /// A round that produced a reply summary.
    pub fn with_latency(
        timestamp: DateTime<Utc>,
        [min, avg, max, stddev]: [f64; 4],
        packet_loss: f64,
    ) -> Self {
        Self {
            timestamp: timestamp.trunc_subsecs(6),
            min: Some(min),
            avg: Some(avg),
            max: Some(max),
            stddev: Some(stddev),
            packet_loss,
        }
    }

    pub fn has_latency(&self) -> bool {
        self.min.is_some()
    }
}

/// Raw result of one probe invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutput {
    /// Combined stdout and stderr of the probe process
    pub text: String,

    /// Whether the process reported overall success
    pub success: bool,

    /// Why the process failed, if it did
    pub error: Option<String>,
}

impl ProbeOutput {
    pub fn completed(text: String, success: bool, error: Option<String>) -> Self {
        Self { text, success, error }
    }

    /// The process could not run at all; parses as total loss.
    pub fn unavailable(error: impl Into<String>) -> Self {
        Self { text: String::new(), success: false, error: Some(error.into()) }
    }
}

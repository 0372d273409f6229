//! Monitoring engine module - probes the target and records the outcome
//!
//! This module is responsible for:
//! - Validating the target before any process is spawned
//! - Running one ping round per iteration
//! - Parsing the diagnostic text into a metrics record
//! - Driving rounds forever and persisting them through the store

pub mod executor;
pub mod parser;
pub mod probe;
pub mod scheduler;
pub mod types;
pub mod validation;

#[cfg(test)]
pub(crate) mod testing;

pub use executor::MonitoringExecutor;
pub use parser::parse_ping_output;
pub use probe::{PingProbe, Probe};
pub use scheduler::{MonitorState, MonitorStats, MonitoringScheduler};
pub use types::{MetricsRecord, ProbeOutput};
pub use validation::{Target, validate_target};

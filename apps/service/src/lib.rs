//! Core of pingo: probes a single target with the system `ping`, turns the
//! diagnostic text into [`MetricsRecord`]s and keeps them in a SQLite store
//! with a sliding retention window.
//!
//! The HTTP surface and the process entry point live in `pingo-server`; this
//! crate only exposes the pieces they are wired from.

pub mod config;
pub mod database;
pub mod error;
pub mod monitoring;
pub mod pool;

pub use config::Config;
pub use database::{LibsqlStore, MetricsStore, RetentionPolicy, initialize_database};
pub use error::{Error, Result};
pub use monitoring::{
    MetricsRecord, MonitorState, MonitorStats, MonitoringExecutor, MonitoringScheduler, PingProbe,
    Probe, ProbeOutput, Target, parse_ping_output,
};

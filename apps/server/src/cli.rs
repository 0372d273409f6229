use std::path::PathBuf;

use clap::Parser;
use pingo_service::Config;
use pingo_service::config::default_config_path;
use pingo_service::error::ConfigError;

/// Continuous latency and packet-loss monitor for a single host
#[derive(Debug, Parser)]
#[command(name = "pingo", version, about)]
pub struct Cli {
    /// Path to config file
    #[arg(long, env = "PINGO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Web server port (overrides config)
    #[arg(long, env = "PINGO_PORT")]
    pub port: Option<u16>,

    /// Number of days to retain ping data (overrides config)
    #[arg(long, env = "PINGO_RETENTION")]
    pub retention: Option<u32>,

    /// Number of pings per round (overrides config)
    #[arg(long, env = "PINGO_PINGS")]
    pub pings: Option<u32>,

    /// Target host to ping (overrides config)
    #[arg(long, env = "PINGO_TARGET")]
    pub target: Option<String>,

    /// Path to SQLite database file (overrides config)
    #[arg(long, env = "PINGO_DB")]
    pub db: Option<PathBuf>,
}

impl Cli {
    /// Config file, then flags on top, then validation.
    pub fn resolve_config(&self) -> Result<Config, ConfigError> {
        let path = match &self.config {
            Some(path) => Some(path.clone()),
            None => default_config_path().ok(),
        };

        let mut config = match path {
            Some(path) => Config::load(Some(path))?,
            None => {
                tracing::warn!("No config directory available, using defaults");
                Config::default()
            }
        };

        self.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    fn apply(&self, config: &mut Config) {
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(days) = self.retention {
            config.retention_days = days;
        }
        if let Some(pings) = self.pings {
            config.ping_count = pings;
        }
        if let Some(target) = &self.target {
            config.target = target.clone();
        }
        if let Some(db) = &self.db {
            config.db_path = db.clone();
        }
    }
}

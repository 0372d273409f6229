use std::{env, fmt, fs, path};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::monitoring::validation::validate_target;

const APP_DIR: &str = "pingo";
const MAX_PING_COUNT: u32 = 100;
const MAX_RETENTION_DAYS: u32 = 36_500;

/// Runtime configuration of a pingo process.
///
/// Every key is optional in the TOML file; missing keys fall back to
/// [`Config::default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Port of the HTTP query surface
    pub port: u16,
    /// Host name or IP address to probe
    pub target: String,
    /// Echo requests sent per round
    pub ping_count: u32,
    /// Days of history kept in the store
    pub retention_days: u32,
    /// Location of the SQLite database file
    pub db_path: path::PathBuf,
}

/// Used to ensure we are actually reading a toml file
fn normalize_toml_path(path: &path::Path) -> path::PathBuf {
    let mut path = path.to_path_buf();
    if path.extension().map(|ext| ext != "toml").unwrap_or(true) {
        path.set_extension("toml");
    }
    path
}

/// Resolve `$<xdg_var>` or `$HOME/<fallback>`.
fn xdg_dir(xdg_var: &str, fallback: &str) -> Result<path::PathBuf, ConfigError> {
    if let Some(dir) = env::var_os(xdg_var).filter(|dir| !dir.is_empty()) {
        Ok(path::PathBuf::from(dir))
    } else if let Some(home_dir) = env::home_dir() {
        Ok(home_dir.join(fallback))
    } else {
        Err(ConfigError::ConfigPathUnavailable)
    }
}

/// Get default config path ($XDG_CONFIG_HOME/pingo/config.toml or
/// $HOME/.config/...)
pub fn default_config_path() -> Result<path::PathBuf, ConfigError> {
    Ok(xdg_dir("XDG_CONFIG_HOME", ".config")?.join(APP_DIR).join("config.toml"))
}

/// Get default database path ($XDG_DATA_HOME/pingo/ping_stats.db or
/// $HOME/.local/share/...)
pub fn default_db_path() -> Result<path::PathBuf, ConfigError> {
    Ok(xdg_dir("XDG_DATA_HOME", ".local/share")?.join(APP_DIR).join("ping_stats.db"))
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 7777,
            target: "8.8.8.8".into(),
            ping_count: 5,
            retention_days: 15,
            // Relative fallback only matters on hosts without $HOME.
            db_path: default_db_path().unwrap_or_else(|_| path::PathBuf::from("ping_stats.db")),
        }
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let write_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str, value: &dyn fmt::Display| {
                writeln!(f, "  {:indent$}{}: {}", "", label, value, indent = level * 2)
            }
        };
        let write_title_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str| {
                writeln!(f, "{:indent$}{}", "", label, indent = level * 2)
            }
        };

        let write_title_1 = write_title_indented(1);
        let write_1 = write_indented(1);

        writeln!(f, "Current Configuration State:")?;
        write_title_1(f, "Probe")?;
        write_1(f, "Target", &self.target)?;
        write_1(f, "Pings per round", &self.ping_count)?;
        write_title_1(f, "Storage")?;
        write_1(f, "Database", &self.db_path.display())?;
        write_1(f, "Retention (days)", &self.retention_days)?;
        write_title_1(f, "HTTP")?;
        write_1(f, "Port", &self.port)?;

        Ok(())
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// A missing file is not an error: the defaults are returned and the
    /// caller can still override them from the command line.
    ///
    /// ```no_run
    /// let cfg = pingo_service::Config::load(None::<&std::path::Path>)?;
    /// println!("{}", cfg);
    /// # Ok::<(), pingo_service::error::ConfigError>(())
    /// ```
    pub fn load(optional_path: Option<impl AsRef<path::Path>>) -> Result<Self, ConfigError> {
        let config_path: path::PathBuf = if let Some(path) = optional_path {
            normalize_toml_path(path.as_ref())
        } else {
            default_config_path()?
        };

        if !config_path.exists() {
            tracing::info!("Config file not found at {}, using defaults", config_path.display());
            return Ok(Self::default());
        }

        let raw_string = fs::read_to_string(&config_path)
            .map_err(|source| ConfigError::Read { path: config_path.clone(), source })?;
        let config = toml::from_str(raw_string.as_str())
            .map_err(|source| ConfigError::Parse { path: config_path.clone(), source })?;

        tracing::info!("Loaded config from {}", config_path.display());
        Ok(config)
    }

    /// Reject values the monitor loop cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::Invalid("port must be between 1 and 65535".into()));
        }

        if self.ping_count == 0 || self.ping_count > MAX_PING_COUNT {
            return Err(ConfigError::Invalid(format!(
                "ping_count must be between 1 and {MAX_PING_COUNT}, got {}",
                self.ping_count
            )));
        }

        if self.retention_days == 0 || self.retention_days > MAX_RETENTION_DAYS {
            return Err(ConfigError::Invalid(format!(
                "retention_days must be between 1 and {MAX_RETENTION_DAYS}, got {}",
                self.retention_days
            )));
        }

        validate_target(&self.target).map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}

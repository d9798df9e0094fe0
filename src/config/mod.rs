use anyhow::{Context, Result};
use config::{Config, File};
use indexmap::IndexMap;
use log::{debug, LevelFilter};
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "/etc/w1vz.ini";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("server host must not be empty")]
    EmptyHost,

    #[error("server port must be in 1..=65535")]
    InvalidPort,

    #[error("polling interval must be a positive number of seconds")]
    InvalidInterval,

    #[error("http timeout must be a positive number of seconds")]
    InvalidTimeout,
}

fn default_timeout() -> u64 {
    10
}

fn default_user_agent() -> String {
    format!("1wirevz/{}", env!("CARGO_PKG_VERSION"))
}

fn default_i2c_offset() -> usize {
    2
}

fn default_fallback_count() -> u32 {
    3
}

fn default_w1_root() -> PathBuf {
    PathBuf::from("/sys/bus/w1/devices")
}

fn default_i2c_root() -> PathBuf {
    PathBuf::from("/sys/bus/i2c/devices")
}

fn default_log_level() -> String {
    "info".to_string()
}

// Leading and trailing slashes are dropped so the URL never carries `//`.
fn deserialize_base_path<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    Ok(value.trim().trim_matches('/').to_string())
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(deserialize_with = "deserialize_base_path")]
    pub path: String,
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl ServerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PollingConfig {
    pub interval: u64,
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval)
    }
}

/// How the set of 1-Wire bus masters is found on each cycle.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BusDiscovery {
    /// Count `i2c` symlinks under the i2c device directory (DS2482 bridges).
    #[default]
    I2c,
    /// Scan the w1 device directory for `w1_bus_master<N>` entries.
    W1,
    /// Always use buses `1..=fallback_count`.
    Fixed,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BusConfig {
    #[serde(default)]
    pub discovery: BusDiscovery,
    #[serde(default = "default_i2c_offset")]
    pub i2c_offset: usize,
    #[serde(default = "default_fallback_count")]
    pub fallback_count: u32,
    #[serde(default = "default_w1_root")]
    pub w1_root: PathBuf,
    #[serde(default = "default_i2c_root")]
    pub i2c_root: PathBuf,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            discovery: BusDiscovery::default(),
            i2c_offset: default_i2c_offset(),
            fallback_count: default_fallback_count(),
            w1_root: default_w1_root(),
            i2c_root: default_i2c_root(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub polling: PollingConfig,
    #[serde(default)]
    pub bus: BusConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Device id to destination uuid.
    #[serde(default)]
    pub sensors: IndexMap<String, String>,
}

impl AppConfig {
    pub fn get_log_level(&self) -> LevelFilter {
        match self.logging.level.to_lowercase().as_str() {
            "trace" => LevelFilter::Trace,
            "debug" => LevelFilter::Debug,
            "info" => LevelFilter::Info,
            "warn" => LevelFilter::Warn,
            "error" => LevelFilter::Error,
            "off" => LevelFilter::Off,
            _ => LevelFilter::Info, // Default to Info if invalid
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config_path = path.as_ref();
        debug!("Loading configuration from {}", config_path.display());

        let config = Config::builder()
            .add_source(File::from(config_path).format(config::FileFormat::Ini))
            .build()
            .context(format!("Failed to load config from {}", config_path.display()))?;

        let app_config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize config")?;

        app_config
            .validate()
            .context(format!("Invalid config in {}", config_path.display()))?;

        Ok(app_config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.host.trim().is_empty() {
            return Err(ConfigError::EmptyHost);
        }
        if self.server.port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        if self.polling.interval == 0 {
            return Err(ConfigError::InvalidInterval);
        }
        if self.server.timeout == 0 {
            return Err(ConfigError::InvalidTimeout);
        }
        Ok(())
    }

    /// Looks up the upload destination for a device. Blank entries count as unmapped.
    pub fn destination_for(&self, device_id: &str) -> Option<&str> {
        self.sensors
            .get(device_id)
            .map(|uuid| uuid.trim())
            .filter(|uuid| !uuid.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(content.as_bytes()).unwrap();
        temp_file
    }

    #[test]
    fn test_from_file() {
        let temp_file = write_config(
            "[server]\nhost = vz.local\nport = 8080\npath = /middleware.php/\n\n\
             [polling]\ninterval = 60\n\n\
             [logging]\nlevel = debug\n\n\
             [sensors]\n10-0000031a2f3e = uuid-123\n28-000004b7d1ff = uuid-456\n",
        );

        let config = AppConfig::from_file(temp_file.path()).unwrap();

        assert_eq!(config.server.host, "vz.local");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.path, "middleware.php");
        assert_eq!(config.server.timeout, 10);
        assert!(config.server.user_agent.starts_with("1wirevz/"));
        assert_eq!(config.polling.interval(), Duration::from_secs(60));
        assert_eq!(config.get_log_level(), LevelFilter::Debug);
        assert_eq!(config.bus.discovery, BusDiscovery::I2c);
        assert_eq!(config.bus.i2c_offset, 2);
        assert_eq!(config.bus.fallback_count, 3);

        let ids: Vec<&str> = config.sensors.keys().map(|k| k.as_str()).collect();
        assert_eq!(ids, vec!["10-0000031a2f3e", "28-000004b7d1ff"]);
        assert_eq!(config.destination_for("10-0000031a2f3e"), Some("uuid-123"));
    }

    #[test]
    fn test_sensor_table_keeps_file_order() {
        let mut content = String::from(
            "[server]\nhost = vz.local\nport = 80\npath = vz\n\n[polling]\ninterval = 5\n\n[sensors]\n",
        );
        let ids: Vec<String> = (0..8).map(|n| format!("28-00000000000{}", n)).collect();
        for (n, id) in ids.iter().enumerate() {
            content.push_str(&format!("{} = uuid-{}\n", id, n));
        }
        let temp_file = write_config(&content);

        let config = AppConfig::from_file(temp_file.path()).unwrap();

        let loaded: Vec<&String> = config.sensors.keys().collect();
        assert_eq!(loaded, ids.iter().collect::<Vec<_>>());
        assert_eq!(config.destination_for("28-000000000005"), Some("uuid-5"));
    }

    #[test]
    fn test_bus_section() {
        let temp_file = write_config(
            "[server]\nhost = vz.local\nport = 80\npath = vz\n\n\
             [polling]\ninterval = 5\n\n\
             [bus]\ndiscovery = w1\nfallback_count = 1\nw1_root = /tmp/w1\n",
        );

        let config = AppConfig::from_file(temp_file.path()).unwrap();

        assert_eq!(config.bus.discovery, BusDiscovery::W1);
        assert_eq!(config.bus.fallback_count, 1);
        assert_eq!(config.bus.w1_root, PathBuf::from("/tmp/w1"));
        assert_eq!(config.bus.i2c_root, PathBuf::from("/sys/bus/i2c/devices"));
        assert!(config.sensors.is_empty());
    }

    #[test]
    fn test_missing_server_section_is_fatal() {
        let temp_file = write_config("[polling]\ninterval = 5\n");
        assert!(AppConfig::from_file(temp_file.path()).is_err());
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let temp_file = write_config(
            "[server]\nhost = vz.local\nport = 80\npath = vz\n\n[polling]\ninterval = 0\n",
        );
        let err = AppConfig::from_file(temp_file.path()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::InvalidInterval)
        );
    }

    #[test]
    fn test_zero_port_is_rejected() {
        let temp_file = write_config(
            "[server]\nhost = vz.local\nport = 0\npath = vz\n\n[polling]\ninterval = 5\n",
        );
        let err = AppConfig::from_file(temp_file.path()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::InvalidPort)
        );
    }

    #[test]
    fn test_missing_file() {
        assert!(AppConfig::from_file("/nonexistent/w1vz.ini").is_err());
    }

    #[test]
    fn test_blank_destination_is_unmapped() {
        let temp_file = write_config(
            "[server]\nhost = vz.local\nport = 80\npath = vz\n\n\
             [polling]\ninterval = 5\n\n\
             [sensors]\n10-0000031a2f3e =\n",
        );
        let config = AppConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.destination_for("10-0000031a2f3e"), None);
        assert_eq!(config.destination_for("28-unknown"), None);
    }

    #[test]
    fn test_unknown_log_level_defaults_to_info() {
        let temp_file = write_config(
            "[server]\nhost = vz.local\nport = 80\npath = vz\n\n\
             [polling]\ninterval = 5\n\n[logging]\nlevel = chatty\n",
        );
        let config = AppConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.get_log_level(), LevelFilter::Info);
    }
}

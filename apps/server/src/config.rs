//! # Server Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     DAPUR_PORT=8080                                                    │
//! │     DAPUR_DATABASE_PATH=/var/lib/dapur/dapur.db                        │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     path given on the command line / DAPUR_CONFIG, or                  │
//! │     ~/.config/dapur/server.toml (Linux)                                │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [server]
//! bind_addr = "0.0.0.0"
//! port = 8080
//!
//! [database]
//! path = "/var/lib/dapur/dapur.db"
//! max_connections = 8
//! connect_timeout_secs = 30
//! seed_demo_data = false
//!
//! [hub]
//! subscriber_buffer = 64
//! ping_interval_secs = 30
//!
//! [orders]
//! utc_offset_minutes = 420   # WIB
//! default_order_prefix = "ORD"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use dapur_core::validation::validate_order_prefix;
use dapur_core::DEFAULT_ORDER_PREFIX;
use dapur_db::DbConfig;
use dapur_hub::{HubConfig, DEFAULT_SUBSCRIBER_BUFFER};

use crate::services::OrderSettings;

/// Configuration loading errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerSettings {
    fn default() -> Self {
        ServerSettings {
            bind_addr: default_bind_addr(),
            port: default_port(),
        }
    }
}

impl ServerSettings {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file. Defaults to the platform data directory.
    #[serde(default = "default_database_path")]
    pub path: PathBuf,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Insert the demo outlets and menu on startup.
    #[serde(default)]
    pub seed_demo_data: bool,
}

fn default_database_path() -> PathBuf {
    directories::ProjectDirs::from("id", "dapur", "dapur")
        .map(|dirs| dirs.data_dir().join("dapur.db"))
        .unwrap_or_else(|| PathBuf::from("dapur.db"))
}

fn default_max_connections() -> u32 {
    5
}

fn default_connect_timeout() -> u64 {
    30
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_database_path(),
            max_connections: default_max_connections(),
            connect_timeout_secs: default_connect_timeout(),
            seed_demo_data: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubSettings {
    /// Events queued per subscriber before it is disconnected.
    #[serde(default = "default_subscriber_buffer")]
    pub subscriber_buffer: usize,
    #[serde(default = "default_ping_interval")]
    pub ping_interval_secs: u64,
}

fn default_subscriber_buffer() -> usize {
    DEFAULT_SUBSCRIBER_BUFFER
}

fn default_ping_interval() -> u64 {
    30
}

impl Default for HubSettings {
    fn default() -> Self {
        HubSettings {
            subscriber_buffer: default_subscriber_buffer(),
            ping_interval_secs: default_ping_interval(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSection {
    /// Shift from UTC to outlet local time for the business day.
    #[serde(default = "default_utc_offset")]
    pub utc_offset_minutes: i32,
    /// Prefix for outlets without one.
    #[serde(default = "default_order_prefix")]
    pub default_order_prefix: String,
}

fn default_utc_offset() -> i32 {
    420
}

fn default_order_prefix() -> String {
    DEFAULT_ORDER_PREFIX.to_string()
}

impl Default for OrderSection {
    fn default() -> Self {
        OrderSection {
            utc_offset_minutes: default_utc_offset(),
            default_order_prefix: default_order_prefix(),
        }
    }
}

// =============================================================================
// Server Configuration
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub hub: HubSettings,
    #[serde(default)]
    pub orders: OrderSection,
}

impl ServerConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (server.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = match config_path.or_else(Self::default_config_path) {
            Some(path) if path.exists() => {
                info!(?path, "Loading server config from file");
                let contents = std::fs::read_to_string(&path)?;
                Self::from_toml(&contents)?
            }
            Some(path) => {
                debug!(?path, "Config file not found, using defaults");
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Applies `DAPUR_*` overrides. `lookup` is `std::env::var` outside tests.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("DAPUR_BIND_ADDR") {
            self.server.bind_addr = addr;
        }
        if let Some(port) = lookup("DAPUR_PORT") {
            self.server.port = parse_env("DAPUR_PORT", &port)?;
        }
        if let Some(path) = lookup("DAPUR_DATABASE_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }
        if let Some(buffer) = lookup("DAPUR_SUBSCRIBER_BUFFER") {
            self.hub.subscriber_buffer = parse_env("DAPUR_SUBSCRIBER_BUFFER", &buffer)?;
        }
        if let Some(offset) = lookup("DAPUR_UTC_OFFSET_MINUTES") {
            self.orders.utc_offset_minutes = parse_env("DAPUR_UTC_OFFSET_MINUTES", &offset)?;
        }
        if let Some(prefix) = lookup("DAPUR_DEFAULT_ORDER_PREFIX") {
            self.orders.default_order_prefix = prefix;
        }
        if let Some(seed) = lookup("DAPUR_SEED_DEMO_DATA") {
            match seed.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => self.database.seed_demo_data = true,
                "0" | "false" | "no" => self.database.seed_demo_data = false,
                other => warn!(value = %other, "Ignoring unrecognized DAPUR_SEED_DEMO_DATA"),
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.max_connections == 0 {
            return Err(invalid("database.max_connections", "must be at least 1"));
        }
        if !(-720..=840).contains(&self.orders.utc_offset_minutes) {
            return Err(invalid(
                "orders.utc_offset_minutes",
                "must be between -720 and 840",
            ));
        }
        validate_order_prefix(&self.orders.default_order_prefix)
            .map_err(|e| invalid("orders.default_order_prefix", &e.to_string()))?;
        self.hub_config()
            .validate()
            .map_err(|e| invalid("hub", &e.to_string()))?;
        Ok(())
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database.path)
            .max_connections(self.database.max_connections)
            .connect_timeout(Duration::from_secs(self.database.connect_timeout_secs))
    }

    pub fn hub_config(&self) -> HubConfig {
        HubConfig {
            subscriber_buffer: self.hub.subscriber_buffer,
            ping_interval: Duration::from_secs(self.hub.ping_interval_secs),
        }
    }

    pub fn order_settings(&self) -> OrderSettings {
        OrderSettings {
            utc_offset_minutes: self.orders.utc_offset_minutes,
            // validated above; fall back to the raw value otherwise
            default_prefix: validate_order_prefix(&self.orders.default_order_prefix)
                .unwrap_or_else(|_| self.orders.default_order_prefix.clone()),
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("DAPUR_CONFIG") {
            return Some(PathBuf::from(path));
        }
        directories::ProjectDirs::from("id", "dapur", "dapur")
            .map(|dirs| dirs.config_dir().join("server.toml"))
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| invalid(key, &format!("cannot parse '{}'", value)))
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

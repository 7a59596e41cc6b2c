//! Configuration module
//!
//! Application settings are read from a TOML file
//! (`~/.config/ocpp16-min/config.toml` by default). Every section and
//! field is optional; missing values fall back to the defaults below.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::support::errors::ConfigError;

/// Full application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub charge_point: ChargePointConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
}

/// Central-system listener settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Heartbeat interval advertised in BootNotification responses (seconds)
    pub heartbeat_interval: u32,
    /// Seconds to wait for connection tasks after a shutdown signal
    pub shutdown_timeout: u64,
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 9000,
            heartbeat_interval: 10,
            shutdown_timeout: 5,
        }
    }
}

/// Identity and session values of the simulated charge point
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChargePointConfig {
    pub server_url: String,
    pub charge_point_id: String,
    /// WebSocket subprotocol to request, e.g. `ocpp1.6`. None sends no
    /// `Sec-WebSocket-Protocol` header.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subprotocol: Option<String>,
    pub vendor: String,
    pub model: String,
    pub firmware_version: String,
    pub meter_type: String,
    pub id_tag: String,
    pub connector_id: u32,
    pub meter_start: i64,
    pub meter_stop: i64,
    /// Number of Heartbeats sent during the session
    pub heartbeat_count: u32,
    /// Seconds between StartTransaction and StopTransaction
    pub session_secs: u64,
}

impl ChargePointConfig {
    /// WebSocket URL of this charge point: `<server_url>/<charge_point_id>`
    pub fn endpoint(&self) -> String {
        format!(
            "{}/{}",
            self.server_url.trim_end_matches('/'),
            self.charge_point_id
        )
    }
}

impl Default for ChargePointConfig {
    fn default() -> Self {
        Self {
            server_url: "ws://localhost:9000".to_string(),
            charge_point_id: "CP_1".to_string(),
            subprotocol: None,
            vendor: "RalphCo".to_string(),
            model: "RalphModel1".to_string(),
            firmware_version: "0.1.0".to_string(),
            meter_type: "RalphMeter".to_string(),
            id_tag: "TEST".to_string(),
            connector_id: 1,
            meter_start: 0,
            meter_stop: 42,
            heartbeat_count: 3,
            session_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    pub level: String,
    /// `text` or `json`
    pub format: String,
    pub service_name: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
            service_name: "ocpp16-min".to_string(),
        }
    }
}

/// Prometheus exporter settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub listen: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen: "0.0.0.0:9100".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Apply `APP_HOST`, `APP_PORT` and `OTEL_SERVICE_NAME` from the process
    /// environment. Host and port also redirect the charge point's
    /// `server_url`.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("APP_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("APP_PORT") {
            self.server.port = port.parse().map_err(|_| ConfigError::InvalidEnv {
                key: "APP_PORT",
                value: port,
            })?;
        }
        if lookup("APP_HOST").is_some() || lookup("APP_PORT").is_some() {
            self.charge_point.server_url =
                format!("ws://{}:{}", self.server.host, self.server.port);
        }
        if let Some(name) = lookup("OTEL_SERVICE_NAME") {
            self.logging.service_name = name;
        }
        Ok(())
    }
}

/// Default config location: `<config_dir>/ocpp16-min/config.toml`
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ocpp16-min")
        .join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.address(), "localhost:9000");
        assert_eq!(config.server.heartbeat_interval, 10);
        assert_eq!(config.charge_point.endpoint(), "ws://localhost:9000/CP_1");
        assert_eq!(config.charge_point.heartbeat_count, 3);
        assert_eq!(config.charge_point.subprotocol, None);
        assert!(!config.metrics.enabled);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [server]
            port = 9100
            heartbeat_interval = 30

            [charge_point]
            charge_point_id = "CP_9"
            server_url = "ws://central:9100/"
            subprotocol = "ocpp1.6"
            meter_start = 3000000000

            [logging]
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.address(), "localhost:9100");
        assert_eq!(config.server.heartbeat_interval, 30);
        assert_eq!(config.charge_point.endpoint(), "ws://central:9100/CP_9");
        assert_eq!(config.charge_point.subprotocol.as_deref(), Some("ocpp1.6"));
        assert_eq!(config.charge_point.meter_start, 3_000_000_000);
        assert_eq!(config.charge_point.vendor, "RalphCo");
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn invalid_toml_is_parse_error() {
        assert!(matches!(
            AppConfig::from_toml("[server]\nport = \"high\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            AppConfig::load("/nonexistent/ocpp16-min/config.toml"),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn env_overrides() {
        let env: HashMap<&str, &str> = [
            ("APP_HOST", "0.0.0.0"),
            ("APP_PORT", "9500"),
            ("OTEL_SERVICE_NAME", "csms-test"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config
            .apply_overrides_from(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.server.address(), "0.0.0.0:9500");
        assert_eq!(config.charge_point.endpoint(), "ws://0.0.0.0:9500/CP_1");
        assert_eq!(config.logging.service_name, "csms-test");
    }

    #[test]
    fn bad_port_override() {
        let mut config = AppConfig::default();
        let err = config
            .apply_overrides_from(|key| (key == "APP_PORT").then(|| "ninety".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { key: "APP_PORT", .. }));
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn default_path_ends_with_app_dir() {
        assert!(default_config_path().ends_with("ocpp16-min/config.toml"));
    }
}

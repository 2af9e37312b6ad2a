//! Environment-sourced runtime configuration.

use std::env;
use std::net::SocketAddr;

use thiserror::Error;

/// Namespace watched when `TEAM_NAMESPACE` is unset.
pub const DEFAULT_NAMESPACE: &str = "jx";
/// Log level used when `LOG_LEVEL` is unset.
pub const DEFAULT_LOG_LEVEL: &str = "info";
/// Port the health endpoints bind to when `HTTP_PORT` is unset.
pub const DEFAULT_HTTP_PORT: u16 = 8080;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {name} is set but empty")]
    Empty { name: &'static str },
    #[error("environment variable {name} has invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Runtime settings for the server binary.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Namespace whose activities are reconciled.
    pub namespace: String,
    /// Level passed to the tracing filter.
    pub log_level: String,
    /// Port for the HTTP health endpoints.
    pub http_port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            http_port: DEFAULT_HTTP_PORT,
        }
    }
}

impl AppConfig {
    /// Loads configuration from the process environment.
    ///
    /// Unset variables fall back to defaults; set-but-empty or
    /// unparsable values are rejected rather than silently defaulted.
    pub fn from_env() -> Result<Self, ConfigError> {
        let namespace = non_empty_var("TEAM_NAMESPACE")?.unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());
        let log_level = non_empty_var("LOG_LEVEL")?.unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

        let http_port = match non_empty_var("HTTP_PORT")? {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::Invalid {
                name: "HTTP_PORT",
                value: raw,
                reason: e.to_string(),
            })?,
            None => DEFAULT_HTTP_PORT,
        };

        Ok(Self {
            namespace,
            log_level,
            http_port,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.http_port))
    }
}

fn non_empty_var(name: &'static str) -> Result<Option<String>, ConfigError> {
    match env::var(name) {
        Ok(value) if value.trim().is_empty() => Err(ConfigError::Empty { name }),
        Ok(value) => Ok(Some(value)),
        Err(_) => Ok(None),
    }
}

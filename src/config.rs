//! Process configuration.
//!
//! Only the database connection string and the log format come from the
//! environment; the listen address and the trace collector are fixed.

use std::str::FromStr;

/// Address the HTTP server binds to.
pub const LISTEN_ADDR: &str = "0.0.0.0:3000";

/// OTLP/HTTP endpoint that receives exported spans.
pub const OTLP_TRACES_ENDPOINT: &str = "http://tempo.monitoring.svc.cluster.local:4318/v1/traces";

/// Name of the tracer every span is created with.
pub const TRACER_NAME: &str = "demo-app";

/// `service.name` resource attribute and the `app` label on every metric.
pub const SERVICE_NAME: &str = "monitoring-demo";

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "pg_monitoring_demo=info,tower_http=info";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("DATABASE_URL must be set")]
    MissingDatabaseUrl,

    #[error("unsupported LOG_FORMAT {0:?} (expected \"pretty\" or \"json\")")]
    InvalidLogFormat(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(ConfigError::InvalidLogFormat(s.to_owned())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Full Postgres connection string, handed to the driver unchanged.
    pub database_url: String,
    pub log_format: LogFormat,
}

impl Config {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::MissingDatabaseUrl)?;

        let log_format = match lookup("LOG_FORMAT") {
            Some(raw) => raw.parse()?,
            None => LogFormat::default(),
        };

        Ok(Self {
            database_url,
            log_format,
        })
    }
}

//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Billing rules.
    #[serde(default)]
    pub billing: BillingConfig,
    /// Log output format.
    #[serde(default)]
    pub log_format: LogFormat,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Billing configuration.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct BillingConfig {
    /// Days added to the bill date when a bill is created without a due date.
    #[serde(default = "default_grace_days")]
    pub default_grace_days: u32,
    /// Upper bound on any row-lock wait, in milliseconds.
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            default_grace_days: default_grace_days(),
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

fn default_grace_days() -> u32 {
    30
}

fn default_lock_timeout_ms() -> u64 {
    3000
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("FLEETBILL")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_applies_defaults() {
        temp_env::with_vars(
            [
                ("FLEETBILL__DATABASE__URL", Some("postgres://localhost/fleetbill")),
                ("FLEETBILL__BILLING__DEFAULT_GRACE_DAYS", None),
                ("FLEETBILL__LOG_FORMAT", None),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.database.url, "postgres://localhost/fleetbill");
                assert_eq!(config.database.max_connections, 10);
                assert_eq!(config.server.port, 8080);
                assert_eq!(config.billing.default_grace_days, 30);
                assert_eq!(config.billing.lock_timeout_ms, 3000);
                assert_eq!(config.log_format, LogFormat::Pretty);
            },
        );
    }

    #[test]
    fn test_load_reads_billing_overrides() {
        temp_env::with_vars(
            [
                ("FLEETBILL__DATABASE__URL", Some("postgres://localhost/fleetbill")),
                ("FLEETBILL__BILLING__DEFAULT_GRACE_DAYS", Some("45")),
                ("FLEETBILL__LOG_FORMAT", Some("json")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.billing.default_grace_days, 45);
                assert_eq!(config.log_format, LogFormat::Json);
            },
        );
    }

    #[test]
    fn test_load_requires_database_url() {
        temp_env::with_vars([("FLEETBILL__DATABASE__URL", None::<&str>)], || {
            assert!(AppConfig::load().is_err());
        });
    }
}

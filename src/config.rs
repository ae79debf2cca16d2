//! Server configuration
//!
//! Configuration is layered: built-in defaults, then `.env`, then
//! `TELEMED__`-prefixed environment variables (double underscore as the
//! section separator, e.g. `TELEMED__SERVER__PORT=8080`).

use std::fmt;
use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

/// Deployment mode, read once at startup and immutable afterwards.
///
/// The only behavior it gates in this crate is diagnostic disclosure:
/// raw error detail (`error.stack`) is sent to clients in development
/// and nowhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl Environment {
    pub fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }

    /// Whether error envelopes may carry raw diagnostic detail.
    pub fn expose_diagnostics(self) -> bool {
        matches!(self, Self::Development)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Development => "development",
            Self::Test => "test",
            Self::Production => "production",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub environment: Environment,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origins allowed by CORS. Empty means no permissive CORS headers.
    pub cors_origins: Vec<String>,
    /// Maximum accepted request body size in bytes.
    pub max_request_body_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default level for the crate's own targets (`RUST_LOG` overrides).
    pub level: String,
    /// Emit JSON log lines instead of the human-readable format.
    pub json: bool,
    pub file_enabled: bool,
    pub file_directory: String,
    pub file_prefix: String,
    /// One of `daily`, `hourly`, `minutely`, `never`.
    pub file_rotation: String,
    pub service_name: String,
}

impl Config {
    /// Load configuration from defaults, `.env`, and the environment.
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let settings = config::Config::builder()
            .set_default("environment", "development")?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 5000)?
            .set_default("server.cors_origins", Vec::<String>::new())?
            .set_default("server.max_request_body_size", 2 * 1024 * 1024)?
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            .set_default("logging.file_enabled", false)?
            .set_default("logging.file_directory", "logs")?
            .set_default("logging.file_prefix", "telemed")?
            .set_default("logging.file_rotation", "daily")?
            .set_default("logging.service_name", "telemed-server")?
            .add_source(
                config::Environment::with_prefix("TELEMED")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("server.cors_origins"),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Validate values the type system cannot.
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("server.port must be non-zero".into());
        }
        if self.server.max_request_body_size == 0 {
            return Err("server.max_request_body_size must be non-zero".into());
        }
        match self.logging.file_rotation.as_str() {
            "daily" | "hourly" | "minutely" | "never" => {}
            other => {
                return Err(format!(
                    "logging.file_rotation must be daily, hourly, minutely or never (got {other})"
                ));
            }
        }
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(format!(
                    "logging.level must be trace, debug, info, warn or error (got {other})"
                ));
            }
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        use std::net::ToSocketAddrs;

        let addr = format!("{}:{}", self.server.host, self.server.port);
        addr.to_socket_addrs()?
            .next()
            .ok_or_else(|| anyhow::anyhow!("no socket address resolved for {addr}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            environment: Environment::Test,
            server: ServerConfig {
                host: "127.0.0.1".into(),
                port: 5000,
                cors_origins: vec![],
                max_request_body_size: 2 * 1024 * 1024,
            },
            logging: LoggingConfig {
                level: "info".into(),
                json: false,
                file_enabled: false,
                file_directory: "logs".into(),
                file_prefix: "telemed".into(),
                file_rotation: "daily".into(),
                service_name: "telemed-server".into(),
            },
        }
    }

    #[test]
    fn environment_parses_from_lowercase_strings() {
        let env: Environment = serde_json::from_str("\"production\"").unwrap();
        assert_eq!(env, Environment::Production);
        let env: Environment = serde_json::from_str("\"development\"").unwrap();
        assert_eq!(env, Environment::Development);
        assert!(serde_json::from_str::<Environment>("\"staging\"").is_err());
    }

    #[test]
    fn diagnostics_exposed_only_in_development() {
        assert!(Environment::Development.expose_diagnostics());
        assert!(!Environment::Test.expose_diagnostics());
        assert!(!Environment::Production.expose_diagnostics());
    }

    #[test]
    fn validate_accepts_defaults() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn validate_rejects_unknown_rotation() {
        let mut config = base_config();
        config.logging.file_rotation = "weekly".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_body_limit() {
        let mut config = base_config();
        config.server.max_request_body_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn socket_addr_resolves() {
        let addr = base_config().socket_addr().unwrap();
        assert_eq!(addr.port(), 5000);
    }
}

//! Gateway configuration: a thin, `config`-crate-layered file/env merge over
//! the settings this binary actually needs - the bind address, logging, and
//! the two sub-configs (`liquidity_store::StoreConfig`,
//! `liquidity_auth::AuthConfig`) owned by the crates that use them.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub shutdown_timeout_secs: u64,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        format!("{}:{}", self.host, self.port)
            .parse()
            .expect("invalid host/port configuration")
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            shutdown_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub postgres_url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            postgres_url: "postgresql://localhost/liquidity".to_string(),
            max_connections: 20,
            min_connections: 2,
            connect_timeout_secs: 10,
        }
    }
}

impl From<&DatabaseConfig> for liquidity_store::StoreConfig {
    fn from(config: &DatabaseConfig) -> Self {
        liquidity_store::StoreConfig {
            postgres_url: config.postgres_url.clone(),
            pg_max_connections: config.max_connections,
            pg_min_connections: config.min_connections,
            pg_acquire_timeout_secs: config.connect_timeout_secs,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSettings {
    pub clock_skew_secs: u64,
    pub max_token_lifetime_secs: u64,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            clock_skew_secs: 30,
            max_token_lifetime_secs: 60 * 60,
        }
    }
}

impl From<&AuthSettings> for liquidity_auth::AuthConfig {
    fn from(settings: &AuthSettings) -> Self {
        liquidity_auth::AuthConfig {
            clock_skew: Duration::from_secs(settings.clock_skew_secs),
            max_token_lifetime: Duration::from_secs(settings.max_token_lifetime_secs),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthSettings,
}

impl GatewayConfig {
    /// Layer an optional config file (TOML/JSON/YAML, by extension) over
    /// built-in defaults, then over `LIQUIDITY__*`-prefixed environment
    /// variables - the same three-tier precedence the teacher's gateway used.
    pub fn load(config_path: Option<&str>) -> anyhow::Result<Self> {
        let mut builder = config::Config::builder()
            .add_source(config::Config::try_from(&GatewayConfig::default())?);

        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("LIQUIDITY")
                .separator("__")
                .try_parsing(true),
        );

        Ok(builder.build()?.try_deserialize()?)
    }
}

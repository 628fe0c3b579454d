use std::env;
use std::net::SocketAddr;

use anyhow::Context;

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_REPORTING_BASE_URL: &str = "http://localhost:3001/api";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub bind: String,
    pub port: u16,
    pub max_connections: u32,
    pub reporting_base_url: String,
}

impl Config {
    /// Reads the process environment, after loading `.env` if one exists.
    pub fn from_env() -> anyhow::Result<Self> {
        let _ = dotenvy::dotenv();

        let port = match env::var("PORT") {
            Ok(value) => value.parse().with_context(|| format!("invalid PORT {value:?}"))?,
            Err(_) => DEFAULT_PORT,
        };
        let max_connections = match env::var("DATABASE_MAX_CONNECTIONS") {
            Ok(value) => value
                .parse()
                .with_context(|| format!("invalid DATABASE_MAX_CONNECTIONS {value:?}"))?,
            Err(_) => DEFAULT_MAX_CONNECTIONS,
        };

        Ok(Self {
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
            bind: env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND.to_string()),
            port,
            max_connections,
            reporting_base_url: env::var("REPORTING_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_REPORTING_BASE_URL.to_string()),
        })
    }

    pub fn database_url(&self) -> anyhow::Result<&str> {
        self.database_url
            .as_deref()
            .context("DATABASE_URL must be set to a Postgres instance")
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.bind, self.port)
            .parse()
            .with_context(|| format!("invalid bind address {}:{}", self.bind, self.port))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            bind: DEFAULT_BIND.to_string(),
            port: DEFAULT_PORT,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            reporting_base_url: DEFAULT_REPORTING_BASE_URL.to_string(),
        }
    }
}

//! API server configuration.

use std::net::SocketAddr;

use culina_core::{defaults, Error, Result};

/// Server configuration, read from the environment at startup.
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | `DATABASE_URL` | (required) | Postgres connection string |
/// | `CULINA_ADMIN_TOKEN` | (required) | Bearer token for operator routes |
/// | `CULINA_HOST` | `0.0.0.0` | Bind host |
/// | `CULINA_PORT` | `3000` | Bind port |
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub database_url: String,
    pub admin_token: String,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| Error::Config("DATABASE_URL not set".into()))?;

        let admin_token = std::env::var("CULINA_ADMIN_TOKEN")
            .map_err(|_| Error::Config("CULINA_ADMIN_TOKEN not set".into()))?;
        if admin_token.trim().is_empty() {
            return Err(Error::Config("CULINA_ADMIN_TOKEN must not be empty".into()));
        }

        let host = std::env::var("CULINA_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = std::env::var("CULINA_PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(defaults::SERVER_PORT);

        let bind_addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .map_err(|e| Error::Config(format!("invalid bind address: {}", e)))?;

        Ok(Self {
            bind_addr,
            database_url,
            admin_token,
        })
    }
}

use anyhow::{Context, Result, bail};

use crate::constants::*;

/// Runtime configuration read from the environment (and `.env`, if present).
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub data_path: String,
    pub frontend_origin: String,
    pub log_filter: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let host = env_or("HOST", DEFAULT_HOST);
        if host.trim().is_empty() {
            bail!("HOST cannot be empty");
        }

        let port_raw = env_or("PORT", DEFAULT_PORT);
        let port = port_raw
            .trim()
            .parse::<u16>()
            .with_context(|| format!("PORT must be a valid port number, got '{}'", port_raw))?;

        let data_path = env_or("DATA_PATH", DEFAULT_DATA_PATH);
        if data_path.trim().is_empty() {
            bail!("DATA_PATH cannot be empty");
        }

        Ok(Self {
            host,
            port,
            data_path,
            frontend_origin: env_or("FRONTEND_ORIGIN", DEFAULT_FRONTEND_ORIGIN),
            log_filter: env_or("RUST_LOG", DEFAULT_LOG_FILTER),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

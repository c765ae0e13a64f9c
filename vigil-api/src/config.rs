//! API server configuration

use crate::error::{ApiError, ApiResult};
use std::net::SocketAddr;

/// HTTP server settings, environment-driven.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_host: String,
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind_host: std::env::var("VIGIL_API_BIND").unwrap_or(defaults.bind_host),
            port: std::env::var("PORT")
                .ok()
                .or_else(|| std::env::var("VIGIL_API_PORT").ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
        }
    }

    pub fn bind_addr(&self) -> ApiResult<SocketAddr> {
        let addr = format!("{}:{}", self.bind_host, self.port);
        addr.parse::<SocketAddr>()
            .map_err(|e| ApiError::invalid_input(format!("Invalid bind address {}: {}", addr, e)))
    }
}

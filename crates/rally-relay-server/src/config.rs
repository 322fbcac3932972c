//! Server configuration
//!
//! Flags double as environment variables; a `.env` file is loaded first so
//! it can supply them.

use clap::Parser;
use std::net::{IpAddr, SocketAddr};

/// Rally Relay server
#[derive(Debug, Clone, Parser)]
#[command(name = "rally-relay", version, about)]
pub struct ServerConfig {
    /// Address to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 8001)]
    pub port: u16,

    /// Store connection URL (postgres://... or sqlite://...)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    /// Database name, applied to Postgres URLs
    #[arg(long, env = "DB_NAME")]
    pub db_name: Option<String>,

    /// Store pool size
    #[arg(long, env = "DB_MAX_CONNECTIONS", default_value_t = 5)]
    pub db_max_connections: u32,

    /// Comma-separated allowed CORS origins
    #[arg(long, env = "CORS_ORIGINS", default_value = "*")]
    pub cors_origins: String,

    /// Log filter directive
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON
    #[arg(long, env = "LOG_JSON", default_value_t = false)]
    pub log_json: bool,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

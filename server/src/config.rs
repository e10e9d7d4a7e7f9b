//! Server configuration

use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

use crate::db::MAX_PRESENCE_TTL_SECS;

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Database URL (`postgres://…` or `sqlite:…`)
    pub database_url: String,
    /// Maximum pooled database connections
    pub db_max_connections: u32,
    /// How long a request may wait for a pooled connection
    pub db_acquire_timeout_ms: u64,
    /// HS256 secret shared with the identity provider
    pub jwt_secret: String,
    /// Root of the avatar image tree
    pub avatars_dir: PathBuf,
    /// URL prefix the avatar tree is served under
    pub avatars_url_prefix: String,
    /// Comma-separated list of allowed CORS origins (empty = permissive)
    pub cors_origins: Option<String>,
    /// Budget for the heartbeat write before it is skipped with 202
    pub heartbeat_timeout_ms: u64,
    /// Heartbeat age after which the sweeper marks a user offline
    pub presence_ttl_seconds: i64,
    /// Sweeper period
    pub presence_sweep_seconds: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = ServerConfig {
            host: env::var("WF_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("WF_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("Invalid WF_PORT")?,
            database_url: env::var("WF_DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://./data/wayfarer.db".to_string()),
            db_max_connections: env::var("WF_DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("Invalid WF_DB_MAX_CONNECTIONS")?,
            db_acquire_timeout_ms: env::var("WF_DB_ACQUIRE_TIMEOUT_MS")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("Invalid WF_DB_ACQUIRE_TIMEOUT_MS")?,
            jwt_secret: env::var("WF_JWT_SECRET").context("WF_JWT_SECRET must be set")?,
            avatars_dir: env::var("WF_AVATARS_DIR")
                .unwrap_or_else(|_| "./public/avatars".to_string())
                .into(),
            avatars_url_prefix: normalize_prefix(
                &env::var("WF_AVATARS_URL_PREFIX").unwrap_or_else(|_| "/avatars".to_string()),
            ),
            cors_origins: env::var("WF_CORS_ORIGINS").ok(),
            heartbeat_timeout_ms: env::var("WF_HEARTBEAT_TIMEOUT_MS")
                .unwrap_or_else(|_| "2000".to_string())
                .parse()
                .context("Invalid WF_HEARTBEAT_TIMEOUT_MS")?,
            presence_ttl_seconds: env::var("WF_PRESENCE_TTL_SECS")
                .unwrap_or_else(|_| "120".to_string())
                .parse()
                .context("Invalid WF_PRESENCE_TTL_SECS")?,
            presence_sweep_seconds: env::var("WF_PRESENCE_SWEEP_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .context("Invalid WF_PRESENCE_SWEEP_SECS")?,
        };

        if config.jwt_secret.len() < 16 {
            anyhow::bail!("WF_JWT_SECRET is too short (need at least 16 bytes)");
        }
        if !(1..=MAX_PRESENCE_TTL_SECS).contains(&config.presence_ttl_seconds) {
            anyhow::bail!(
                "WF_PRESENCE_TTL_SECS must be between 1 and {} (got {})",
                MAX_PRESENCE_TTL_SECS,
                config.presence_ttl_seconds
            );
        }
        if config.presence_sweep_seconds == 0 {
            anyhow::bail!("WF_PRESENCE_SWEEP_SECS must be at least 1");
        }

        Ok(config)
    }

    /// Configuration suitable for tests and local tooling.
    pub fn for_tests(database_url: &str, jwt_secret: &str) -> Self {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            database_url: database_url.to_string(),
            db_max_connections: 1,
            db_acquire_timeout_ms: 3000,
            jwt_secret: jwt_secret.to_string(),
            avatars_dir: PathBuf::from("./public/avatars"),
            avatars_url_prefix: "/avatars".to_string(),
            cors_origins: None,
            heartbeat_timeout_ms: 2000,
            presence_ttl_seconds: 120,
            presence_sweep_seconds: 60,
        }
    }
}

/// `avatars/` and `/avatars/` both become `/avatars`.
fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::normalize_prefix;

    #[test]
    fn prefix_is_normalized() {
        assert_eq!(normalize_prefix("avatars"), "/avatars");
        assert_eq!(normalize_prefix("/static/avatars/"), "/static/avatars");
        assert_eq!(normalize_prefix("/"), "/");
    }
}

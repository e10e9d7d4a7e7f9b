//! Server configuration tests
//!
//! Environment variables are process-global, so everything that touches
//! them lives in a single test.

use std::env;

use wayfarer_server::config::ServerConfig;

const VARS: &[&str] = &[
    "WF_HOST",
    "WF_PORT",
    "WF_DATABASE_URL",
    "WF_JWT_SECRET",
    "WF_AVATARS_URL_PREFIX",
    "WF_CORS_ORIGINS",
    "WF_PRESENCE_SWEEP_SECS",
    "WF_PRESENCE_TTL_SECS",
];

fn clear() {
    for var in VARS {
        env::remove_var(var);
    }
}

#[test]
fn test_config_from_env() {
    clear();

    // The secret is mandatory
    assert!(ServerConfig::from_env().is_err());

    env::set_var("WF_JWT_SECRET", "short");
    assert!(ServerConfig::from_env().is_err());

    env::set_var("WF_JWT_SECRET", "a-long-enough-test-secret");
    let config = ServerConfig::from_env().unwrap();
    assert_eq!(config.host, "0.0.0.0");
    assert_eq!(config.port, 8080);
    assert_eq!(config.database_url, "sqlite://./data/wayfarer.db");
    assert_eq!(config.avatars_url_prefix, "/avatars");
    assert_eq!(config.heartbeat_timeout_ms, 2000);
    assert_eq!(config.presence_ttl_seconds, 120);
    assert!(config.cors_origins.is_none());

    env::set_var("WF_PORT", "9443");
    env::set_var("WF_AVATARS_URL_PREFIX", "static/avatars/");
    env::set_var("WF_DATABASE_URL", "postgres://localhost/wayfarer");
    let config = ServerConfig::from_env().unwrap();
    assert_eq!(config.port, 9443);
    assert_eq!(config.avatars_url_prefix, "/static/avatars");
    assert_eq!(config.database_url, "postgres://localhost/wayfarer");

    env::set_var("WF_PORT", "not_a_port");
    assert!(ServerConfig::from_env().is_err());
    env::set_var("WF_PORT", "9443");

    env::set_var("WF_PRESENCE_SWEEP_SECS", "0");
    assert!(ServerConfig::from_env().is_err());
    env::remove_var("WF_PRESENCE_SWEEP_SECS");

    // Presence TTL must be positive and bounded
    for bad in ["0", "-5", "9223372036854775807"] {
        env::set_var("WF_PRESENCE_TTL_SECS", bad);
        assert!(ServerConfig::from_env().is_err(), "accepted ttl {}", bad);
    }
    env::set_var("WF_PRESENCE_TTL_SECS", "300");
    assert_eq!(ServerConfig::from_env().unwrap().presence_ttl_seconds, 300);

    clear();
}

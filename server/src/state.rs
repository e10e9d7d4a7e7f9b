//! Shared application state

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::db::DatabaseBackend;

/// Server state shared across requests
pub struct ServerState {
    pub db: Arc<dyn DatabaseBackend>,
    pub config: ServerConfig,
}

impl ServerState {
    pub fn new(db: Arc<dyn DatabaseBackend>, config: ServerConfig) -> Self {
        Self { db, config }
    }
}

pub type SharedState = Arc<ServerState>;

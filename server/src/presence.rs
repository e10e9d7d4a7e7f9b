//! Presence sweeper
//!
//! Clients heartbeat while a tab is open. A tab that dies without calling
//! `/api/user/offline` would stay online forever, so a background task
//! flips users whose last heartbeat is older than the TTL.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::db::DatabaseBackend;

/// Run one sweep, logging the outcome. Returns the number of users flipped.
pub async fn sweep_once(db: &dyn DatabaseBackend, ttl_seconds: i64) -> u64 {
    match db.mark_stale_offline(ttl_seconds).await {
        Ok(0) => {
            debug!("Presence sweep: nothing stale");
            0
        }
        Ok(n) => {
            info!("Presence sweep: marked {} stale users offline", n);
            n
        }
        Err(e) => {
            warn!("Presence sweep error: {}", e);
            0
        }
    }
}

/// Spawn the periodic sweeper.
pub fn spawn_sweeper(db: Arc<dyn DatabaseBackend>, ttl_seconds: i64, period: Duration) -> JoinHandle<()> {
    info!("Presence sweeper started (ttl={}s, period={:?})", ttl_seconds, period);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            sweep_once(db.as_ref(), ttl_seconds).await;
        }
    })
}

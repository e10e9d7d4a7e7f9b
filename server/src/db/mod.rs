//! Database abstraction layer
//!
//! Defines the `DatabaseBackend` trait that abstracts all database operations.
//! Production runs on PostgreSQL; local development and the test suite use
//! SQLite. Backends implement the single-statement primitives, while the
//! multi-step operations (profile creation, invite transitions) live here as
//! provided methods so both dialects share the same rules.

pub mod postgres;
pub(crate) mod rows;
pub mod sqlite;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use wayfarer_shared::{
    generate_public_id, AddFriendLog, City, CityQuery, FriendInvite, GroupInvite, InviteAction,
    InviteDirection, InviteRole, InviteStatus, Profile, ProfileQuery, ProfileUpdate,
};

use crate::config::ServerConfig;

pub use postgres::PostgresBackend;
pub use sqlite::SqliteBackend;

/// Attempts at drawing an unused public id before giving up.
const PUBLIC_ID_ATTEMPTS: usize = 5;

/// Errors surfaced by the data layer
#[derive(Error, Debug)]
pub enum StoreError {
    /// The addressed row does not exist
    #[error("{0}")]
    NotFound(&'static str),

    /// The acting user is not a party to the row
    #[error("Forbidden")]
    Forbidden,

    /// The write conflicts with existing state
    #[error("{0}")]
    Conflict(String),

    /// The request itself is invalid for this row
    #[error("{0}")]
    Invalid(String),

    /// A stored value could not be mapped back to a domain type
    #[error("Corrupt row: {0}")]
    CorruptRow(String),

    /// Underlying driver error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// Connection-pool or socket timeouts; the heartbeat treats these as soft.
    pub fn is_timeout(&self) -> bool {
        match self {
            StoreError::Database(sqlx::Error::PoolTimedOut) => true,
            StoreError::Database(sqlx::Error::Io(e)) => e.kind() == std::io::ErrorKind::TimedOut,
            _ => false,
        }
    }

    /// Unique constraint violated by an insert or update
    pub fn is_unique_violation(&self) -> bool {
        match self {
            StoreError::Database(sqlx::Error::Database(e)) => e.is_unique_violation(),
            _ => false,
        }
    }
}

/// Result type alias for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// One index as reported by the catalog
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct IndexInfo {
    pub table: String,
    pub name: String,
    pub definition: Option<String>,
}

/// One table constraint as reported by the catalog
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ConstraintInfo {
    pub name: String,
    pub kind: String,
    pub detail: Option<String>,
}

/// Abstraction over database operations for both PostgreSQL and SQLite backends.
#[async_trait]
pub trait DatabaseBackend: Send + Sync + 'static {
    // ── Initialization ───────────────────────────────────────────────────
    async fn run_migrations(&self) -> StoreResult<()>;
    async fn ping(&self) -> StoreResult<()>;
    /// Flush and close the pool on shutdown.
    async fn close(&self);

    // ── Profiles ─────────────────────────────────────────────────────────
    async fn get_profile(&self, user_id: Uuid) -> StoreResult<Option<Profile>>;
    async fn get_profile_by_public_id(&self, public_id: &str) -> StoreResult<Option<Profile>>;

    /// Insert a fresh profile. Returns `None` when a profile with this id
    /// already exists; a public-id collision surfaces as a unique violation.
    async fn insert_profile(&self, user_id: Uuid, public_id: &str) -> StoreResult<Option<Profile>>;

    async fn update_profile(&self, user_id: Uuid, update: &ProfileUpdate) -> StoreResult<Profile>;

    /// Flip the presence flag and stamp `last_seen_at`.
    async fn set_online_status(&self, user_id: Uuid, online: bool) -> StoreResult<()>;

    /// Mark users whose last heartbeat is older than `ttl_seconds` offline.
    async fn mark_stale_offline(&self, ttl_seconds: i64) -> StoreResult<u64>;

    // ── Search ───────────────────────────────────────────────────────────
    async fn search_profiles(
        &self, query: &ProfileQuery, exclude: Option<Uuid>, limit: i64,
    ) -> StoreResult<Vec<Profile>>;

    async fn search_cities(&self, query: &CityQuery) -> StoreResult<Vec<City>>;
    async fn upsert_city(&self, city: &City) -> StoreResult<()>;

    async fn log_add_friend_query(&self, user_id: Uuid, query: &str) -> StoreResult<()>;
    async fn list_add_friend_logs(&self, user_id: Uuid, limit: i64) -> StoreResult<Vec<AddFriendLog>>;

    // ── Friend invites ───────────────────────────────────────────────────
    async fn get_friend_invite(&self, id: Uuid) -> StoreResult<Option<FriendInvite>>;

    /// Pending or accepted invite between two users, in either direction.
    async fn find_open_invite_between(&self, a: Uuid, b: Uuid) -> StoreResult<Option<FriendInvite>>;

    async fn insert_friend_invite(&self, invite: &FriendInvite) -> StoreResult<()>;

    async fn list_friend_invites(
        &self, user_id: Uuid, direction: InviteDirection, status: Option<InviteStatus>,
    ) -> StoreResult<Vec<FriendInvite>>;

    /// Move a pending invite to `to` in one conditional write. Only matches
    /// when `actor` sits in the `role` column and the invite is still pending.
    async fn transition_friend_invite(
        &self, id: Uuid, actor: Uuid, role: InviteRole, to: InviteStatus,
    ) -> StoreResult<Option<FriendInvite>>;

    async fn list_friends(&self, user_id: Uuid) -> StoreResult<Vec<Profile>>;

    // ── Group invites ────────────────────────────────────────────────────
    async fn insert_group_invite(&self, invite: &GroupInvite) -> StoreResult<()>;
    async fn get_group_invite(&self, id: Uuid) -> StoreResult<Option<GroupInvite>>;
    async fn list_group_invites(&self, to_user_id: Uuid) -> StoreResult<Vec<GroupInvite>>;

    /// Delete the invite if `to_user_id` matches. Returns rows removed.
    async fn delete_group_invite_for(&self, id: Uuid, to_user_id: Uuid) -> StoreResult<u64>;

    // ── Maintenance ──────────────────────────────────────────────────────
    async fn list_indexes(&self, table: Option<&str>) -> StoreResult<Vec<IndexInfo>>;
    async fn list_constraints(&self, table: &str) -> StoreResult<Vec<ConstraintInfo>>;

    // ── Provided operations ──────────────────────────────────────────────

    /// Return the user's profile, creating it with a new public id on first use.
    async fn ensure_profile(&self, user_id: Uuid) -> StoreResult<Profile> {
        if let Some(profile) = self.get_profile(user_id).await? {
            return Ok(profile);
        }

        for attempt in 1..=PUBLIC_ID_ATTEMPTS {
            let public_id = generate_public_id();
            match self.insert_profile(user_id, &public_id).await {
                Ok(Some(profile)) => {
                    info!("Created profile {} (public id {})", user_id, profile.public_id);
                    return Ok(profile);
                }
                // Lost a race with a concurrent login for the same user
                Ok(None) => {
                    return self
                        .get_profile(user_id)
                        .await?
                        .ok_or(StoreError::NotFound("Profile not found"));
                }
                Err(e) if e.is_unique_violation() => {
                    warn!("Public id collision on attempt {} for {}", attempt, user_id);
                }
                Err(e) => return Err(e),
            }
        }

        Err(StoreError::Conflict("Could not allocate a public id".to_string()))
    }

    /// Send a friend invite from `sender` to `recipient`.
    async fn create_friend_invite(&self, sender: Uuid, recipient: Uuid) -> StoreResult<FriendInvite> {
        if sender == recipient {
            return Err(StoreError::Invalid("Cannot invite yourself".to_string()));
        }
        self.ensure_profile(sender).await?;
        if self.get_profile(recipient).await?.is_none() {
            return Err(StoreError::NotFound("Profile not found"));
        }
        if let Some(existing) = self.find_open_invite_between(sender, recipient).await? {
            return Err(open_invite_conflict(&existing));
        }

        let invite = FriendInvite {
            id: Uuid::new_v4(),
            sender_id: sender,
            recipient_id: recipient,
            status: InviteStatus::Pending,
            created_at: chrono::Utc::now(),
            responded_at: None,
        };

        match self.insert_friend_invite(&invite).await {
            Ok(()) => Ok(invite),
            // The pair index caught a concurrent invite
            Err(e) if e.is_unique_violation() => {
                Err(StoreError::Conflict("Invite already pending".to_string()))
            }
            Err(e) => Err(e),
        }
    }

    /// Accept, cancel or reject a friend invite on behalf of `actor`.
    async fn respond_friend_invite(
        &self, id: Uuid, actor: Uuid, action: InviteAction,
    ) -> StoreResult<FriendInvite> {
        let role = action.actor_role();
        if let Some(invite) = self
            .transition_friend_invite(id, actor, role, action.target_status())
            .await?
        {
            return Ok(invite);
        }

        let current = self.get_friend_invite(id).await?;
        Err(classify_failed_transition(current.as_ref(), actor, role))
    }

    /// Invite `to` into a group on behalf of `from`.
    async fn create_group_invite(&self, group_id: Uuid, from: Uuid, to: Uuid) -> StoreResult<GroupInvite> {
        if from == to {
            return Err(StoreError::Invalid("Cannot invite yourself".to_string()));
        }
        self.ensure_profile(from).await?;
        if self.get_profile(to).await?.is_none() {
            return Err(StoreError::NotFound("Profile not found"));
        }
        let invite = GroupInvite {
            id: Uuid::new_v4(),
            group_id,
            from_user_id: from,
            to_user_id: to,
            created_at: chrono::Utc::now(),
        };
        match self.insert_group_invite(&invite).await {
            Ok(()) => Ok(invite),
            Err(e) if e.is_unique_violation() => {
                Err(StoreError::Conflict("Already invited to this group".to_string()))
            }
            Err(e) => Err(e),
        }
    }

    /// Reject (delete) a group invite addressed to `actor`.
    async fn reject_group_invite(&self, id: Uuid, actor: Uuid) -> StoreResult<()> {
        if self.delete_group_invite_for(id, actor).await? > 0 {
            return Ok(());
        }
        match self.get_group_invite(id).await? {
            None => Err(StoreError::NotFound("Invite not found")),
            Some(_) => Err(StoreError::Forbidden),
        }
    }
}

/// Longest accepted presence TTL (one week).
pub const MAX_PRESENCE_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Heartbeats older than this instant count as stale.
pub(crate) fn stale_cutoff(now: DateTime<Utc>, ttl_seconds: i64) -> StoreResult<DateTime<Utc>> {
    if ttl_seconds < 0 {
        return Err(StoreError::Invalid(format!("Presence TTL must not be negative (got {})", ttl_seconds)));
    }
    chrono::Duration::try_seconds(ttl_seconds)
        .and_then(|ttl| now.checked_sub_signed(ttl))
        .ok_or_else(|| StoreError::Invalid(format!("Presence TTL out of range (got {})", ttl_seconds)))
}

/// Why a conditional invite transition matched no row.
pub fn classify_failed_transition(
    current: Option<&FriendInvite>, actor: Uuid, role: InviteRole,
) -> StoreError {
    let invite = match current {
        Some(invite) => invite,
        None => return StoreError::NotFound("Invite not found"),
    };

    let party = match role {
        InviteRole::Sender => invite.sender_id,
        InviteRole::Recipient => invite.recipient_id,
    };
    if party != actor {
        return StoreError::Forbidden;
    }

    StoreError::Conflict(format!("Invite is already {}", invite.status))
}

fn open_invite_conflict(existing: &FriendInvite) -> StoreError {
    match existing.status {
        InviteStatus::Accepted => StoreError::Conflict("Already friends".to_string()),
        _ => StoreError::Conflict("Invite already pending".to_string()),
    }
}

/// Open the configured database and run migrations.
pub async fn connect(config: &ServerConfig) -> anyhow::Result<Arc<dyn DatabaseBackend>> {
    let backend = open(
        &config.database_url,
        config.db_max_connections,
        Duration::from_millis(config.db_acquire_timeout_ms),
    )
    .await?;
    backend.run_migrations().await?;
    Ok(backend)
}

/// Pick a backend from the URL scheme. Does not migrate.
pub async fn open(
    url: &str, max_connections: u32, acquire_timeout: Duration,
) -> anyhow::Result<Arc<dyn DatabaseBackend>> {
    let backend: Arc<dyn DatabaseBackend> = if url.starts_with("postgres:") || url.starts_with("postgresql:") {
        Arc::new(PostgresBackend::connect(url, max_connections, acquire_timeout).await?)
    } else if url.starts_with("sqlite:") {
        Arc::new(SqliteBackend::connect(url, max_connections, acquire_timeout).await?)
    } else {
        anyhow::bail!("Unsupported database URL scheme: {}", url);
    };
    Ok(backend)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invite(status: InviteStatus) -> (FriendInvite, Uuid, Uuid) {
        let sender = Uuid::new_v4();
        let recipient = Uuid::new_v4();
        let invite = FriendInvite {
            id: Uuid::new_v4(),
            sender_id: sender,
            recipient_id: recipient,
            status,
            created_at: chrono::Utc::now(),
            responded_at: None,
        };
        (invite, sender, recipient)
    }

    #[test]
    fn missing_invite_is_not_found() {
        let err = classify_failed_transition(None, Uuid::new_v4(), InviteRole::Recipient);
        assert!(matches!(err, StoreError::NotFound("Invite not found")));
    }

    #[test]
    fn wrong_party_is_forbidden() {
        let (inv, sender, recipient) = invite(InviteStatus::Pending);
        assert!(matches!(
            classify_failed_transition(Some(&inv), sender, InviteRole::Recipient),
            StoreError::Forbidden
        ));
        assert!(matches!(
            classify_failed_transition(Some(&inv), recipient, InviteRole::Sender),
            StoreError::Forbidden
        ));
        assert!(matches!(
            classify_failed_transition(Some(&inv), Uuid::new_v4(), InviteRole::Recipient),
            StoreError::Forbidden
        ));
    }

    #[test]
    fn settled_invite_conflicts() {
        let (inv, _, recipient) = invite(InviteStatus::Accepted);
        match classify_failed_transition(Some(&inv), recipient, InviteRole::Recipient) {
            StoreError::Conflict(msg) => assert_eq!(msg, "Invite is already accepted"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn pool_timeout_is_soft() {
        assert!(StoreError::Database(sqlx::Error::PoolTimedOut).is_timeout());
        assert!(!StoreError::Forbidden.is_timeout());
        assert!(!StoreError::Database(sqlx::Error::RowNotFound).is_timeout());
    }

    #[test]
    fn stale_cutoff_rejects_bad_ttls() {
        let now = Utc::now();
        assert_eq!(stale_cutoff(now, 0).unwrap(), now);
        assert_eq!(stale_cutoff(now, 120).unwrap(), now - chrono::Duration::seconds(120));
        assert!(matches!(stale_cutoff(now, -120), Err(StoreError::Invalid(_))));
        assert!(matches!(stale_cutoff(now, i64::MAX / 10), Err(StoreError::Invalid(_))));
        assert!(matches!(stale_cutoff(now, i64::MAX), Err(StoreError::Invalid(_))));
    }
}

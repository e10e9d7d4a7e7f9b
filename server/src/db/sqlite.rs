//! SQLite implementation of DatabaseBackend
//!
//! Used for local development and by the test suite. UUIDs are stored as
//! 16-byte BLOBs and timestamps as RFC 3339 text, which both sort correctly.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use tracing::{info, warn};
use uuid::Uuid;

use wayfarer_shared::{
    AddFriendLog, City, CityQuery, FriendInvite, GroupInvite, InviteDirection, InviteRole,
    InviteStatus, Profile, ProfileQuery, ProfileUpdate,
};

use super::rows::{
    into_invites, qualified, AddFriendLogRow, CityRow, FriendInviteRow, GroupInviteRow, ProfileRow,
    CITY_COLUMNS, FRIEND_INVITE_COLUMNS, GROUP_INVITE_COLUMNS, PROFILE_COLUMNS,
};
use super::{stale_cutoff, ConstraintInfo, DatabaseBackend, IndexInfo, StoreError, StoreResult};

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS profiles (
        id BLOB PRIMARY KEY,
        public_id TEXT NOT NULL UNIQUE,
        username TEXT,
        display_name TEXT,
        avatar_url TEXT,
        online INTEGER NOT NULL DEFAULT 0,
        last_seen_at TEXT,
        created_at TEXT NOT NULL
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_profiles_username ON profiles(lower(username))",
    "CREATE INDEX IF NOT EXISTS idx_profiles_online ON profiles(online, last_seen_at)",
    r#"
    CREATE TABLE IF NOT EXISTS friend_invites (
        id BLOB PRIMARY KEY,
        sender_id BLOB NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
        recipient_id BLOB NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
        status TEXT NOT NULL DEFAULT 'pending'
            CHECK (status IN ('pending', 'accepted', 'cancelled', 'rejected')),
        created_at TEXT NOT NULL,
        responded_at TEXT
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_friend_invites_recipient ON friend_invites(recipient_id, status)",
    "CREATE INDEX IF NOT EXISTS idx_friend_invites_sender ON friend_invites(sender_id, status)",
    // At most one live (pending or accepted) invite per unordered pair
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS idx_friend_invites_open_pair
    ON friend_invites(min(sender_id, recipient_id), max(sender_id, recipient_id))
    WHERE status IN ('pending', 'accepted')
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS group_invites (
        id BLOB PRIMARY KEY,
        group_id BLOB NOT NULL,
        from_user_id BLOB NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
        to_user_id BLOB NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
        created_at TEXT NOT NULL,
        UNIQUE (group_id, to_user_id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_group_invites_to_user ON group_invites(to_user_id)",
    r#"
    CREATE TABLE IF NOT EXISTS add_friend_logs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id BLOB NOT NULL,
        query TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_add_friend_logs_user ON add_friend_logs(user_id, created_at)",
    r#"
    CREATE TABLE IF NOT EXISTS cities (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        country_code TEXT NOT NULL,
        admin_name TEXT,
        population INTEGER NOT NULL DEFAULT 0,
        latitude REAL NOT NULL,
        longitude REAL NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_cities_name ON cities(lower(name))",
    "CREATE INDEX IF NOT EXISTS idx_cities_country ON cities(country_code)",
];

pub struct SqliteBackend {
    pool: Pool<Sqlite>,
}

impl SqliteBackend {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Open (creating the file if needed) a SQLite database.
    pub async fn connect(
        database_url: &str, max_connections: u32, acquire_timeout: Duration,
    ) -> StoreResult<Self> {
        let in_memory = database_url.contains(":memory:");

        let mut connect_options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        if !in_memory {
            info!("Opening SQLite database at {}", database_url);
            connect_options = connect_options.journal_mode(SqliteJournalMode::Wal);
        }

        // Every connection to :memory: is its own database, so pin the pool
        // to a single connection that never expires.
        let options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(max_connections)
        };

        let pool = options
            .acquire_timeout(acquire_timeout)
            .connect_with(connect_options)
            .await?;

        Ok(Self::new(pool))
    }

    /// Fresh migrated in-memory database.
    pub async fn in_memory() -> StoreResult<Self> {
        let backend = Self::connect("sqlite::memory:", 1, Duration::from_secs(3)).await?;
        backend.run_migrations().await?;
        Ok(backend)
    }
}

#[async_trait]
impl DatabaseBackend for SqliteBackend {
    async fn run_migrations(&self) -> StoreResult<()> {
        info!("Running database migrations");
        for statement in MIGRATIONS {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("Migrations completed successfully");
        Ok(())
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) {
        info!("Checkpointing SQLite WAL...");
        if let Err(e) = sqlx::query("PRAGMA wal_checkpoint(TRUNCATE)")
            .execute(&self.pool)
            .await
        {
            warn!("WAL checkpoint failed: {}", e);
        }
        self.pool.close().await;
    }

    async fn get_profile(&self, user_id: Uuid) -> StoreResult<Option<Profile>> {
        let sql = format!("SELECT {} FROM profiles WHERE id = ?1", PROFILE_COLUMNS);
        let row: Option<ProfileRow> = sqlx::query_as(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Profile::from))
    }

    async fn get_profile_by_public_id(&self, public_id: &str) -> StoreResult<Option<Profile>> {
        let sql = format!("SELECT {} FROM profiles WHERE public_id = ?1", PROFILE_COLUMNS);
        let row: Option<ProfileRow> = sqlx::query_as(&sql)
            .bind(public_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Profile::from))
    }

    async fn insert_profile(&self, user_id: Uuid, public_id: &str) -> StoreResult<Option<Profile>> {
        let sql = format!(
            r#"
            INSERT INTO profiles (id, public_id, online, created_at)
            VALUES (?1, ?2, 0, ?3)
            ON CONFLICT(id) DO NOTHING
            RETURNING {}
            "#,
            PROFILE_COLUMNS
        );
        let row: Option<ProfileRow> = sqlx::query_as(&sql)
            .bind(user_id)
            .bind(public_id)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Profile::from))
    }

    async fn update_profile(&self, user_id: Uuid, update: &ProfileUpdate) -> StoreResult<Profile> {
        let sql = format!(
            r#"
            UPDATE profiles SET
                username = COALESCE(?2, username),
                display_name = COALESCE(?3, display_name),
                avatar_url = COALESCE(?4, avatar_url)
            WHERE id = ?1
            RETURNING {}
            "#,
            PROFILE_COLUMNS
        );
        let result: Result<Option<ProfileRow>, sqlx::Error> = sqlx::query_as(&sql)
            .bind(user_id)
            .bind(update.username.as_deref())
            .bind(update.display_name.as_deref())
            .bind(update.avatar_url.as_deref())
            .fetch_optional(&self.pool)
            .await;

        match result.map_err(StoreError::from) {
            Ok(Some(row)) => Ok(row.into()),
            Ok(None) => Err(StoreError::NotFound("Profile not found")),
            Err(e) if e.is_unique_violation() => {
                Err(StoreError::Conflict("Username already taken".to_string()))
            }
            Err(e) => Err(e),
        }
    }

    async fn set_online_status(&self, user_id: Uuid, online: bool) -> StoreResult<()> {
        let result = sqlx::query("UPDATE profiles SET online = ?1, last_seen_at = ?2 WHERE id = ?3")
            .bind(online)
            .bind(Utc::now())
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("Profile not found"));
        }
        Ok(())
    }

    async fn mark_stale_offline(&self, ttl_seconds: i64) -> StoreResult<u64> {
        let cutoff = stale_cutoff(Utc::now(), ttl_seconds)?;
        let result = sqlx::query(
            r#"
            UPDATE profiles SET online = 0
            WHERE online = 1 AND (last_seen_at IS NULL OR last_seen_at < ?1)
            "#,
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn search_profiles(
        &self, query: &ProfileQuery, exclude: Option<Uuid>, limit: i64,
    ) -> StoreResult<Vec<Profile>> {
        let sql = match query {
            ProfileQuery::PublicIdPrefix(_) => format!(
                r#"
                SELECT {} FROM profiles
                WHERE public_id LIKE ?1 ESCAPE '\'
                  AND (?2 IS NULL OR id <> ?2)
                ORDER BY public_id
                LIMIT ?3
                "#,
                PROFILE_COLUMNS
            ),
            ProfileQuery::NamePrefix(_) => format!(
                r#"
                SELECT {} FROM profiles
                WHERE (lower(username) LIKE ?1 ESCAPE '\' OR lower(display_name) LIKE ?1 ESCAPE '\')
                  AND (?2 IS NULL OR id <> ?2)
                ORDER BY CASE WHEN lower(username) = ?4 THEN 0 ELSE 1 END,
                         lower(COALESCE(username, display_name)),
                         public_id
                LIMIT ?3
                "#,
                PROFILE_COLUMNS
            ),
        };

        let mut q = sqlx::query_as::<_, ProfileRow>(&sql)
            .bind(query.like_pattern())
            .bind(exclude)
            .bind(limit);
        if let ProfileQuery::NamePrefix(name) = query {
            q = q.bind(name.as_str());
        }

        let rows = q.fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Profile::from).collect())
    }

    async fn search_cities(&self, query: &CityQuery) -> StoreResult<Vec<City>> {
        let sql = format!(
            r#"
            SELECT {} FROM cities
            WHERE lower(name) LIKE ?1 ESCAPE '\'
              AND (?2 IS NULL OR country_code = ?2)
            ORDER BY population DESC, name
            LIMIT ?3
            "#,
            CITY_COLUMNS
        );
        let rows: Vec<CityRow> = sqlx::query_as(&sql)
            .bind(query.like_pattern())
            .bind(query.country.as_deref())
            .bind(query.limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(City::from).collect())
    }

    async fn upsert_city(&self, city: &City) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO cities (id, name, country_code, admin_name, population, latitude, longitude)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                country_code = excluded.country_code,
                admin_name = excluded.admin_name,
                population = excluded.population,
                latitude = excluded.latitude,
                longitude = excluded.longitude
            "#,
        )
        .bind(city.id)
        .bind(&city.name)
        .bind(&city.country_code)
        .bind(city.admin_name.as_deref())
        .bind(city.population)
        .bind(city.latitude)
        .bind(city.longitude)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn log_add_friend_query(&self, user_id: Uuid, query: &str) -> StoreResult<()> {
        sqlx::query("INSERT INTO add_friend_logs (user_id, query, created_at) VALUES (?1, ?2, ?3)")
            .bind(user_id)
            .bind(query)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_add_friend_logs(&self, user_id: Uuid, limit: i64) -> StoreResult<Vec<AddFriendLog>> {
        let rows: Vec<AddFriendLogRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, query, created_at FROM add_friend_logs
            WHERE user_id = ?1
            ORDER BY id DESC
            LIMIT ?2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(AddFriendLog::from).collect())
    }

    async fn get_friend_invite(&self, id: Uuid) -> StoreResult<Option<FriendInvite>> {
        let sql = format!("SELECT {} FROM friend_invites WHERE id = ?1", FRIEND_INVITE_COLUMNS);
        let row: Option<FriendInviteRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(FriendInvite::try_from).transpose()
    }

    async fn find_open_invite_between(&self, a: Uuid, b: Uuid) -> StoreResult<Option<FriendInvite>> {
        let sql = format!(
            r#"
            SELECT {} FROM friend_invites
            WHERE ((sender_id = ?1 AND recipient_id = ?2) OR (sender_id = ?2 AND recipient_id = ?1))
              AND status IN ('pending', 'accepted')
            LIMIT 1
            "#,
            FRIEND_INVITE_COLUMNS
        );
        let row: Option<FriendInviteRow> = sqlx::query_as(&sql)
            .bind(a)
            .bind(b)
            .fetch_optional(&self.pool)
            .await?;
        row.map(FriendInvite::try_from).transpose()
    }

    async fn insert_friend_invite(&self, invite: &FriendInvite) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO friend_invites (id, sender_id, recipient_id, status, created_at, responded_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(invite.id)
        .bind(invite.sender_id)
        .bind(invite.recipient_id)
        .bind(invite.status.as_str())
        .bind(invite.created_at)
        .bind(invite.responded_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_friend_invites(
        &self, user_id: Uuid, direction: InviteDirection, status: Option<InviteStatus>,
    ) -> StoreResult<Vec<FriendInvite>> {
        let party = match direction {
            InviteDirection::Incoming => "recipient_id = ?1",
            InviteDirection::Outgoing => "sender_id = ?1",
            InviteDirection::All => "(sender_id = ?1 OR recipient_id = ?1)",
        };
        let sql = format!(
            r#"
            SELECT {} FROM friend_invites
            WHERE {} AND (?2 IS NULL OR status = ?2)
            ORDER BY created_at DESC
            "#,
            FRIEND_INVITE_COLUMNS, party
        );
        let rows: Vec<FriendInviteRow> = sqlx::query_as(&sql)
            .bind(user_id)
            .bind(status.map(InviteStatus::as_str))
            .fetch_all(&self.pool)
            .await?;
        into_invites(rows)
    }

    async fn transition_friend_invite(
        &self, id: Uuid, actor: Uuid, role: InviteRole, to: InviteStatus,
    ) -> StoreResult<Option<FriendInvite>> {
        let party_column = match role {
            InviteRole::Sender => "sender_id",
            InviteRole::Recipient => "recipient_id",
        };
        let sql = format!(
            r#"
            UPDATE friend_invites SET status = ?1, responded_at = ?2
            WHERE id = ?3 AND {} = ?4 AND status = 'pending'
            RETURNING {}
            "#,
            party_column, FRIEND_INVITE_COLUMNS
        );
        let row: Option<FriendInviteRow> = sqlx::query_as(&sql)
            .bind(to.as_str())
            .bind(Utc::now())
            .bind(id)
            .bind(actor)
            .fetch_optional(&self.pool)
            .await?;
        row.map(FriendInvite::try_from).transpose()
    }

    async fn list_friends(&self, user_id: Uuid) -> StoreResult<Vec<Profile>> {
        let sql = format!(
            r#"
            SELECT {} FROM profiles p
            JOIN friend_invites f
              ON (f.sender_id = ?1 AND f.recipient_id = p.id)
              OR (f.recipient_id = ?1 AND f.sender_id = p.id)
            WHERE f.status = 'accepted'
            ORDER BY lower(COALESCE(p.display_name, p.username, p.public_id))
            "#,
            qualified(PROFILE_COLUMNS, "p")
        );
        let rows: Vec<ProfileRow> = sqlx::query_as(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Profile::from).collect())
    }

    async fn insert_group_invite(&self, invite: &GroupInvite) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO group_invites (id, group_id, from_user_id, to_user_id, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(invite.id)
        .bind(invite.group_id)
        .bind(invite.from_user_id)
        .bind(invite.to_user_id)
        .bind(invite.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_group_invite(&self, id: Uuid) -> StoreResult<Option<GroupInvite>> {
        let sql = format!("SELECT {} FROM group_invites WHERE id = ?1", GROUP_INVITE_COLUMNS);
        let row: Option<GroupInviteRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(GroupInvite::from))
    }

    async fn list_group_invites(&self, to_user_id: Uuid) -> StoreResult<Vec<GroupInvite>> {
        let sql = format!(
            "SELECT {} FROM group_invites WHERE to_user_id = ?1 ORDER BY created_at DESC",
            GROUP_INVITE_COLUMNS
        );
        let rows: Vec<GroupInviteRow> = sqlx::query_as(&sql)
            .bind(to_user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(GroupInvite::from).collect())
    }

    async fn delete_group_invite_for(&self, id: Uuid, to_user_id: Uuid) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM group_invites WHERE id = ?1 AND to_user_id = ?2")
            .bind(id)
            .bind(to_user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn list_indexes(&self, table: Option<&str>) -> StoreResult<Vec<IndexInfo>> {
        let rows: Vec<(String, String, Option<String>)> = sqlx::query_as(
            r#"
            SELECT tbl_name, name, sql FROM sqlite_master
            WHERE type = 'index' AND (?1 IS NULL OR tbl_name = ?1)
            ORDER BY tbl_name, name
            "#,
        )
        .bind(table)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(table, name, definition)| IndexInfo { table, name, definition })
            .collect())
    }

    async fn list_constraints(&self, table: &str) -> StoreResult<Vec<ConstraintInfo>> {
        let indexes: Vec<(String, String)> =
            sqlx::query_as("SELECT name, origin FROM pragma_index_list(?1) ORDER BY name")
                .bind(table)
                .fetch_all(&self.pool)
                .await?;

        let mut constraints: Vec<ConstraintInfo> = indexes
            .into_iter()
            .filter_map(|(name, origin)| {
                let kind = match origin.as_str() {
                    "pk" => "PRIMARY KEY",
                    "u" => "UNIQUE",
                    // plain CREATE INDEX, not a constraint
                    _ => return None,
                };
                Some(ConstraintInfo { name, kind: kind.to_string(), detail: None })
            })
            .collect();

        let foreign: Vec<(String, String, Option<String>)> = sqlx::query_as(
            r#"SELECT "from", "table", "to" FROM pragma_foreign_key_list(?1)"#,
        )
        .bind(table)
        .fetch_all(&self.pool)
        .await?;

        constraints.extend(foreign.into_iter().map(|(from, target, to)| ConstraintInfo {
            name: format!("{}_{}_fkey", table, from),
            kind: "FOREIGN KEY".to_string(),
            detail: Some(format!(
                "({}) REFERENCES {}({})",
                from,
                target,
                to.unwrap_or_else(|| "rowid".to_string())
            )),
        }));

        Ok(constraints)
    }
}

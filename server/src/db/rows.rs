//! Row types shared by both backends

use chrono::{DateTime, Utc};
use uuid::Uuid;

use wayfarer_shared::{AddFriendLog, City, FriendInvite, GroupInvite, Profile};

use super::{StoreError, StoreResult};

pub(crate) const PROFILE_COLUMNS: &str =
    "id, public_id, username, display_name, avatar_url, online, last_seen_at, created_at";

pub(crate) const FRIEND_INVITE_COLUMNS: &str =
    "id, sender_id, recipient_id, status, created_at, responded_at";

pub(crate) const GROUP_INVITE_COLUMNS: &str = "id, group_id, from_user_id, to_user_id, created_at";

pub(crate) const CITY_COLUMNS: &str =
    "id, name, country_code, admin_name, population, latitude, longitude";

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ProfileRow {
    pub id: Uuid,
    pub public_id: String,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub online: bool,
    pub last_seen_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<ProfileRow> for Profile {
    fn from(r: ProfileRow) -> Self {
        Profile {
            id: r.id,
            public_id: r.public_id,
            username: r.username,
            display_name: r.display_name,
            avatar_url: r.avatar_url,
            online: r.online,
            last_seen_at: r.last_seen_at,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct FriendInviteRow {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

impl TryFrom<FriendInviteRow> for FriendInvite {
    type Error = StoreError;

    fn try_from(r: FriendInviteRow) -> StoreResult<Self> {
        let status = r
            .status
            .parse()
            .map_err(|_| StoreError::CorruptRow(format!("friend invite {} status {:?}", r.id, r.status)))?;
        Ok(FriendInvite {
            id: r.id,
            sender_id: r.sender_id,
            recipient_id: r.recipient_id,
            status,
            created_at: r.created_at,
            responded_at: r.responded_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct GroupInviteRow {
    pub id: Uuid,
    pub group_id: Uuid,
    pub from_user_id: Uuid,
    pub to_user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<GroupInviteRow> for GroupInvite {
    fn from(r: GroupInviteRow) -> Self {
        GroupInvite {
            id: r.id,
            group_id: r.group_id,
            from_user_id: r.from_user_id,
            to_user_id: r.to_user_id,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct CityRow {
    pub id: i64,
    pub name: String,
    pub country_code: String,
    pub admin_name: Option<String>,
    pub population: i64,
    pub latitude: f64,
    pub longitude: f64,
}

impl From<CityRow> for City {
    fn from(r: CityRow) -> Self {
        City {
            id: r.id,
            name: r.name,
            country_code: r.country_code,
            admin_name: r.admin_name,
            population: r.population,
            latitude: r.latitude,
            longitude: r.longitude,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct AddFriendLogRow {
    pub id: i64,
    pub user_id: Uuid,
    pub query: String,
    pub created_at: DateTime<Utc>,
}

impl From<AddFriendLogRow> for AddFriendLog {
    fn from(r: AddFriendLogRow) -> Self {
        AddFriendLog {
            id: r.id,
            user_id: r.user_id,
            query: r.query,
            created_at: r.created_at,
        }
    }
}

pub(crate) fn into_invites(rows: Vec<FriendInviteRow>) -> StoreResult<Vec<FriendInvite>> {
    rows.into_iter().map(FriendInvite::try_from).collect()
}

/// `a, b` → `p.a, p.b` for joins where column names collide.
pub(crate) fn qualified(columns: &str, alias: &str) -> String {
    columns
        .split(',')
        .map(|c| format!("{}.{}", alias, c.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}

//! Serializable models returned by the API

#![allow(missing_docs)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, ValidationError};
use crate::invite::InviteStatus;

const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 30;
const DISPLAY_NAME_MAX: usize = 60;
const AVATAR_URL_MAX: usize = 512;

/// A user's own profile, including presence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub public_id: String,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub online: bool,
    pub last_seen_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// The subset of a profile other users may see
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicProfile {
    pub public_id: String,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub online: bool,
}

impl From<Profile> for PublicProfile {
    fn from(p: Profile) -> Self {
        Self {
            public_id: p.public_id,
            username: p.username,
            display_name: p.display_name,
            avatar_url: p.avatar_url,
            online: p.online,
        }
    }
}

/// Fields a user may change on their own profile. `None` leaves the column
/// untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

impl ProfileUpdate {
    /// Trim and check every provided field. Usernames are lower-cased and
    /// limited to `a-z`, `0-9`, `_` and `.`.
    pub fn validated(self) -> Result<Self> {
        let username = match self.username {
            None => None,
            Some(raw) => {
                let name = raw.trim().trim_start_matches('@').to_lowercase();
                let len = name.chars().count();
                if !(USERNAME_MIN..=USERNAME_MAX).contains(&len) {
                    return Err(ValidationError::InvalidField {
                        field: "username",
                        reason: "must be 3-30 characters",
                    });
                }
                if !name
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '.')
                {
                    return Err(ValidationError::InvalidField {
                        field: "username",
                        reason: "may only contain letters, digits, '_' and '.'",
                    });
                }
                // all-digit names would be indistinguishable from public ids
                if name.chars().all(|c| c.is_ascii_digit()) {
                    return Err(ValidationError::InvalidField {
                        field: "username",
                        reason: "must contain a letter",
                    });
                }
                Some(name)
            }
        };

        let display_name = match self.display_name {
            None => None,
            Some(raw) => {
                let name = raw.trim().to_string();
                if name.is_empty() || name.chars().count() > DISPLAY_NAME_MAX {
                    return Err(ValidationError::InvalidField {
                        field: "display_name",
                        reason: "must be 1-60 characters",
                    });
                }
                Some(name)
            }
        };

        let avatar_url = match self.avatar_url {
            None => None,
            Some(raw) => {
                let url = raw.trim().to_string();
                if url.is_empty() || url.len() > AVATAR_URL_MAX {
                    return Err(ValidationError::InvalidField {
                        field: "avatar_url",
                        reason: "must be 1-512 bytes",
                    });
                }
                Some(url)
            }
        };

        Ok(Self { username, display_name, avatar_url })
    }

    /// True when no field would change
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.display_name.is_none() && self.avatar_url.is_none()
    }
}

/// A friend invite between two users
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FriendInvite {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub status: InviteStatus,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

/// An invitation to join a trip group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupInvite {
    pub id: Uuid,
    pub group_id: Uuid,
    pub from_user_id: Uuid,
    pub to_user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Audit row written for every "add friend" lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddFriendLog {
    pub id: i64,
    pub user_id: Uuid,
    pub query: String,
    pub created_at: DateTime<Utc>,
}

/// A city from the location catalogue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub id: i64,
    pub name: String,
    pub country_code: String,
    pub admin_name: Option<String>,
    pub population: i64,
    pub latitude: f64,
    pub longitude: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_is_normalised() {
        let update = ProfileUpdate {
            username: Some("  @Marta.K ".to_string()),
            ..Default::default()
        }
        .validated()
        .unwrap();
        assert_eq!(update.username.as_deref(), Some("marta.k"));
    }

    #[test]
    fn bad_usernames_rejected() {
        for bad in ["ab", "has space", "12345678", "émile"] {
            let update = ProfileUpdate {
                username: Some(bad.to_string()),
                ..Default::default()
            };
            assert!(update.validated().is_err(), "{} should be rejected", bad);
        }
    }

    #[test]
    fn blank_display_name_rejected() {
        let update = ProfileUpdate {
            display_name: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(update.validated().is_err());
        assert!(ProfileUpdate::default().is_empty());
    }
}

//! Wayfarer shared domain
//!
//! Types and pure logic shared by the HTTP server and the maintenance tooling:
//! profile public ids, the invite lifecycle, search query parsing and the
//! serializable models returned by the API.

#![warn(missing_docs)]
#![warn(unsafe_code)]

pub mod error;
pub mod invite;
pub mod models;
pub mod public_id;
pub mod search;

pub use error::ValidationError;
pub use invite::{InviteAction, InviteDirection, InviteRole, InviteStatus};
pub use models::{AddFriendLog, City, FriendInvite, GroupInvite, Profile, ProfileUpdate, PublicProfile};
pub use public_id::{generate_public_id, is_public_id, PUBLIC_ID_LEN};
pub use search::{clamp_limit, escape_like, CityQuery, ProfileQuery, ProfileSlug};

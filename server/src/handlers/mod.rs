//! Route handler modules for the Wayfarer REST API.

pub mod avatars;
pub mod friend_invites;
pub mod group_invites;
pub mod health;
pub mod presence;
pub mod profiles;
pub mod search;

use uuid::Uuid;

use crate::error::ApiError;

/// Parse a path id, rejecting blanks and non-UUIDs with 400.
pub(crate) fn parse_path_id(raw: &str, what: &'static str) -> Result<Uuid, ApiError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ApiError::BadRequest(format!("Missing {}", what)));
    }
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest(format!("Invalid {}", what)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_ids_are_validated() {
        let id = Uuid::new_v4();
        assert_eq!(parse_path_id(&id.to_string(), "invite id").unwrap(), id);
        assert!(matches!(
            parse_path_id("  ", "invite id"),
            Err(ApiError::BadRequest(msg)) if msg == "Missing invite id"
        ));
        assert!(matches!(
            parse_path_id("abc", "invite id"),
            Err(ApiError::BadRequest(msg)) if msg == "Invalid invite id"
        ));
    }
}

//! Friend invite lifecycle
//!
//! An invite starts `pending` and moves exactly once to `accepted`,
//! `cancelled` or `rejected`. The recipient accepts or rejects; only the
//! sender may cancel.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Stored status of a friend invite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InviteStatus {
    /// Waiting for the recipient
    Pending,
    /// Recipient accepted; the two users are friends
    Accepted,
    /// Sender withdrew the invite
    Cancelled,
    /// Recipient declined
    Rejected,
}

impl InviteStatus {
    /// Column value stored in the database
    pub fn as_str(self) -> &'static str {
        match self {
            InviteStatus::Pending => "pending",
            InviteStatus::Accepted => "accepted",
            InviteStatus::Cancelled => "cancelled",
            InviteStatus::Rejected => "rejected",
        }
    }

    /// Terminal statuses never change again
    pub fn is_terminal(self) -> bool {
        !matches!(self, InviteStatus::Pending)
    }
}

impl fmt::Display for InviteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InviteStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(InviteStatus::Pending),
            "accepted" => Ok(InviteStatus::Accepted),
            "cancelled" => Ok(InviteStatus::Cancelled),
            "rejected" => Ok(InviteStatus::Rejected),
            other => Err(ValidationError::InvalidEnum {
                field: "status",
                value: other.to_string(),
            }),
        }
    }
}

/// Which side of an invite a user is on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InviteRole {
    /// The user who sent the invite
    Sender,
    /// The user the invite was sent to
    Recipient,
}

/// Response a party can give to a pending invite
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InviteAction {
    /// Recipient accepts
    Accept,
    /// Sender withdraws
    Cancel,
    /// Recipient declines
    Reject,
}

impl InviteAction {
    /// Status the invite ends up in
    pub fn target_status(self) -> InviteStatus {
        match self {
            InviteAction::Accept => InviteStatus::Accepted,
            InviteAction::Cancel => InviteStatus::Cancelled,
            InviteAction::Reject => InviteStatus::Rejected,
        }
    }

    /// Party allowed to perform the action
    pub fn actor_role(self) -> InviteRole {
        match self {
            InviteAction::Cancel => InviteRole::Sender,
            InviteAction::Accept | InviteAction::Reject => InviteRole::Recipient,
        }
    }

    /// Verb used in logs and responses
    pub fn as_str(self) -> &'static str {
        match self {
            InviteAction::Accept => "accept",
            InviteAction::Cancel => "cancel",
            InviteAction::Reject => "reject",
        }
    }
}

/// Listing filter relative to the requesting user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InviteDirection {
    /// Invites sent to the user
    Incoming,
    /// Invites the user sent
    Outgoing,
    /// Both
    #[default]
    All,
}

impl FromStr for InviteDirection {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "incoming" => Ok(InviteDirection::Incoming),
            "outgoing" => Ok(InviteDirection::Outgoing),
            "all" | "" => Ok(InviteDirection::All),
            other => Err(ValidationError::InvalidEnum {
                field: "direction",
                value: other.to_string(),
            }),
        }
    }
}

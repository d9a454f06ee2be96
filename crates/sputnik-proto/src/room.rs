//! Room and membership types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Membership state of a user in a room.
///
/// The numeric codes are stable and match the persisted representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MemberStatus {
    /// Status could not be decoded.
    Unknown,
    /// Invited, not yet joined.
    Invited,
    /// Active member.
    Joined,
    /// Left voluntarily.
    Left,
    /// Removed by a moderator.
    Kicked,
    /// Removed and barred from rejoining.
    Banned,
}

impl MemberStatus {
    /// Numeric code of the status.
    pub fn code(self) -> i32 {
        match self {
            Self::Unknown => -1,
            Self::Invited => 0,
            Self::Joined => 1,
            Self::Left => 2,
            Self::Kicked => 3,
            Self::Banned => 4,
        }
    }

    /// Decode a numeric code. Unrecognized codes map to [`MemberStatus::Unknown`].
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Self::Invited,
            1 => Self::Joined,
            2 => Self::Left,
            3 => Self::Kicked,
            4 => Self::Banned,
            _ => Self::Unknown,
        }
    }

    /// Storage name, e.g. `MEMBER_STATUS_JOINED`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "MEMBER_STATUS_UNKNOWN",
            Self::Invited => "MEMBER_STATUS_INVITED",
            Self::Joined => "MEMBER_STATUS_JOINED",
            Self::Left => "MEMBER_STATUS_LEFT",
            Self::Kicked => "MEMBER_STATUS_KICKED",
            Self::Banned => "MEMBER_STATUS_BANNED",
        }
    }

    /// Lenient parse used by storage backends: anything unrecognized is `Unknown`.
    pub fn parse_lossy(value: &str) -> Self {
        value.parse().unwrap_or(Self::Unknown)
    }
}

impl fmt::Display for MemberStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a storage name is not a known member status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown member status: {0}")]
pub struct ParseMemberStatusError(pub String);

impl FromStr for MemberStatus {
    type Err = ParseMemberStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MEMBER_STATUS_INVITED" => Ok(Self::Invited),
            "MEMBER_STATUS_JOINED" => Ok(Self::Joined),
            "MEMBER_STATUS_LEFT" => Ok(Self::Left),
            "MEMBER_STATUS_KICKED" => Ok(Self::Kicked),
            "MEMBER_STATUS_BANNED" => Ok(Self::Banned),
            other => Err(ParseMemberStatusError(other.to_string())),
        }
    }
}

/// Identity of a room without its membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSummary {
    /// Unique room id.
    pub room_id: String,
    /// Display title.
    pub title: String,
    /// Optional avatar reference.
    pub avatar: Option<String>,
}

/// A member as reported in a [`RoomDetail`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberDetail {
    /// User id.
    pub user_id: String,
    /// Display name.
    pub full_name: String,
    /// Optional avatar reference.
    pub avatar: Option<String>,
    /// Membership state.
    pub member_status: MemberStatus,
    /// Whether the user currently holds a live room subscription.
    pub is_online: bool,
    /// Last read marker in milliseconds, if any.
    pub last_read_marker: Option<i64>,
}

/// Immutable snapshot of a room's live state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomDetail {
    /// Room id.
    pub room_id: String,
    /// Display title.
    pub title: String,
    /// Optional avatar reference.
    pub avatar: Option<String>,
    /// Members sorted by user id.
    pub members: Vec<MemberDetail>,
    /// Always [`crate::UNREAD_COUNT_UNSET`]: unread counting is not implemented.
    pub event_message_unread_count: i64,
    /// Always [`crate::UNREAD_COUNT_UNSET`]: unread counting is not implemented.
    pub event_system_unread_count: i64,
}

impl RoomDetail {
    /// Look up a member by user id.
    pub fn member(&self, user_id: &str) -> Option<&MemberDetail> {
        self.members.iter().find(|m| m.user_id == user_id)
    }
}

/// Public profile of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    /// User id.
    pub user_id: String,
    /// Display name.
    pub full_name: String,
    /// Optional avatar reference.
    pub avatar: Option<String>,
}

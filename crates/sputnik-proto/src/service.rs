//! Request and response payloads of the chat service.

use crate::event::{EventBundle, SyncFilter};
use crate::room::{RoomDetail, RoomSummary, UserSummary};
use serde::{Deserialize, Serialize};

/// List rooms by id; an empty list selects every live room.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListRoomsRequest {
    /// Room ids to include.
    #[serde(default)]
    pub room_ids: Vec<String>,
}

/// Details of the selected rooms, in no particular order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListRoomsResponse {
    /// One detail per live selected room.
    pub details: Vec<RoomDetail>,
}

/// Sync parameters for one named room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomFilter {
    /// Target room.
    pub room_id: String,
    /// Filter applied to that room.
    pub filter: SyncFilter,
}

/// Sync events across the caller's rooms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRoomsRequest {
    /// Rooms to sync. Empty means every room the caller belongs to.
    #[serde(default)]
    pub room_filters: Vec<RoomFilter>,
}

/// Events of all synced rooms merged together.
pub type SyncRoomsResponse = EventBundle;

/// Move the caller's read marker in one room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetReadMarkerRequest {
    /// Target room.
    pub room_id: String,
    /// New marker in milliseconds.
    pub read_marker_timestamp: i64,
}

/// Create a room with an initial member set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRoomRequest {
    /// Display title.
    pub title: String,
    /// Optional avatar reference.
    pub avatar: Option<String>,
    /// Members besides the creator.
    pub member_ids: Vec<String>,
}

/// The created room as it is now live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRoomResponse {
    /// Persisted summary.
    pub room: RoomSummary,
    /// Live detail after start.
    pub detail: RoomDetail,
}

/// All known users.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListUsersResponse {
    /// User profiles.
    pub users: Vec<UserSummary>,
}

/// Events pushed to live room subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum RoomStreamEvent {
    /// The room's membership or read state changed.
    RoomStateChanged {
        /// Snapshot after the change.
        detail: RoomDetail,
    },
}

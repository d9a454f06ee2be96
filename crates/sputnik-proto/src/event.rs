//! Room events and sync filters.

use serde::{Deserialize, Serialize};

/// Which event kinds a sync returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventTypeFilter {
    /// Message events (with their attachments and reactions).
    Message,
    /// System events.
    System,
    /// Both.
    #[default]
    All,
}

impl EventTypeFilter {
    /// Whether message events pass this filter.
    pub fn includes_messages(self) -> bool {
        matches!(self, Self::Message | Self::All)
    }

    /// Whether system events pass this filter.
    pub fn includes_system(self) -> bool {
        matches!(self, Self::System | Self::All)
    }
}

/// Direction of a sync cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OrderType {
    /// Events created strictly after the cursor.
    #[default]
    Newest,
    /// Events created strictly before the cursor.
    Oldest,
}

/// Sync cursor: a timestamp and a direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinceFilter {
    /// Cursor position in milliseconds.
    pub since_timestamp: i64,
    /// Direction relative to the cursor.
    pub order: OrderType,
}

/// Per-room sync parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncFilter {
    /// Event kinds to return.
    pub event_type: EventTypeFilter,
    /// Optional cursor. Absent means "from epoch, newest first".
    pub since: Option<SinceFilter>,
    /// Maximum rows per kind for this room.
    pub event_limit: u32,
}

impl SyncFilter {
    /// All event kinds, no cursor.
    pub fn all(event_limit: u32) -> Self {
        Self {
            event_type: EventTypeFilter::All,
            since: None,
            event_limit,
        }
    }
}

/// An attachment correlated to its message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentDetail {
    /// Parent message event id.
    pub event_id: String,
    /// Attachment event id.
    pub attachment_id: String,
    /// MIME type of the attached file.
    pub mime_type: String,
    /// Creation time in milliseconds.
    pub create_timestamp: i64,
}

/// A reaction correlated to its message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionDetail {
    /// Parent message event id.
    pub event_id: String,
    /// Reaction event id.
    pub reaction_id: String,
    /// Reacting user.
    pub user_id: String,
    /// Reaction content (emoji or short code).
    pub content: String,
    /// Creation time in milliseconds.
    pub create_timestamp: i64,
}

/// A message event with its correlated attachments and reactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEventDetail {
    /// Event id.
    pub event_id: String,
    /// Owning room.
    pub room_id: String,
    /// Author.
    pub sender_id: String,
    /// Client-side correlation id.
    pub client_event_id: i32,
    /// Edit version.
    pub version: i32,
    /// Message body.
    pub content: String,
    /// Attachments whose parent is this event.
    pub attachments: Vec<AttachmentDetail>,
    /// Reactions whose parent is this event.
    pub reactions: Vec<ReactionDetail>,
    /// Creation time in milliseconds.
    pub create_timestamp: i64,
    /// Last edit in milliseconds; `0` when never edited.
    pub update_timestamp: i64,
}

/// A system event (membership notices, title changes, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemEventDetail {
    /// Event id.
    pub event_id: String,
    /// Owning room.
    pub room_id: String,
    /// Version.
    pub version: i32,
    /// Payload.
    pub content: String,
    /// Creation time in milliseconds.
    pub create_timestamp: i64,
}

/// Result of syncing one or more rooms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventBundle {
    /// Message events.
    pub message_events: Vec<MessageEventDetail>,
    /// System events.
    pub system_events: Vec<SystemEventDetail>,
}

impl EventBundle {
    /// True when neither list carries an event.
    pub fn is_empty(&self) -> bool {
        self.message_events.is_empty() && self.system_events.is_empty()
    }

    /// Append another bundle's events to this one.
    pub fn extend(&mut self, other: EventBundle) {
        self.message_events.extend(other.message_events);
        self.system_events.extend(other.system_events);
    }
}

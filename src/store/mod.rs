//! Storage collaborator abstraction.
//!
//! Room actors, the registry and the sync coordinator only ever talk to
//! persistence through [`RoomStore`]. Two backends exist: the SQLite
//! [`crate::db::Database`] and the in-process [`memory::MemoryStore`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sputnik_proto::{EventTypeFilter, MemberStatus, OrderType, RoomSummary, SyncFilter, UserSummary};
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

pub mod memory;

pub use memory::MemoryStore;

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("storage backend error: {0}")]
    Backend(String),
    #[error("storage call timed out after {0:?}")]
    Timeout(Duration),
}

/// A room member as persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub user_id: String,
    pub full_name: String,
    pub avatar: Option<String>,
    pub status: MemberStatus,
    pub last_read_marker: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEvent {
    pub id: String,
    pub room_id: String,
    pub user_id: String,
    pub client_event_id: i32,
    pub version: i32,
    pub content: String,
    pub create_time: DateTime<Utc>,
    pub update_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemEvent {
    pub id: String,
    pub room_id: String,
    pub version: i32,
    pub content: String,
    pub create_time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentEvent {
    pub id: String,
    pub room_id: String,
    pub message_event_id: String,
    pub mime_type: String,
    pub create_time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionEvent {
    pub id: String,
    pub room_id: String,
    pub message_event_id: String,
    pub user_id: String,
    pub content: String,
    pub create_time: DateTime<Utc>,
}

/// Raw rows returned by a sync query, not yet correlated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredEvents {
    pub message_events: Vec<MessageEvent>,
    pub attachment_events: Vec<AttachmentEvent>,
    pub reaction_events: Vec<ReactionEvent>,
    pub system_events: Vec<SystemEvent>,
}

/// Resolved sync window handed to storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncQuery {
    pub event_type: EventTypeFilter,
    pub limit: u32,
    pub since: DateTime<Utc>,
    pub order: OrderType,
}

impl SyncQuery {
    /// Resolve a wire filter. A missing cursor means epoch-zero, newest first;
    /// a zero limit falls back to `default_limit`. The result never exceeds
    /// `max_limit`.
    pub fn from_filter(filter: &SyncFilter, default_limit: u32, max_limit: u32) -> Self {
        let (since, order) = match filter.since {
            Some(cursor) => (from_millis(cursor.since_timestamp), cursor.order),
            None => (DateTime::<Utc>::UNIX_EPOCH, OrderType::Newest),
        };
        let requested = if filter.event_limit == 0 {
            default_limit
        } else {
            filter.event_limit
        };
        let limit = requested.min(max_limit.max(1));
        Self {
            event_type: filter.event_type,
            limit,
            since,
            order,
        }
    }

    /// Whether a row created at `created` falls inside the window.
    pub fn admits(&self, created: DateTime<Utc>) -> bool {
        match self.order {
            OrderType::Newest => created > self.since,
            OrderType::Oldest => created < self.since,
        }
    }
}

/// Milliseconds since the Unix epoch to a UTC timestamp; out-of-range values clamp to the epoch.
pub fn from_millis(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Bound a storage future by `limit`.
pub async fn with_timeout<T, F>(limit: Duration, fut: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(limit)),
    }
}

#[async_trait]
pub trait RoomStore: Send + Sync {
    /// Every persisted room.
    async fn list_rooms(&self) -> Result<Vec<RoomSummary>, StoreError>;

    /// Rooms the user has a membership row in, keyed by room id.
    async fn list_rooms_for_user(
        &self,
        user_id: &str,
    ) -> Result<HashMap<String, RoomSummary>, StoreError>;

    /// Membership snapshot of one room.
    async fn list_room_members(&self, room_id: &str) -> Result<Vec<Member>, StoreError>;

    /// Persist a read marker.
    async fn set_member_read_marker(
        &self,
        room_id: &str,
        user_id: &str,
        marker: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Events of one room inside the query window. Message and system rows
    /// are ordered newest first and capped at `query.limit` each; attachment
    /// and reaction rows belong to the returned message ids.
    async fn query_sync_events(
        &self,
        room_id: &str,
        query: &SyncQuery,
    ) -> Result<StoredEvents, StoreError>;

    /// Create a room whose members are the creator plus `member_ids`, all joined.
    async fn create_room(
        &self,
        title: &str,
        avatar: Option<&str>,
        creator_id: &str,
        member_ids: &[String],
    ) -> Result<(RoomSummary, Vec<Member>), StoreError>;

    /// Every known user.
    async fn list_users(&self) -> Result<Vec<UserSummary>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use sputnik_proto::SinceFilter;

    #[test]
    fn missing_cursor_defaults_to_epoch_newest() {
        let q = SyncQuery::from_filter(&SyncFilter::all(0), 25, 500);
        assert_eq!(q.since, DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(q.order, OrderType::Newest);
        assert_eq!(q.limit, 25);
    }

    #[test]
    fn window_bounds_are_exclusive() {
        let filter = SyncFilter {
            event_type: EventTypeFilter::All,
            since: Some(SinceFilter {
                since_timestamp: 1_000,
                order: OrderType::Oldest,
            }),
            event_limit: 5,
        };
        let q = SyncQuery::from_filter(&filter, 50, 500);
        assert!(q.admits(from_millis(999)));
        assert!(!q.admits(from_millis(1_000)));
        assert!(!q.admits(from_millis(1_001)));
        assert_eq!(q.limit, 5);
    }

    #[test]
    fn oversized_limit_is_clamped() {
        let q = SyncQuery::from_filter(&SyncFilter::all(40_000), 50, 500);
        assert_eq!(q.limit, 500);

        // A default above the ceiling is clamped as well.
        let q = SyncQuery::from_filter(&SyncFilter::all(0), 800, 500);
        assert_eq!(q.limit, 500);

        let q = SyncQuery::from_filter(&SyncFilter::all(10), 50, 0);
        assert_eq!(q.limit, 1);
    }

    #[tokio::test]
    async fn with_timeout_reports_elapsed_limit() {
        let limit = Duration::from_millis(10);
        let result: Result<(), StoreError> = with_timeout(limit, async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(StoreError::Timeout(d)) if d == limit));
    }
}

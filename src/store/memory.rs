//! In-process room store.
//!
//! Mirrors the SQLite backend's query semantics (inner joins, exclusive time
//! windows, newest-first ordering) without any persistence. Used by tests,
//! benchmarks and the `memory` database backend.

use super::{
    AttachmentEvent, Member, MessageEvent, ReactionEvent, RoomStore, StoreError, StoredEvents,
    SyncQuery, SystemEvent,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use sputnik_proto::{MemberStatus, RoomSummary, UserSummary};
use std::collections::{BTreeMap, HashMap, HashSet};

#[derive(Debug, Clone)]
struct MembershipRow {
    user_id: String,
    status: MemberStatus,
    last_read_marker: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct Inner {
    users: BTreeMap<String, UserSummary>,
    rooms: BTreeMap<String, RoomSummary>,
    /// room_id -> membership rows
    members: HashMap<String, Vec<MembershipRow>>,
    messages: Vec<MessageEvent>,
    attachments: Vec<AttachmentEvent>,
    reactions: Vec<ReactionEvent>,
    system: Vec<SystemEvent>,
}

/// Room store held entirely in memory.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, user: UserSummary) {
        self.inner.write().users.insert(user.user_id.clone(), user);
    }

    pub fn add_room(&self, room: RoomSummary) {
        self.inner.write().rooms.insert(room.room_id.clone(), room);
    }

    /// Insert or replace a membership row. Rows whose user is unknown are
    /// stored but never listed, like an inner join would.
    pub fn add_member(&self, room_id: &str, user_id: &str, status: MemberStatus) {
        let mut inner = self.inner.write();
        let rows = inner.members.entry(room_id.to_string()).or_default();
        rows.retain(|r| r.user_id != user_id);
        rows.push(MembershipRow {
            user_id: user_id.to_string(),
            status,
            last_read_marker: None,
        });
    }

    pub fn add_message(&self, event: MessageEvent) {
        self.inner.write().messages.push(event);
    }

    pub fn add_attachment(&self, event: AttachmentEvent) {
        self.inner.write().attachments.push(event);
    }

    pub fn add_reaction(&self, event: ReactionEvent) {
        self.inner.write().reactions.push(event);
    }

    pub fn add_system_event(&self, event: SystemEvent) {
        self.inner.write().system.push(event);
    }

    /// Persisted read marker, bypassing any room actor.
    pub fn read_marker(&self, room_id: &str, user_id: &str) -> Option<DateTime<Utc>> {
        let inner = self.inner.read();
        inner
            .members
            .get(room_id)?
            .iter()
            .find(|r| r.user_id == user_id)?
            .last_read_marker
    }
}

impl Inner {
    fn members_of(&self, room_id: &str) -> Vec<Member> {
        let Some(rows) = self.members.get(room_id) else {
            return Vec::new();
        };
        rows.iter()
            .filter_map(|row| {
                let user = self.users.get(&row.user_id)?;
                Some(Member {
                    user_id: row.user_id.clone(),
                    full_name: user.full_name.clone(),
                    avatar: user.avatar.clone(),
                    status: row.status,
                    last_read_marker: row.last_read_marker,
                })
            })
            .collect()
    }
}

fn newest_first<T>(rows: &mut Vec<T>, created: impl Fn(&T) -> DateTime<Utc>) {
    rows.sort_by_key(|row| std::cmp::Reverse(created(row)));
}

#[async_trait]
impl RoomStore for MemoryStore {
    async fn list_rooms(&self) -> Result<Vec<RoomSummary>, StoreError> {
        Ok(self.inner.read().rooms.values().cloned().collect())
    }

    async fn list_rooms_for_user(
        &self,
        user_id: &str,
    ) -> Result<HashMap<String, RoomSummary>, StoreError> {
        let inner = self.inner.read();
        let rooms = inner
            .members
            .iter()
            .filter(|(_, rows)| rows.iter().any(|r| r.user_id == user_id))
            .filter_map(|(room_id, _)| inner.rooms.get(room_id))
            .map(|room| (room.room_id.clone(), room.clone()))
            .collect();
        Ok(rooms)
    }

    async fn list_room_members(&self, room_id: &str) -> Result<Vec<Member>, StoreError> {
        Ok(self.inner.read().members_of(room_id))
    }

    async fn set_member_read_marker(
        &self,
        room_id: &str,
        user_id: &str,
        marker: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        let row = inner
            .members
            .get_mut(room_id)
            .and_then(|rows| rows.iter_mut().find(|r| r.user_id == user_id))
            .ok_or_else(|| StoreError::NotFound(format!("member {user_id} of room {room_id}")))?;
        row.last_read_marker = Some(marker);
        Ok(())
    }

    async fn query_sync_events(
        &self,
        room_id: &str,
        query: &SyncQuery,
    ) -> Result<StoredEvents, StoreError> {
        let inner = self.inner.read();
        let limit = query.limit as usize;

        let mut message_events: Vec<MessageEvent> = if query.event_type.includes_messages() {
            inner
                .messages
                .iter()
                .filter(|m| m.room_id == room_id && query.admits(m.create_time))
                .cloned()
                .collect()
        } else {
            Vec::new()
        };
        newest_first(&mut message_events, |m| m.create_time);
        message_events.truncate(limit);

        let ids: HashSet<&str> = message_events.iter().map(|m| m.id.as_str()).collect();

        let mut attachment_events: Vec<AttachmentEvent> = inner
            .attachments
            .iter()
            .filter(|a| ids.contains(a.message_event_id.as_str()))
            .cloned()
            .collect();
        newest_first(&mut attachment_events, |a| a.create_time);

        let mut reaction_events: Vec<ReactionEvent> = inner
            .reactions
            .iter()
            .filter(|r| ids.contains(r.message_event_id.as_str()))
            .cloned()
            .collect();
        newest_first(&mut reaction_events, |r| r.create_time);

        let mut system_events: Vec<SystemEvent> = if query.event_type.includes_system() {
            inner
                .system
                .iter()
                .filter(|s| s.room_id == room_id && query.admits(s.create_time))
                .cloned()
                .collect()
        } else {
            Vec::new()
        };
        newest_first(&mut system_events, |s| s.create_time);
        system_events.truncate(limit);

        Ok(StoredEvents {
            message_events,
            attachment_events,
            reaction_events,
            system_events,
        })
    }

    async fn create_room(
        &self,
        title: &str,
        avatar: Option<&str>,
        creator_id: &str,
        member_ids: &[String],
    ) -> Result<(RoomSummary, Vec<Member>), StoreError> {
        let mut inner = self.inner.write();

        let mut user_ids = vec![creator_id.to_string()];
        for id in member_ids {
            if !user_ids.contains(id) {
                user_ids.push(id.clone());
            }
        }
        if let Some(missing) = user_ids.iter().find(|id| !inner.users.contains_key(*id)) {
            return Err(StoreError::NotFound(format!("user {missing}")));
        }

        let room = RoomSummary {
            room_id: uuid::Uuid::new_v4().to_string(),
            title: title.to_string(),
            avatar: avatar.map(String::from),
        };
        inner.rooms.insert(room.room_id.clone(), room.clone());
        let rows = user_ids
            .into_iter()
            .map(|user_id| MembershipRow {
                user_id,
                status: MemberStatus::Joined,
                last_read_marker: None,
            })
            .collect();
        inner.members.insert(room.room_id.clone(), rows);

        let members = inner.members_of(&room.room_id);
        Ok((room, members))
    }

    async fn list_users(&self) -> Result<Vec<UserSummary>, StoreError> {
        Ok(self.inner.read().users.values().cloned().collect())
    }
}

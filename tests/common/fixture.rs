//! Seeding helpers for the in-memory store.

use sputnik_proto::{MemberStatus, RoomSummary, UserSummary};
use sputnikd::store::{
    AttachmentEvent, MemoryStore, MessageEvent, ReactionEvent, SystemEvent, from_millis,
};
use std::sync::Arc;

/// Fluent builder over a [`MemoryStore`].
pub struct Fixture {
    pub store: Arc<MemoryStore>,
}

#[allow(dead_code)]
impl Fixture {
    pub fn new() -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
        }
    }

    pub fn user(self, id: &str) -> Self {
        self.store.add_user(UserSummary {
            user_id: id.to_string(),
            full_name: format!("{id} full"),
            avatar: None,
        });
        self
    }

    pub fn room(self, id: &str) -> Self {
        self.store.add_room(RoomSummary {
            room_id: id.to_string(),
            title: format!("room {id}"),
            avatar: None,
        });
        self
    }

    pub fn member(self, room_id: &str, user_id: &str, status: MemberStatus) -> Self {
        self.store.add_member(room_id, user_id, status);
        self
    }

    pub fn message(self, room_id: &str, id: &str, created_ms: i64) -> Self {
        self.store.add_message(MessageEvent {
            id: id.to_string(),
            room_id: room_id.to_string(),
            user_id: "alice".to_string(),
            client_event_id: 0,
            version: 1,
            content: format!("body of {id}"),
            create_time: from_millis(created_ms),
            update_time: None,
        });
        self
    }

    pub fn attachment(self, room_id: &str, message_id: &str, id: &str, created_ms: i64) -> Self {
        self.store.add_attachment(AttachmentEvent {
            id: id.to_string(),
            room_id: room_id.to_string(),
            message_event_id: message_id.to_string(),
            mime_type: "image/png".to_string(),
            create_time: from_millis(created_ms),
        });
        self
    }

    pub fn reaction(self, room_id: &str, message_id: &str, id: &str, created_ms: i64) -> Self {
        self.store.add_reaction(ReactionEvent {
            id: id.to_string(),
            room_id: room_id.to_string(),
            message_event_id: message_id.to_string(),
            user_id: "bob".to_string(),
            content: ":+1:".to_string(),
            create_time: from_millis(created_ms),
        });
        self
    }

    pub fn system(self, room_id: &str, id: &str, created_ms: i64) -> Self {
        self.store.add_system_event(SystemEvent {
            id: id.to_string(),
            room_id: room_id.to_string(),
            version: 1,
            content: format!("notice {id}"),
            create_time: from_millis(created_ms),
        });
        self
    }

    /// Three rooms with alice joined everywhere, bob joined in `a` only and
    /// carol invited to `b`.
    pub fn three_rooms() -> Self {
        Self::new()
            .user("alice")
            .user("bob")
            .user("carol")
            .room("a")
            .room("b")
            .room("c")
            .member("a", "alice", MemberStatus::Joined)
            .member("b", "alice", MemberStatus::Joined)
            .member("c", "alice", MemberStatus::Joined)
            .member("a", "bob", MemberStatus::Joined)
            .member("b", "carol", MemberStatus::Invited)
    }
}

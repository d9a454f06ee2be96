//! Room detail snapshots.

use super::*;
use sputnik_proto::{MemberDetail, RoomDetail, UNREAD_COUNT_UNSET};

impl RoomActor {
    fn is_online(&self, user_id: &str) -> bool {
        self.subscribers
            .values()
            .any(|s| s.user_id == user_id && !s.sender.is_closed())
    }

    /// Immutable view of the room as of now. Members are ordered by user id.
    pub(crate) fn snapshot(&self) -> RoomDetail {
        let mut members: Vec<MemberDetail> = self
            .members
            .values()
            .map(|member| MemberDetail {
                user_id: member.user_id.clone(),
                full_name: member.full_name.clone(),
                avatar: member.avatar.clone(),
                member_status: member.status,
                is_online: self.is_online(&member.user_id),
                last_read_marker: member.last_read_marker.map(|t| t.timestamp_millis()),
            })
            .collect();
        members.sort_by(|a, b| a.user_id.cmp(&b.user_id));

        RoomDetail {
            room_id: self.room_id.to_string(),
            title: self.title.clone(),
            avatar: self.avatar.clone(),
            members,
            event_message_unread_count: UNREAD_COUNT_UNSET,
            event_system_unread_count: UNREAD_COUNT_UNSET,
        }
    }
}

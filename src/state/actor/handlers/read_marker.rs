//! Read marker updates.

use super::*;
use crate::error::RoomError;
use chrono::{DateTime, Utc};
use sputnik_proto::RoomDetail;
use tracing::warn;

impl RoomActor {
    /// Storage is written first; in-memory state changes only once it succeeded.
    pub(crate) async fn handle_set_read_marker(
        &mut self,
        user_id: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<RoomDetail, RoomError> {
        if !self.members.contains_key(user_id) {
            return Err(RoomError::MemberNotFound(user_id.to_string()));
        }

        if let Err(e) = with_timeout(
            self.settings.storage_timeout,
            self.store
                .set_member_read_marker(&self.room_id, user_id, timestamp),
        )
        .await
        {
            warn!(user_id = %user_id, error = %e, "Failed to persist read marker");
            return Err(RoomError::Store(e));
        }

        if let Some(member) = self.members.get_mut(user_id) {
            member.last_read_marker = Some(timestamp);
        }

        let detail = self.snapshot();
        self.broadcast(RoomStreamEvent::RoomStateChanged {
            detail: detail.clone(),
        });
        Ok(detail)
    }
}

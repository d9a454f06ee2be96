//! Event sync for a single member.

use super::*;
use crate::store::SyncQuery;
use sputnik_proto::{EventBundle, MemberStatus, SyncFilter};
use tracing::warn;

impl RoomActor {
    /// Non-joined callers and storage failures both yield an empty bundle.
    pub(crate) async fn handle_sync_events(
        &self,
        user_id: &str,
        filter: &SyncFilter,
    ) -> EventBundle {
        let joined = self
            .members
            .get(user_id)
            .is_some_and(|m| m.status == MemberStatus::Joined);
        if !joined {
            debug!(user_id = %user_id, "Sync requested by non-joined user");
            return EventBundle::default();
        }

        let query = SyncQuery::from_filter(
            filter,
            self.settings.default_event_limit,
            self.settings.max_event_limit,
        );
        match with_timeout(
            self.settings.storage_timeout,
            self.store.query_sync_events(&self.room_id, &query),
        )
        .await
        {
            Ok(events) => assemble_bundle(&self.room_id, events),
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Failed to load room events");
                EventBundle::default()
            }
        }
    }
}

//! Fan-out/fan-in over room actors.
//!
//! One sub-request per room runs as its own task; results are merged once
//! every task finished or timed out. Rooms that fail, stall or panic are left
//! out of the result instead of failing the whole call.

use crate::state::{RoomHandle, RoomRegistry};
use crate::store::{StoreError, with_timeout};
use parking_lot::Mutex;
use sputnik_proto::{EventBundle, RoomDetail, RoomFilter, SyncFilter};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

pub struct SyncCoordinator {
    registry: Arc<RoomRegistry>,
    fanout_timeout: Duration,
}

/// Why a room did not contribute to a fan-out result.
enum Skip {
    Timeout,
    Unavailable(crate::error::RoomError),
}

impl SyncCoordinator {
    pub fn new(registry: Arc<RoomRegistry>, fanout_timeout: Duration) -> Self {
        Self {
            registry,
            fanout_timeout,
        }
    }

    /// Details of the listed rooms (all rooms when empty), gathered concurrently.
    pub async fn list_rooms(&self, room_ids: &[String]) -> Vec<RoomDetail> {
        let handles = self.registry.get_rooms(room_ids);
        crate::metrics::record_fanout(handles.len());

        let mut tasks = JoinSet::new();
        for handle in handles {
            let limit = self.fanout_timeout;
            tasks.spawn(async move {
                let outcome = match tokio::time::timeout(limit, handle.get_detail()).await {
                    Ok(Ok(detail)) => Ok(detail),
                    Ok(Err(e)) => Err(Skip::Unavailable(e)),
                    Err(_) => Err(Skip::Timeout),
                };
                (handle.room_id().to_string(), outcome)
            });
        }

        let mut details = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(detail))) => details.push(detail),
                Ok((room_id, Err(skip))) => skipped(&room_id, skip),
                Err(e) => {
                    error!(error = %e, "Room detail task failed");
                    crate::metrics::record_fanout_skipped("panicked");
                }
            }
        }
        details
    }

    /// Events of every room the user belongs to, or of the filtered subset.
    ///
    /// Rooms named in `filters` that the user is not a member of are ignored.
    /// Rooms without a filter entry use all event kinds, no cursor and the
    /// default limit. Fails only when the user's memberships cannot be read.
    pub async fn sync_rooms(
        &self,
        user_id: &str,
        filters: &[RoomFilter],
    ) -> Result<EventBundle, StoreError> {
        let settings = self.registry.settings();
        let memberships = with_timeout(
            settings.storage_timeout,
            self.registry.store().list_rooms_for_user(user_id),
        )
        .await?;

        let targets: Vec<(String, SyncFilter)> = if filters.is_empty() {
            let default = SyncFilter::all(settings.default_event_limit);
            memberships.into_keys().map(|id| (id, default)).collect()
        } else {
            let mut seen = HashSet::new();
            filters
                .iter()
                .filter(|f| memberships.contains_key(&f.room_id))
                .filter(|f| seen.insert(f.room_id.as_str()))
                .map(|f| (f.room_id.clone(), f.filter))
                .collect()
        };

        let buffer = Arc::new(Mutex::new(EventBundle::default()));
        let mut tasks = JoinSet::new();
        let mut addressed = 0;
        for (room_id, filter) in targets {
            let Some(handle) = self.registry.find_room(&room_id) else {
                debug!(room_id = %room_id, "Room not live, skipping sync");
                continue;
            };
            addressed += 1;
            tasks.spawn(sync_one(
                handle,
                user_id.to_string(),
                filter,
                self.fanout_timeout,
                buffer.clone(),
            ));
        }
        crate::metrics::record_fanout(addressed);

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err((room_id, skip))) => skipped(&room_id, skip),
                Err(e) => {
                    error!(error = %e, "Room sync task failed");
                    crate::metrics::record_fanout_skipped("panicked");
                }
            }
        }

        let merged = std::mem::take(&mut *buffer.lock());
        Ok(merged)
    }
}

async fn sync_one(
    handle: RoomHandle,
    user_id: String,
    filter: SyncFilter,
    limit: Duration,
    buffer: Arc<Mutex<EventBundle>>,
) -> Result<(), (String, Skip)> {
    let bundle = match tokio::time::timeout(limit, handle.sync_events(user_id, filter)).await {
        Ok(Ok(bundle)) => bundle,
        Ok(Err(e)) => return Err((handle.room_id().to_string(), Skip::Unavailable(e))),
        Err(_) => return Err((handle.room_id().to_string(), Skip::Timeout)),
    };
    if !bundle.is_empty() {
        buffer.lock().extend(bundle);
    }
    Ok(())
}

fn skipped(room_id: &str, skip: Skip) {
    match skip {
        Skip::Timeout => {
            warn!(room_id = %room_id, "Room did not answer in time, skipping");
            crate::metrics::record_fanout_skipped("timeout");
        }
        Skip::Unavailable(e) => {
            warn!(room_id = %room_id, error = %e, "Room unavailable, skipping");
            crate::metrics::record_fanout_skipped("unavailable");
        }
    }
}

//! Room management state.
//!
//! This module contains the `RoomRegistry`, which owns the mapping from room
//! id to the address of that room's actor.

use crate::error::RegistryError;
use crate::state::actor::{ActorSettings, RoomActor, RoomHandle};
use crate::store::{RoomStore, StoreError, with_timeout};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use sputnik_proto::RoomSummary;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{error, info, warn};

type InitRx = oneshot::Receiver<Result<(), StoreError>>;

/// Outcome of [`RoomRegistry::start`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BootstrapReport {
    pub started: usize,
    pub failed: usize,
}

/// Room registry.
///
/// The RoomRegistry is responsible for:
/// - Keeping exactly one actor per live room id.
/// - Starting actors at bootstrap and on room creation.
/// - Resolving room ids to handles for callers and the sync coordinator.
pub struct RoomRegistry {
    /// All live rooms, indexed by room id.
    rooms: DashMap<String, RoomHandle>,
    store: Arc<dyn RoomStore>,
    settings: ActorSettings,
}

impl RoomRegistry {
    pub fn new(store: Arc<dyn RoomStore>, settings: ActorSettings) -> Self {
        Self {
            rooms: DashMap::new(),
            store,
            settings,
        }
    }

    pub fn store(&self) -> &Arc<dyn RoomStore> {
        &self.store
    }

    pub fn settings(&self) -> &ActorSettings {
        &self.settings
    }

    /// Register and spawn, without waiting for initialization.
    ///
    /// The entry guard is released before returning, so callers may await.
    fn register(&self, summary: RoomSummary) -> Result<(RoomHandle, InitRx), RegistryError> {
        let (handle, init) = match self.rooms.entry(summary.room_id.clone()) {
            Entry::Occupied(_) => return Err(RegistryError::AlreadyStarted(summary.room_id)),
            Entry::Vacant(slot) => {
                let (handle, init) =
                    RoomActor::spawn(summary, self.store.clone(), self.settings);
                slot.insert(handle.clone());
                (handle, init)
            }
        };
        crate::metrics::set_active_rooms(self.rooms.len());
        Ok((handle, init))
    }

    /// Wait for an actor's snapshot load; unregister it if that failed.
    async fn await_ready(&self, handle: RoomHandle, init: InitRx) -> Result<RoomHandle, RegistryError> {
        let outcome = match init.await {
            Ok(outcome) => outcome,
            Err(_) => Err(StoreError::Backend(
                "room actor exited during initialization".to_string(),
            )),
        };

        match outcome {
            Ok(()) => Ok(handle),
            Err(e) => {
                self.rooms
                    .remove_if(handle.room_id(), |_, registered| registered.same_actor(&handle));
                crate::metrics::set_active_rooms(self.rooms.len());
                Err(RegistryError::Init(e))
            }
        }
    }

    /// Start the actor of one room and wait until it is ready.
    pub async fn start_room(&self, summary: RoomSummary) -> Result<RoomHandle, RegistryError> {
        let (handle, init) = self.register(summary)?;
        self.await_ready(handle, init).await
    }

    /// Handle of a live room.
    ///
    /// The shard guard is dropped before returning so callers may await.
    pub fn find_room(&self, room_id: &str) -> Option<RoomHandle> {
        self.rooms.get(room_id).map(|entry| entry.value().clone())
    }

    /// Handles of the listed rooms, or of every room when `room_ids` is empty.
    ///
    /// Unknown ids are ignored and duplicates collapse to one handle.
    pub fn get_rooms(&self, room_ids: &[String]) -> Vec<RoomHandle> {
        if room_ids.is_empty() {
            return self.rooms.iter().map(|entry| entry.value().clone()).collect();
        }

        let mut seen = HashSet::with_capacity(room_ids.len());
        room_ids
            .iter()
            .filter(|id| seen.insert(id.as_str()))
            .filter_map(|id| self.find_room(id))
            .collect()
    }

    /// Start an actor for every persisted room.
    ///
    /// Actors initialize concurrently. A room that fails to start is logged and
    /// counted; only failing to list rooms aborts the bootstrap.
    pub async fn start(&self) -> Result<BootstrapReport, RegistryError> {
        let summaries =
            with_timeout(self.settings.storage_timeout, self.store.list_rooms()).await?;

        let mut report = BootstrapReport::default();
        let mut pending = Vec::with_capacity(summaries.len());
        for summary in summaries {
            let room_id = summary.room_id.clone();
            match self.register(summary) {
                Ok(started) => pending.push(started),
                Err(e) => {
                    warn!(room_id = %room_id, error = %e, "Skipping room at bootstrap");
                    report.failed += 1;
                }
            }
        }

        for (handle, init) in pending {
            let room_id = handle.room_id().to_string();
            match self.await_ready(handle, init).await {
                Ok(_) => report.started += 1,
                Err(e) => {
                    error!(room_id = %room_id, error = %e, "Failed to start room");
                    report.failed += 1;
                }
            }
        }

        info!(
            started = report.started,
            failed = report.failed,
            "Room bootstrap complete"
        );
        Ok(report)
    }

    /// Persist a new room and start its actor.
    pub async fn create_room(
        &self,
        title: &str,
        avatar: Option<&str>,
        creator_id: &str,
        member_ids: &[String],
    ) -> Result<RoomHandle, RegistryError> {
        let (summary, members) = with_timeout(
            self.settings.storage_timeout,
            self.store.create_room(title, avatar, creator_id, member_ids),
        )
        .await?;

        info!(room_id = %summary.room_id, members = members.len(), "Room created");
        self.start_room(summary).await
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

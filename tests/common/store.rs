//! Store wrapper that can refuse writes or stall reads on demand.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use sputnik_proto::{RoomSummary, UserSummary};
use sputnikd::store::{Member, MemoryStore, RoomStore, StoreError, StoredEvents, SyncQuery};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Default)]
pub struct FlakyStore {
    pub inner: Arc<MemoryStore>,
    fail_markers: AtomicBool,
    fail_memberships: AtomicBool,
    /// Rooms whose event queries never complete.
    stalled_rooms: Mutex<HashSet<String>>,
}

#[allow(dead_code)]
impl FlakyStore {
    pub fn new(inner: Arc<MemoryStore>) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    pub fn fail_markers(&self, fail: bool) {
        self.fail_markers.store(fail, Ordering::SeqCst);
    }

    pub fn fail_memberships(&self, fail: bool) {
        self.fail_memberships.store(fail, Ordering::SeqCst);
    }

    pub fn stall_room(&self, room_id: &str) {
        self.stalled_rooms.lock().insert(room_id.to_string());
    }
}

#[async_trait]
impl RoomStore for FlakyStore {
    async fn list_rooms(&self) -> Result<Vec<RoomSummary>, StoreError> {
        self.inner.list_rooms().await
    }

    async fn list_rooms_for_user(
        &self,
        user_id: &str,
    ) -> Result<HashMap<String, RoomSummary>, StoreError> {
        if self.fail_memberships.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("membership index offline".into()));
        }
        self.inner.list_rooms_for_user(user_id).await
    }

    async fn list_room_members(&self, room_id: &str) -> Result<Vec<Member>, StoreError> {
        self.inner.list_room_members(room_id).await
    }

    async fn set_member_read_marker(
        &self,
        room_id: &str,
        user_id: &str,
        marker: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        if self.fail_markers.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("disk full".into()));
        }
        self.inner.set_member_read_marker(room_id, user_id, marker).await
    }

    async fn query_sync_events(
        &self,
        room_id: &str,
        query: &SyncQuery,
    ) -> Result<StoredEvents, StoreError> {
        let stalled = self.stalled_rooms.lock().contains(room_id);
        if stalled {
            std::future::pending::<()>().await;
        }
        self.inner.query_sync_events(room_id, query).await
    }

    async fn create_room(
        &self,
        title: &str,
        avatar: Option<&str>,
        creator_id: &str,
        member_ids: &[String],
    ) -> Result<(RoomSummary, Vec<Member>), StoreError> {
        self.inner.create_room(title, avatar, creator_id, member_ids).await
    }

    async fn list_users(&self) -> Result<Vec<UserSummary>, StoreError> {
        self.inner.list_users().await
    }
}

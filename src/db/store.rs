//! [`RoomStore`] over SQLite.

use super::Database;
use crate::store::{Member, RoomStore, StoreError, StoredEvents, SyncQuery};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sputnik_proto::{RoomSummary, UserSummary};
use std::collections::HashMap;

#[async_trait]
impl RoomStore for Database {
    async fn list_rooms(&self) -> Result<Vec<RoomSummary>, StoreError> {
        Ok(self.rooms().list().await?)
    }

    async fn list_rooms_for_user(
        &self,
        user_id: &str,
    ) -> Result<HashMap<String, RoomSummary>, StoreError> {
        Ok(self.rooms().list_for_user(user_id).await?)
    }

    async fn list_room_members(&self, room_id: &str) -> Result<Vec<Member>, StoreError> {
        Ok(self.rooms().members(room_id).await?)
    }

    async fn set_member_read_marker(
        &self,
        room_id: &str,
        user_id: &str,
        marker: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        Ok(self.rooms().set_read_marker(room_id, user_id, marker).await?)
    }

    async fn query_sync_events(
        &self,
        room_id: &str,
        query: &SyncQuery,
    ) -> Result<StoredEvents, StoreError> {
        Ok(self.rooms().sync_events(room_id, query).await?)
    }

    async fn create_room(
        &self,
        title: &str,
        avatar: Option<&str>,
        creator_id: &str,
        member_ids: &[String],
    ) -> Result<(RoomSummary, Vec<Member>), StoreError> {
        let mut user_ids = vec![creator_id.to_string()];
        for id in member_ids {
            if !user_ids.contains(id) {
                user_ids.push(id.clone());
            }
        }

        let rooms = self.rooms();
        let room = rooms.create(title, avatar, &user_ids).await?;
        let members = rooms.members(&room.room_id).await?;
        Ok((room, members))
    }

    async fn list_users(&self) -> Result<Vec<UserSummary>, StoreError> {
        Ok(self.users().list().await?)
    }
}

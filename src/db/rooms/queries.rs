//! Room and membership queries.

use crate::db::DbError;
use crate::store::{Member, from_millis};
use chrono::{DateTime, Utc};
use sputnik_proto::{MemberStatus, RoomSummary};
use sqlx::SqlitePool;
use std::collections::HashMap;

type MemberRow = (String, String, Option<String>, String, Option<i64>);

/// Repository for room operations.
pub struct RoomRepository<'a> {
    pub(super) pool: &'a SqlitePool,
}

impl<'a> RoomRepository<'a> {
    /// Create a new room repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// All rooms.
    pub async fn list(&self) -> Result<Vec<RoomSummary>, DbError> {
        let rows = sqlx::query_as::<_, (String, String, Option<String>)>(
            "SELECT id, title, avatar FROM rooms",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(room_id, title, avatar)| RoomSummary {
                room_id,
                title,
                avatar,
            })
            .collect())
    }

    /// Rooms the user holds a membership row in, keyed by room id.
    pub async fn list_for_user(
        &self,
        user_id: &str,
    ) -> Result<HashMap<String, RoomSummary>, DbError> {
        let rows = sqlx::query_as::<_, (String, String, Option<String>)>(
            r#"
            SELECT r.id, r.title, r.avatar
            FROM rooms r
            INNER JOIN room_members rm ON rm.room_id = r.id
            INNER JOIN users u ON u.id = rm.user_id
            WHERE u.id = ?
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(room_id, title, avatar)| {
                (
                    room_id.clone(),
                    RoomSummary {
                        room_id,
                        title,
                        avatar,
                    },
                )
            })
            .collect())
    }

    /// Membership rows of one room joined with user profiles.
    pub async fn members(&self, room_id: &str) -> Result<Vec<Member>, DbError> {
        let rows = sqlx::query_as::<_, MemberRow>(
            r#"
            SELECT u.id, u.full_name, u.avatar, rm.member_status, rm.last_read_marker
            FROM room_members rm
            INNER JOIN rooms r ON r.id = rm.room_id
            INNER JOIN users u ON u.id = rm.user_id
            WHERE r.id = ?
            "#,
        )
        .bind(room_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(user_id, full_name, avatar, status, marker)| Member {
                user_id,
                full_name,
                avatar,
                status: MemberStatus::parse_lossy(&status),
                last_read_marker: marker.map(from_millis),
            })
            .collect())
    }

    /// Persist a member's read marker.
    pub async fn set_read_marker(
        &self,
        room_id: &str,
        user_id: &str,
        marker: DateTime<Utc>,
    ) -> Result<(), DbError> {
        let result = sqlx::query(
            r#"
            UPDATE room_members
            SET last_read_marker = ?
            WHERE room_id = ? AND user_id = ?
            "#,
        )
        .bind(marker.timestamp_millis())
        .bind(room_id)
        .bind(user_id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::MemberNotFound {
                room_id: room_id.to_string(),
                user_id: user_id.to_string(),
            });
        }
        Ok(())
    }

    /// Insert a room with the given id.
    pub async fn insert(&self, room: &RoomSummary) -> Result<(), DbError> {
        sqlx::query("INSERT INTO rooms (id, title, avatar, date_create) VALUES (?, ?, ?, ?)")
            .bind(&room.room_id)
            .bind(&room.title)
            .bind(&room.avatar)
            .bind(Utc::now().timestamp_millis())
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Insert or replace a membership row.
    pub async fn upsert_member(
        &self,
        room_id: &str,
        user_id: &str,
        status: MemberStatus,
    ) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO room_members (room_id, user_id, member_status)
            VALUES (?, ?, ?)
            ON CONFLICT(room_id, user_id) DO UPDATE SET member_status = excluded.member_status
            "#,
        )
        .bind(room_id)
        .bind(user_id)
        .bind(status.as_str())
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Create a room with every listed user joined, atomically.
    pub async fn create(
        &self,
        title: &str,
        avatar: Option<&str>,
        user_ids: &[String],
    ) -> Result<RoomSummary, DbError> {
        let room = RoomSummary {
            room_id: uuid::Uuid::new_v4().to_string(),
            title: title.to_string(),
            avatar: avatar.map(String::from),
        };

        let mut tx = self.pool.begin().await?;

        for user_id in user_ids {
            let known: Option<(String,)> = sqlx::query_as("SELECT id FROM users WHERE id = ?")
                .bind(user_id)
                .fetch_optional(&mut *tx)
                .await?;
            if known.is_none() {
                return Err(DbError::UserNotFound(user_id.clone()));
            }
        }

        sqlx::query("INSERT INTO rooms (id, title, avatar, date_create) VALUES (?, ?, ?, ?)")
            .bind(&room.room_id)
            .bind(&room.title)
            .bind(&room.avatar)
            .bind(Utc::now().timestamp_millis())
            .execute(&mut *tx)
            .await?;

        for user_id in user_ids {
            sqlx::query(
                "INSERT INTO room_members (room_id, user_id, member_status) VALUES (?, ?, ?)",
            )
            .bind(&room.room_id)
            .bind(user_id)
            .bind(MemberStatus::Joined.as_str())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(room)
    }
}

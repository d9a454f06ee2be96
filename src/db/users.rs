//! User repository.

use crate::db::DbError;
use chrono::Utc;
use sputnik_proto::UserSummary;
use sqlx::SqlitePool;

/// Repository for user profiles.
pub struct UserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// All users, ordered by full name.
    pub async fn list(&self) -> Result<Vec<UserSummary>, DbError> {
        let rows = sqlx::query_as::<_, (String, String, Option<String>)>(
            "SELECT id, full_name, avatar FROM users ORDER BY full_name",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(user_id, full_name, avatar)| UserSummary {
                user_id,
                full_name,
                avatar,
            })
            .collect())
    }

    /// Find a user by id.
    pub async fn find(&self, user_id: &str) -> Result<Option<UserSummary>, DbError> {
        let row = sqlx::query_as::<_, (String, String, Option<String>)>(
            "SELECT id, full_name, avatar FROM users WHERE id = ?",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|(user_id, full_name, avatar)| UserSummary {
            user_id,
            full_name,
            avatar,
        }))
    }

    /// Insert a user. The login defaults to the user id.
    pub async fn insert(&self, user: &UserSummary) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, login, full_name, avatar, date_create)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.user_id)
        .bind(&user.user_id)
        .bind(&user.full_name)
        .bind(&user.avatar)
        .bind(Utc::now().timestamp_millis())
        .execute(self.pool)
        .await?;
        Ok(())
    }
}

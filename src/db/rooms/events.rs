//! Sync event queries and event inserts.

use super::RoomRepository;
use crate::db::DbError;
use crate::store::{
    AttachmentEvent, MessageEvent, ReactionEvent, StoredEvents, SyncQuery, SystemEvent,
    from_millis,
};
use sputnik_proto::OrderType;
use sqlx::{QueryBuilder, Sqlite};

type MessageRow = (String, String, i32, i32, String, i64, Option<i64>);
type AttachmentRow = (String, String, String, String, i64);
type ReactionRow = (String, String, String, String, String, i64);
type SystemRow = (String, i32, String, i64);

/// Ids bound per `IN (...)` list, well under SQLite's bind variable limit.
const IN_CHUNK: usize = 500;

fn window(order: OrderType) -> &'static str {
    match order {
        OrderType::Newest => ">",
        OrderType::Oldest => "<",
    }
}

impl RoomRepository<'_> {
    /// Message and system events of a room inside the query window, plus the
    /// attachments and reactions of the returned messages.
    pub async fn sync_events(
        &self,
        room_id: &str,
        query: &SyncQuery,
    ) -> Result<StoredEvents, DbError> {
        let message_events = if query.event_type.includes_messages() {
            self.message_events(room_id, query).await?
        } else {
            Vec::new()
        };

        let ids: Vec<&str> = message_events.iter().map(|m| m.id.as_str()).collect();
        let attachment_events = self.attachment_events(&ids).await?;
        let reaction_events = self.reaction_events(&ids).await?;

        let system_events = if query.event_type.includes_system() {
            self.system_events(room_id, query).await?
        } else {
            Vec::new()
        };

        Ok(StoredEvents {
            message_events,
            attachment_events,
            reaction_events,
            system_events,
        })
    }

    async fn message_events(
        &self,
        room_id: &str,
        query: &SyncQuery,
    ) -> Result<Vec<MessageEvent>, DbError> {
        let sql = format!(
            r#"
            SELECT rme.id, rme.user_id, rme.client_event_id, rme.version, rme.content,
                   rme.date_create, rme.date_update
            FROM room_message_events rme
            INNER JOIN rooms r ON r.id = rme.room_id
            WHERE r.id = ?
            AND rme.date_create {} ?
            ORDER BY rme.date_create DESC
            LIMIT ?
            "#,
            window(query.order)
        );

        let rows = sqlx::query_as::<_, MessageRow>(&sql)
            .bind(room_id)
            .bind(query.since.timestamp_millis())
            .bind(i64::from(query.limit))
            .fetch_all(self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(
                |(id, user_id, client_event_id, version, content, created, updated)| MessageEvent {
                    id,
                    room_id: room_id.to_string(),
                    user_id,
                    client_event_id,
                    version,
                    content,
                    create_time: from_millis(created),
                    update_time: updated.map(from_millis),
                },
            )
            .collect())
    }

    async fn system_events(
        &self,
        room_id: &str,
        query: &SyncQuery,
    ) -> Result<Vec<SystemEvent>, DbError> {
        let sql = format!(
            r#"
            SELECT rse.id, rse.version, rse.content, rse.date_create
            FROM room_system_events rse
            INNER JOIN rooms r ON r.id = rse.room_id
            WHERE r.id = ?
            AND rse.date_create {} ?
            ORDER BY rse.date_create DESC
            LIMIT ?
            "#,
            window(query.order)
        );

        let rows = sqlx::query_as::<_, SystemRow>(&sql)
            .bind(room_id)
            .bind(query.since.timestamp_millis())
            .bind(i64::from(query.limit))
            .fetch_all(self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(id, version, content, created)| SystemEvent {
                id,
                room_id: room_id.to_string(),
                version,
                content,
                create_time: from_millis(created),
            })
            .collect())
    }

    async fn attachment_events(&self, message_ids: &[&str]) -> Result<Vec<AttachmentEvent>, DbError> {
        let mut events = Vec::new();
        for chunk in message_ids.chunks(IN_CHUNK) {
            let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
                r#"
                SELECT rma.id, rme.room_id, rme.id, rma.mime_type, rma.date_create
                FROM room_message_attachments rma
                INNER JOIN room_message_events rme ON rme.id = rma.message_event_id
                WHERE rme.id IN ("#,
            );
            let mut ids = builder.separated(", ");
            for id in chunk {
                ids.push_bind(*id);
            }
            ids.push_unseparated(")");

            let rows = builder
                .build_query_as::<AttachmentRow>()
                .fetch_all(self.pool)
                .await?;
            events.extend(rows.into_iter().map(
                |(id, room_id, message_event_id, mime_type, created)| AttachmentEvent {
                    id,
                    room_id,
                    message_event_id,
                    mime_type,
                    create_time: from_millis(created),
                },
            ));
        }

        events.sort_by_key(|e| std::cmp::Reverse(e.create_time));
        Ok(events)
    }

    async fn reaction_events(&self, message_ids: &[&str]) -> Result<Vec<ReactionEvent>, DbError> {
        let mut events = Vec::new();
        for chunk in message_ids.chunks(IN_CHUNK) {
            let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
                r#"
                SELECT rmr.id, rme.room_id, rme.id, rmr.user_id, rmr.content, rmr.date_create
                FROM room_message_reactions rmr
                INNER JOIN room_message_events rme ON rme.id = rmr.message_event_id
                WHERE rme.id IN ("#,
            );
            let mut ids = builder.separated(", ");
            for id in chunk {
                ids.push_bind(*id);
            }
            ids.push_unseparated(")");

            let rows = builder
                .build_query_as::<ReactionRow>()
                .fetch_all(self.pool)
                .await?;
            events.extend(rows.into_iter().map(
                |(id, room_id, message_event_id, user_id, content, created)| ReactionEvent {
                    id,
                    room_id,
                    message_event_id,
                    user_id,
                    content,
                    create_time: from_millis(created),
                },
            ));
        }

        events.sort_by_key(|e| std::cmp::Reverse(e.create_time));
        Ok(events)
    }

    /// Insert a message event.
    pub async fn insert_message(&self, event: &MessageEvent) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO room_message_events
                (id, room_id, user_id, client_event_id, version, content, date_create, date_update)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&event.id)
        .bind(&event.room_id)
        .bind(&event.user_id)
        .bind(event.client_event_id)
        .bind(event.version)
        .bind(&event.content)
        .bind(event.create_time.timestamp_millis())
        .bind(event.update_time.map(|t| t.timestamp_millis()))
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Insert an attachment of an existing message.
    pub async fn insert_attachment(&self, event: &AttachmentEvent) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO room_message_attachments (id, message_event_id, mime_type, date_create)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&event.id)
        .bind(&event.message_event_id)
        .bind(&event.mime_type)
        .bind(event.create_time.timestamp_millis())
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Insert a reaction to an existing message.
    pub async fn insert_reaction(&self, event: &ReactionEvent) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO room_message_reactions (id, message_event_id, user_id, content, date_create)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&event.id)
        .bind(&event.message_event_id)
        .bind(&event.user_id)
        .bind(&event.content)
        .bind(event.create_time.timestamp_millis())
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Insert a system event.
    pub async fn insert_system_event(&self, event: &SystemEvent) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO room_system_events (id, room_id, version, content, date_create)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&event.id)
        .bind(&event.room_id)
        .bind(event.version)
        .bind(&event.content)
        .bind(event.create_time.timestamp_millis())
        .execute(self.pool)
        .await?;
        Ok(())
    }
}

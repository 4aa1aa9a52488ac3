use crate::adapters::database::DbPool;
use crate::adapters::database::records::{MessageRecord, ThreadDigestRecord};
use crate::domain::message::{Message, NewMessage};
use crate::domain::repository::MessageStore;
use crate::domain::thread::ThreadDigest;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct MessageRepository {
    pool: DbPool,
}

impl MessageRepository {
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageStore for MessageRepository {
    /// Records a new message in the database.
    ///
    /// # Errors
    /// Returns `AppError::NotFound` if the sender or receiver does not exist.
    /// Returns `AppError::Database` if the insert fails.
    #[tracing::instrument(level = "debug", skip(self, message), fields(receiver_id = %message.receiver_id))]
    async fn append(&self, message: NewMessage) -> Result<Message> {
        let mut conn = self.pool.acquire().await?;

        let result = sqlx::query_as::<_, MessageRecord>(
            r#"
            INSERT INTO messages (id, sender_id, receiver_id, content)
            VALUES ($1, $2, $3, $4)
            RETURNING id, sender_id, receiver_id, content, is_read, created_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(message.sender_id)
        .bind(message.receiver_id)
        .bind(&message.content)
        .fetch_one(&mut *conn)
        .await;

        match result {
            Ok(record) => Ok(record.into()),
            Err(sqlx::Error::Database(e)) if e.code().as_deref() == Some("23503") => {
                // Foreign key violation: a participant vanished after validation
                Err(AppError::NotFound("Sender or receiver not found".into()))
            }
            Err(e) => Err(AppError::Database(e)),
        }
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn list_between(&self, a: Uuid, b: Uuid) -> Result<Vec<Message>> {
        let mut conn = self.pool.acquire().await?;

        let messages = sqlx::query_as::<_, MessageRecord>(
            r#"
            SELECT id, sender_id, receiver_id, content, is_read, created_at
            FROM messages
            WHERE (sender_id = $1 AND receiver_id = $2)
               OR (sender_id = $2 AND receiver_id = $1)
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(a)
        .bind(b)
        .fetch_all(&mut *conn)
        .await?;

        Ok(messages.into_iter().map(Into::into).collect())
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn thread_digests(&self, user_id: Uuid) -> Result<Vec<ThreadDigest>> {
        let mut conn = self.pool.acquire().await?;

        let digests = sqlx::query_as::<_, ThreadDigestRecord>(
            r#"
            WITH involved AS (
                SELECT id, content, created_at, is_read, receiver_id,
                       CASE WHEN sender_id = $1 THEN receiver_id ELSE sender_id END AS counterpart_id
                FROM messages
                WHERE sender_id = $1 OR receiver_id = $1
            ),
            latest AS (
                SELECT DISTINCT ON (counterpart_id)
                       counterpart_id, id AS last_message_id, content AS last_message, created_at AS last_timestamp
                FROM involved
                ORDER BY counterpart_id, created_at DESC, id DESC
            ),
            unread AS (
                SELECT counterpart_id,
                       COUNT(*) FILTER (WHERE receiver_id = $1 AND NOT is_read) AS unread_count
                FROM involved
                GROUP BY counterpart_id
            )
            SELECT l.counterpart_id, l.last_message_id, l.last_message, l.last_timestamp, u.unread_count
            FROM latest l
            JOIN unread u USING (counterpart_id)
            ORDER BY l.last_timestamp DESC, l.last_message_id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(digests.into_iter().map(Into::into).collect())
    }

    /// Flips unread messages in a single conditional UPDATE; concurrent inserts are
    /// either included or left unread, never half-applied.
    #[tracing::instrument(level = "debug", skip(self))]
    async fn mark_read(&self, receiver_id: Uuid, sender_id: Uuid) -> Result<u64> {
        let mut conn = self.pool.acquire().await?;

        let result = sqlx::query(
            r#"
            UPDATE messages
            SET is_read = TRUE
            WHERE receiver_id = $1 AND sender_id = $2 AND NOT is_read
            "#,
        )
        .bind(receiver_id)
        .bind(sender_id)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

use crate::domain::thread::ThreadDigest;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ThreadDigestRecord {
    pub(crate) counterpart_id: Uuid,
    pub(crate) last_message_id: Uuid,
    pub(crate) last_message: String,
    pub(crate) last_timestamp: OffsetDateTime,
    pub(crate) unread_count: i64,
}

impl From<ThreadDigestRecord> for ThreadDigest {
    fn from(record: ThreadDigestRecord) -> Self {
        Self {
            counterpart_id: record.counterpart_id,
            last_message_id: record.last_message_id,
            last_message: record.last_message,
            last_timestamp: record.last_timestamp,
            unread_count: record.unread_count,
        }
    }
}

use crate::domain::message::Message;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct MessageRecord {
    pub(crate) id: Uuid,
    pub(crate) sender_id: Uuid,
    pub(crate) receiver_id: Uuid,
    pub(crate) content: String,
    pub(crate) is_read: bool,
    pub(crate) created_at: OffsetDateTime,
}

impl From<MessageRecord> for Message {
    fn from(record: MessageRecord) -> Self {
        Self {
            id: record.id,
            sender_id: record.sender_id,
            receiver_id: record.receiver_id,
            content: record.content,
            read: record.is_read,
            created_at: record.created_at,
        }
    }
}

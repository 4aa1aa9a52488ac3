use crate::domain::message::Message as DomainMessage;
use crate::domain::thread::ThreadSummary as DomainThread;
use crate::domain::user::Role;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessage {
    pub receiver_id: Uuid,
    pub content: String,
}

#[derive(Serialize)]
pub struct Message {
    pub id: Uuid,
    pub sender: Uuid,
    pub receiver: Uuid,
    pub content: String,
    pub read: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl From<DomainMessage> for Message {
    fn from(message: DomainMessage) -> Self {
        Self {
            id: message.id,
            sender: message.sender_id,
            receiver: message.receiver_id,
            content: message.content,
            read: message.read,
            timestamp: message.created_at,
        }
    }
}

/// One row of the inbox. `threadId` is the counterpart's id; threads have no
/// identity of their own.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadSummary {
    pub thread_id: Uuid,
    pub counterpart_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub avatar_url: Option<String>,
    pub last_message: String,
    #[serde(with = "time::serde::rfc3339")]
    pub last_timestamp: OffsetDateTime,
    pub unread_count: i64,
}

impl From<DomainThread> for ThreadSummary {
    fn from(thread: DomainThread) -> Self {
        let counterpart = thread.counterpart;
        Self {
            thread_id: counterpart.id,
            counterpart_id: counterpart.id,
            name: counterpart.name,
            email: counterpart.email,
            role: counterpart.role,
            avatar_url: counterpart.avatar_url,
            last_message: thread.last_message,
            last_timestamp: thread.last_timestamp,
            unread_count: thread.unread_count,
        }
    }
}

#[derive(Serialize)]
pub struct StatusMessage {
    pub message: &'static str,
}

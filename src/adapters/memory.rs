//! Process-local backend. Users and messages share one lock so participant
//! checks and writes happen in the same critical section, the way foreign keys
//! and single-statement updates behave in Postgres.

use crate::domain::message::{Message, NewMessage};
use crate::domain::repository::{MessageStore, UserDirectory};
use crate::domain::thread::{ThreadDigest, aggregate_threads};
use crate::domain::user::{NewUser, User};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use time::{Duration, OffsetDateTime};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Default)]
struct State {
    users: HashMap<Uuid, User>,
    emails: HashMap<String, Uuid>,
    // Insertion order, which is also timestamp order.
    messages: Vec<Message>,
    last_timestamp: Option<OffsetDateTime>,
}

impl State {
    /// Server clock that never goes backwards and never repeats.
    fn next_timestamp(&mut self) -> OffsetDateTime {
        let now = OffsetDateTime::now_utc();
        let ts = match self.last_timestamp {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_timestamp = Some(ts);
        ts
    }
}

#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored messages.
    pub async fn message_count(&self) -> usize {
        self.state.read().await.messages.len()
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn append(&self, message: NewMessage) -> Result<Message> {
        let mut state = self.state.write().await;

        if !state.users.contains_key(&message.sender_id) || !state.users.contains_key(&message.receiver_id) {
            return Err(AppError::NotFound("Sender or receiver not found".into()));
        }

        let stored = Message {
            id: Uuid::now_v7(),
            sender_id: message.sender_id,
            receiver_id: message.receiver_id,
            content: message.content,
            read: false,
            created_at: state.next_timestamp(),
        };
        state.messages.push(stored.clone());

        Ok(stored)
    }

    async fn list_between(&self, a: Uuid, b: Uuid) -> Result<Vec<Message>> {
        let state = self.state.read().await;
        Ok(state.messages.iter().filter(|m| m.is_between(a, b)).cloned().collect())
    }

    async fn thread_digests(&self, user_id: Uuid) -> Result<Vec<ThreadDigest>> {
        let state = self.state.read().await;
        Ok(aggregate_threads(user_id, &state.messages))
    }

    async fn mark_read(&self, receiver_id: Uuid, sender_id: Uuid) -> Result<u64> {
        let mut state = self.state.write().await;

        let mut updated = 0;
        for message in state
            .messages
            .iter_mut()
            .filter(|m| m.receiver_id == receiver_id && m.sender_id == sender_id && !m.read)
        {
            message.read = true;
            updated += 1;
        }

        Ok(updated)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn create(&self, user: NewUser) -> Result<User> {
        let mut state = self.state.write().await;

        if state.emails.contains_key(&user.email) {
            return Err(AppError::Conflict("Email already in use".into()));
        }

        let stored = User {
            id: Uuid::now_v7(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            avatar_url: user.avatar_url,
            created_at: OffsetDateTime::now_utc(),
        };
        state.emails.insert(stored.email.clone(), stored.id);
        state.users.insert(stored.id, stored.clone());

        Ok(stored)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state.emails.get(email).and_then(|id| state.users.get(id)).cloned())
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<User>> {
        let state = self.state.read().await;
        Ok(ids.iter().filter_map(|id| state.users.get(id)).cloned().collect())
    }
}

//! Storage seams. Services only see these traits; the concrete backend is
//! chosen at boot (Postgres or in-memory).

use crate::domain::message::{Message, NewMessage};
use crate::domain::thread::ThreadDigest;
use crate::domain::user::{NewUser, User};
use crate::error::Result;
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait MessageStore: Send + Sync + std::fmt::Debug {
    /// Persists a new unread message with a server-assigned timestamp.
    ///
    /// # Errors
    /// Returns `AppError::NotFound` if either participant does not exist.
    async fn append(&self, message: NewMessage) -> Result<Message>;

    /// Every message exchanged between `a` and `b`, in either direction, oldest first.
    async fn list_between(&self, a: Uuid, b: Uuid) -> Result<Vec<Message>>;

    /// One digest per counterpart of `user_id`.
    async fn thread_digests(&self, user_id: Uuid) -> Result<Vec<ThreadDigest>>;

    /// Flips every unread message from `sender_id` to `receiver_id` in one atomic
    /// update and returns how many changed.
    async fn mark_read(&self, receiver_id: Uuid, sender_id: Uuid) -> Result<u64>;

    async fn ping(&self) -> Result<()>;
}

#[async_trait]
pub trait UserDirectory: Send + Sync + std::fmt::Debug {
    /// # Errors
    /// Returns `AppError::Conflict` if the email is already registered.
    async fn create(&self, user: NewUser) -> Result<User>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Users for the given ids; unknown ids are simply absent from the result.
    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<User>>;
}

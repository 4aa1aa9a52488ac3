use crate::config::MessagingConfig;
use crate::domain::message::{Message, NewMessage};
use crate::domain::repository::{MessageStore, UserDirectory};
use crate::domain::thread::{ThreadSummary, sort_freshest_first};
use crate::domain::user::User;
use crate::error::{AppError, Result};
use opentelemetry::{
    KeyValue, global,
    metrics::{Counter, Histogram},
};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone, Debug)]
pub(crate) struct Metrics {
    pub(crate) sent_total: Counter<u64>,
    pub(crate) marked_read_total: Counter<u64>,
    pub(crate) threads_listed: Histogram<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("jobboard-server");
        Self {
            sent_total: meter
                .u64_counter("jobboard_messages_sent_total")
                .with_description("Total messages sent, by outcome")
                .build(),
            marked_read_total: meter
                .u64_counter("jobboard_threads_marked_read_total")
                .with_description("Total mark-read operations, by whether anything changed")
                .build(),
            threads_listed: meter
                .u64_histogram("jobboard_threads_per_listing")
                .with_description("Number of threads returned by a single thread listing")
                .build(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct MessageService {
    messages: Arc<dyn MessageStore>,
    users: Arc<dyn UserDirectory>,
    config: MessagingConfig,
    metrics: Metrics,
}

impl MessageService {
    #[must_use]
    pub fn new(messages: Arc<dyn MessageStore>, users: Arc<dyn UserDirectory>, config: MessagingConfig) -> Self {
        Self { messages, users, config, metrics: Metrics::new() }
    }

    /// Sends a message from the authenticated user to `receiver_id`.
    ///
    /// # Errors
    /// Returns `AppError::BadRequest` if the content is empty, too long, or addressed to the sender.
    /// Returns `AppError::NotFound` if the sender or receiver does not exist.
    #[tracing::instrument(
        err(level = "warn"),
        skip(self, content),
        fields(sender_id = %sender_id, receiver_id = %receiver_id)
    )]
    pub async fn send_message(&self, sender_id: Uuid, receiver_id: Uuid, content: String) -> Result<Message> {
        if sender_id == receiver_id {
            return Err(AppError::BadRequest("Cannot send a message to yourself".into()));
        }
        let content = self.validate_content(content)?;

        let (sender, receiver) = tokio::try_join!(self.users.find_by_id(sender_id), self.users.find_by_id(receiver_id))?;
        if sender.is_none() || receiver.is_none() {
            return Err(AppError::NotFound("Sender or receiver not found".into()));
        }

        match self.messages.append(NewMessage { sender_id, receiver_id, content }).await {
            Ok(message) => {
                tracing::debug!(message_id = %message.id, "Message stored");
                self.metrics.sent_total.add(1, &[KeyValue::new("status", "success")]);
                Ok(message)
            }
            Err(e) => {
                self.metrics.sent_total.add(1, &[KeyValue::new("status", "failure")]);
                Err(e)
            }
        }
    }

    /// Full history between two users, oldest first.
    ///
    /// # Errors
    /// Returns `AppError::Forbidden` if the requester is not one of the two users.
    /// Returns `AppError::NotFound` if either user does not exist.
    #[tracing::instrument(err(level = "warn"), skip(self), fields(requester_id = %requester_id))]
    pub async fn list_between(&self, requester_id: Uuid, user_a: Uuid, user_b: Uuid) -> Result<Vec<Message>> {
        if requester_id != user_a && requester_id != user_b {
            return Err(AppError::Forbidden);
        }

        let (a, b) = tokio::try_join!(self.users.find_by_id(user_a), self.users.find_by_id(user_b))?;
        if a.is_none() || b.is_none() {
            return Err(AppError::NotFound("One or both users not found".into()));
        }

        self.messages.list_between(user_a, user_b).await
    }

    /// One summary per counterpart of `user_id`, most recently active first.
    ///
    /// # Errors
    /// Returns `AppError::InternalMsg` if a counterpart's profile cannot be resolved.
    #[tracing::instrument(err, skip(self), fields(user_id = %user_id, thread_count = tracing::field::Empty))]
    pub async fn list_threads(&self, user_id: Uuid) -> Result<Vec<ThreadSummary>> {
        let mut digests = self.messages.thread_digests(user_id).await?;
        if digests.is_empty() {
            return Ok(Vec::new());
        }

        let counterpart_ids: Vec<Uuid> = digests.iter().map(|d| d.counterpart_id).collect();
        let mut profiles: HashMap<Uuid, User> =
            self.users.find_many(&counterpart_ids).await?.into_iter().map(|u| (u.id, u)).collect();

        sort_freshest_first(&mut digests);

        let mut threads = Vec::with_capacity(digests.len());
        for digest in digests {
            let Some(counterpart) = profiles.remove(&digest.counterpart_id) else {
                tracing::error!(counterpart_id = %digest.counterpart_id, "Thread counterpart has no profile");
                return Err(AppError::InternalMsg(format!(
                    "Missing profile for thread counterpart {}",
                    digest.counterpart_id
                )));
            };
            threads.push(ThreadSummary::new(digest, counterpart));
        }

        tracing::Span::current().record("thread_count", threads.len());
        self.metrics.threads_listed.record(threads.len() as u64, &[]);

        Ok(threads)
    }

    /// Marks every unread message from `counterpart_id` to `user_id` as read.
    /// Calling it again once everything is read is a no-op.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the update fails.
    #[tracing::instrument(err(level = "warn"), skip(self), fields(user_id = %user_id, counterpart_id = %counterpart_id))]
    pub async fn mark_read(&self, user_id: Uuid, counterpart_id: Uuid) -> Result<u64> {
        let updated = self.messages.mark_read(user_id, counterpart_id).await?;

        tracing::debug!(updated, "Thread marked as read");
        let changed = if updated > 0 { "true" } else { "false" };
        self.metrics.marked_read_total.add(1, &[KeyValue::new("changed", changed)]);

        Ok(updated)
    }

    fn validate_content(&self, content: String) -> Result<String> {
        if content.trim().is_empty() {
            return Err(AppError::BadRequest("Message content cannot be empty".into()));
        }
        if content.chars().count() > self.config.max_content_length {
            return Err(AppError::BadRequest(format!(
                "Message content exceeds {} characters",
                self.config.max_content_length
            )));
        }
        Ok(content)
    }
}

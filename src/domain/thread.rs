//! Conversation threads.
//!
//! A thread is never stored. It is derived on read from the messages exchanged
//! between a user and one counterpart, keyed by the counterpart's id.

use crate::domain::message::Message;
use crate::domain::user::User;
use std::cmp::Ordering;
use std::collections::HashMap;
use time::OffsetDateTime;
use uuid::Uuid;

/// Per-counterpart aggregate produced by the message store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadDigest {
    pub(crate) counterpart_id: Uuid,
    pub(crate) last_message_id: Uuid,
    pub(crate) last_message: String,
    pub(crate) last_timestamp: OffsetDateTime,
    pub(crate) unread_count: i64,
}

/// A digest enriched with the counterpart's profile.
#[derive(Debug, Clone)]
pub struct ThreadSummary {
    pub(crate) counterpart: User,
    pub(crate) last_message: String,
    pub(crate) last_timestamp: OffsetDateTime,
    pub(crate) unread_count: i64,
}

impl ThreadSummary {
    #[must_use]
    pub(crate) fn new(digest: ThreadDigest, counterpart: User) -> Self {
        Self {
            counterpart,
            last_message: digest.last_message,
            last_timestamp: digest.last_timestamp,
            unread_count: digest.unread_count,
        }
    }
}

fn freshest_first(a: &ThreadDigest, b: &ThreadDigest) -> Ordering {
    b.last_timestamp.cmp(&a.last_timestamp).then_with(|| b.last_message_id.cmp(&a.last_message_id))
}

/// Orders digests by last activity, newest first. Message ids are time-ordered,
/// so they settle ties between identical timestamps.
pub fn sort_freshest_first(digests: &mut [ThreadDigest]) {
    digests.sort_by(freshest_first);
}

/// Folds every message involving `user_id` into one digest per counterpart.
pub fn aggregate_threads<'a, I>(user_id: Uuid, messages: I) -> Vec<ThreadDigest>
where
    I: IntoIterator<Item = &'a Message>,
{
    let mut involved: Vec<&Message> = messages.into_iter().filter(|m| m.involves(user_id)).collect();
    involved.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));

    let mut digests: Vec<ThreadDigest> = Vec::new();
    let mut slots: HashMap<Uuid, usize> = HashMap::new();

    for message in involved {
        let counterpart_id = message.counterpart_of(user_id);
        // Newest-first iteration: the first message seen for a counterpart is its latest.
        let slot = *slots.entry(counterpart_id).or_insert_with(|| {
            digests.push(ThreadDigest {
                counterpart_id,
                last_message_id: message.id,
                last_message: message.content.clone(),
                last_timestamp: message.created_at,
                unread_count: 0,
            });
            digests.len() - 1
        });

        if message.is_unread_for(user_id) {
            digests[slot].unread_count += 1;
        }
    }

    sort_freshest_first(&mut digests);
    digests
}

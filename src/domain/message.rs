use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub(crate) id: Uuid,
    pub(crate) sender_id: Uuid,
    pub(crate) receiver_id: Uuid,
    pub(crate) content: String,
    pub(crate) read: bool,
    pub(crate) created_at: OffsetDateTime,
}

impl Message {
    /// True when `user_id` is either party of the message.
    #[must_use]
    pub fn involves(&self, user_id: Uuid) -> bool {
        self.sender_id == user_id || self.receiver_id == user_id
    }

    /// The other party, relative to `user_id`.
    #[must_use]
    pub fn counterpart_of(&self, user_id: Uuid) -> Uuid {
        if self.sender_id == user_id { self.receiver_id } else { self.sender_id }
    }

    /// Unread counts belong to the receiver only.
    #[must_use]
    pub fn is_unread_for(&self, user_id: Uuid) -> bool {
        self.receiver_id == user_id && !self.read
    }

    #[must_use]
    pub fn is_between(&self, a: Uuid, b: Uuid) -> bool {
        (self.sender_id == a && self.receiver_id == b) || (self.sender_id == b && self.receiver_id == a)
    }
}

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub(crate) sender_id: Uuid,
    pub(crate) receiver_id: Uuid,
    pub(crate) content: String,
}

pub mod message;
pub mod thread;
pub mod user;

pub(crate) use message::MessageRecord;
pub(crate) use thread::ThreadDigestRecord;
pub(crate) use user::UserRecord;

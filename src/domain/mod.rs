pub mod auth;
pub mod auth_session;
pub mod message;
pub mod repository;
pub mod thread;
pub mod user;

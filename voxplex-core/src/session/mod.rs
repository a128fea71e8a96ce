//! Session state for conversation transcripts
//!
//! Sessions hold one visitor's transcript and pending notices in memory.
//! They are never written to disk.

pub mod manager;
pub mod store;

pub use manager::{SessionManager, SharedSession};
pub use store::{Notice, NoticeLevel, Notices, Role, Transcript, Turn};

//! Shared infrastructure for the mail administration tools.
//!
//! - `files` — discovery of email message files on disk
//! - `mbox` — splitting mbox archives into individual messages
//! - `message` — cheap shape checks before a message is shipped anywhere

pub mod files;
pub mod mbox;
pub mod message;

pub use files::find_email_files;
pub use mbox::split_mbox;
pub use message::looks_like_message;

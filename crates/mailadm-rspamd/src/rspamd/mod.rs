//! # mailadm-rspamd — Rspamd controller client
//!
//! Trains Rspamd's Bayes classifier over the controller HTTP API
//! (`/learnspam`, `/learnham`) from local message files, keeping a state
//! file of already-trained messages so reruns only submit new mail, and
//! reports `/stat` plus local readiness (Bayes activates at 200 spam and
//! 200 ham).
//!
//! - `types` — config, state, outcomes, reports
//! - `error` — controller-specific error type
//! - `client` — HTTP calls
//! - `state` — training-state file keyed by message digest
//! - `trainer` — batch runner over files and mbox archives

pub mod types;
pub mod error;
pub mod client;
pub mod state;
pub mod trainer;

pub use types::*;
pub use error::{RspamdError, RspamdErrorKind, RspamdResult};
pub use client::RspamdClient;
pub use state::TrainState;
pub use trainer::Trainer;

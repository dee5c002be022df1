//! # mailadm-stalwart — Stalwart management-API client
//!
//! Talks to a Stalwart mail server's HTTP management API to:
//! - read and write configuration settings in bulk
//!   (`spam-filter.rule.*` and `spam-filter.list.scores.*`)
//! - export the spam ruleset to an editable JSON bundle and re-import it
//! - train the Bayes spam filter with local messages
//!
//! Settings can also be read from offline sources (a flattened config
//! file or a `Key:`/`Value:` dump) so the ruleset tooling works without
//! server access.
//!
//! Architecture:
//! - `types` — config, rule/score records, export bundle, train summary
//! - `error` — API-specific error type
//! - `client` — authenticated HTTP client + settings sources
//! - `rules` — settings ⇄ ruleset conversion and import payloads
//! - `offline` — flat-config / key-dump / CLI-table parsing
//! - `train` — Bayes training requests and the batch runner

pub mod types;
pub mod error;
pub mod client;
pub mod rules;
pub mod offline;
pub mod train;

pub use types::*;
pub use error::{StalwartError, StalwartErrorKind, StalwartResult};
pub use client::{ApiClient, SettingsSource};
pub use rules::RuleSet;
pub use train::TrainRunner;

//! # mailadm-confscan — configuration-key static analysis
//!
//! Scrapes the configuration keys a Rust codebase can consume, two ways:
//!
//! - `usage` — pattern-matches runtime accessor calls
//!   (`config.property(..)`, `config.sub_keys(..)`, …) and reconstructs
//!   the dotted keys, with `<id>` placeholders where the code iterates
//!   dynamic segments.
//! - `schema` — parses `pub struct` definitions with serde attributes and
//!   expands them into nested dotted keys starting from the structs that
//!   are actually fed to a config parser.
//!
//! Both report as a flat list, a rendered tree / markdown table, or JSON.

pub mod types;
pub mod usage;
pub mod schema;

pub use types::*;
pub use usage::UsageScan;
pub use schema::SchemaScan;

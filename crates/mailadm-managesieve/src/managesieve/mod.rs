//! # mailadm-managesieve — ManageSieve client
//!
//! Client-side implementation of the ManageSieve subset needed to
//! administer Sieve scripts on a mail server:
//! - Implicit TLS or mid-session STARTTLS upgrade
//! - SASL PLAIN authentication
//! - PUTSCRIPT (non-synchronizing literal framing), SETACTIVE,
//!   DELETESCRIPT, LISTSCRIPTS, LOGOUT
//!
//! Architecture:
//! - `types` — config, responses, script records, session phases
//! - `error` — ManageSieve-specific error type
//! - `protocol` — line/literal codec and response classification
//! - `connection` — TCP + implicit-TLS transport setup
//! - `tls` — rustls connector and STARTTLS upgrade
//! - `client` — stateful session (connect → auth → commands → close)
//! - `parser` — LISTSCRIPTS parsing and name validation
//!
//! The protocol is strictly synchronous request/response: a
//! [`client::SieveClient`] must be driven by one caller at a time. Callers
//! that want concurrency run independent sessions, one transport each.

pub mod types;
pub mod error;
pub mod protocol;
pub mod connection;
pub mod tls;
pub mod client;
pub mod parser;

pub use types::*;
pub use error::{SieveError, SieveErrorKind, SieveResult};
pub use client::SieveClient;

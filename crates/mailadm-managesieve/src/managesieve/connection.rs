//! TCP + TLS transport — establishes the ManageSieve connection.
//!
//! Handles plain-TCP connect, implicit-TLS wrapping, and the timeout
//! policy from `SieveConnectionConfig`. The greeting the server sends
//! unsolicited after connect is consumed here and must be `OK`.
//!
//! For STARTTLS the caller issues the upgrade command afterwards
//! (handled in `client.rs`).

use crate::managesieve::error::{SieveError, SieveResult};
use crate::managesieve::protocol::SieveCodec;
use crate::managesieve::tls::{build_tls_connector, server_name};
use crate::managesieve::types::{SieveConnectionConfig, SieveResponse, SieveSecurityMode};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Establish the connection and return a ready-to-use codec **plus** the
/// server greeting.
pub async fn connect(config: &SieveConnectionConfig) -> SieveResult<(SieveCodec, SieveResponse)> {
    let addr = format!("{}:{}", config.host, config.port);
    let dur = Duration::from_secs(config.timeout_secs);

    let tcp = timeout(dur, TcpStream::connect(&addr))
        .await
        .map_err(|_| SieveError::timeout(format!("TCP connect to {} timed out", addr)))?
        .map_err(|e| SieveError::connection_failed(format!("TCP connect to {}: {}", addr, e)))?;

    tcp.set_nodelay(true).ok();

    let mut codec = match config.security {
        SieveSecurityMode::Implicit => {
            // TLS wraps the socket before the greeting is read.
            let connector = build_tls_connector(config.accept_invalid_certs)?;
            let tls = connector
                .connect(server_name(&config.host)?, tcp)
                .await
                .map_err(|e| SieveError::tls_failed(format!("Implicit TLS handshake: {}", e)))?;
            SieveCodec::from_tls(tls, dur)
        }
        _ => {
            // Plain TCP (None or StartTls — StartTls upgrades later).
            SieveCodec::from_tcp(tcp, dur)
        }
    };

    let greeting = codec.expect_ok().await?;
    Ok((codec, greeting))
}

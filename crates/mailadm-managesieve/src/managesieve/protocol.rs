//! Low-level ManageSieve command/response codec.
//!
//! Handles:
//! - Sending commands terminated with `\r\n`
//! - Reading CRLF-terminated lines with the configured timeout
//! - Grouping lines into one logical response (data lines followed by a
//!   single `OK` / `NO` / `BYE` status line)
//! - Encoding the PUTSCRIPT non-synchronizing literal

use crate::managesieve::error::{SieveError, SieveResult};
use crate::managesieve::types::{ResponseStatus, SieveResponse};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::client::TlsStream;

/// Abstraction over plain TCP or TLS-wrapped read half.
pub enum ReadHalf {
    Plain(BufReader<OwnedReadHalf>),
    Tls(BufReader<tokio::io::ReadHalf<TlsStream<TcpStream>>>),
}

/// Abstraction over plain TCP or TLS-wrapped write half.
pub enum WriteHalf {
    Plain(OwnedWriteHalf),
    Tls(tokio::io::WriteHalf<TlsStream<TcpStream>>),
}

/// The ManageSieve codec operating on split halves. Exclusively owned by
/// one session; the STARTTLS upgrade consumes it (see `tls.rs`) so a
/// plaintext handle and its ciphered replacement never coexist.
pub struct SieveCodec {
    pub(crate) reader: ReadHalf,
    pub(crate) writer: WriteHalf,
    /// Applied to every read and write.
    pub(crate) io_timeout: Duration,
}

impl SieveCodec {
    /// Create a codec from a plain TCP stream.
    pub fn from_tcp(stream: TcpStream, io_timeout: Duration) -> Self {
        let (rd, wr) = stream.into_split();
        Self {
            reader: ReadHalf::Plain(BufReader::new(rd)),
            writer: WriteHalf::Plain(wr),
            io_timeout,
        }
    }

    /// Create a codec from a TLS-wrapped TCP stream.
    pub fn from_tls(stream: TlsStream<TcpStream>, io_timeout: Duration) -> Self {
        let (rd, wr) = tokio::io::split(stream);
        Self {
            reader: ReadHalf::Tls(BufReader::new(rd)),
            writer: WriteHalf::Tls(wr),
            io_timeout,
        }
    }

    pub fn is_tls(&self) -> bool {
        matches!(self.reader, ReadHalf::Tls(_))
    }

    // ── Writing ──────────────────────────────────────────────────────

    /// Send one command line (without trailing CRLF — we add it).
    pub async fn send_line(&mut self, line: &str) -> SieveResult<()> {
        log::trace!(">>> {}", line);
        let wire = format!("{}\r\n", line);
        self.write_raw(wire.as_bytes()).await
    }

    /// Send a line whose content must not reach the logs (credentials).
    pub async fn send_line_sensitive(&mut self, line: &str) -> SieveResult<()> {
        log::trace!(">>> <{} bytes redacted>", line.len());
        let wire = format!("{}\r\n", line);
        self.write_raw(wire.as_bytes()).await
    }

    /// Write raw bytes, applying the I/O timeout.
    pub async fn write_raw(&mut self, bytes: &[u8]) -> SieveResult<()> {
        let dur = self.io_timeout;
        let write = async {
            match &mut self.writer {
                WriteHalf::Plain(w) => {
                    w.write_all(bytes).await?;
                    w.flush().await
                }
                WriteHalf::Tls(w) => {
                    w.write_all(bytes).await?;
                    w.flush().await
                }
            }
        };
        timeout(dur, write)
            .await
            .map_err(|_| SieveError::timeout("Write timed out"))?
            .map_err(SieveError::from)
    }

    // ── Reading ──────────────────────────────────────────────────────

    /// Read a single line, stripping the terminator. Fails with
    /// `ConnectionClosed` if the peer closes before a terminator is seen.
    pub async fn read_line(&mut self) -> SieveResult<String> {
        let mut buf = String::new();
        let dur = self.io_timeout;
        let read = async {
            match &mut self.reader {
                ReadHalf::Plain(r) => r.read_line(&mut buf).await,
                ReadHalf::Tls(r) => r.read_line(&mut buf).await,
            }
        };
        let n = timeout(dur, read)
            .await
            .map_err(|_| SieveError::timeout("Read timed out"))?
            .map_err(SieveError::from)?;
        if n == 0 {
            return Err(SieveError::connection_closed("Server closed connection"));
        }
        while buf.ends_with('\n') || buf.ends_with('\r') {
            buf.pop();
        }
        log::trace!("<<< {}", buf);
        Ok(buf)
    }

    /// Read a complete response: data lines until the first status line.
    ///
    /// An immediate status line with no preceding data lines is valid —
    /// most commands return only a status.
    pub async fn read_response(&mut self) -> SieveResult<SieveResponse> {
        let mut data = Vec::new();
        loop {
            let line = self.read_line().await?;
            match parse_status(&line) {
                Some((status, text)) => {
                    return Ok(SieveResponse { status, text, data });
                }
                None => data.push(line),
            }
        }
    }

    /// Read a response and require an `OK` terminal status.
    ///
    /// `NO` surfaces as `Rejected` carrying the server's reason, `BYE` as
    /// the distinct `ServerBye`.
    pub async fn expect_ok(&mut self) -> SieveResult<SieveResponse> {
        let resp = self.read_response().await?;
        match resp.status {
            ResponseStatus::Ok => Ok(resp),
            ResponseStatus::No => Err(SieveError::rejected(resp.text)),
            ResponseStatus::Bye => Err(SieveError::server_bye(resp.text)),
        }
    }
}

// ─── Response classification ─────────────────────────────────────────

/// Classify a line as a status line: one of the three status keywords
/// (case-sensitive) followed by whitespace or end-of-line. Returns the
/// status and the remaining free text.
pub fn parse_status(line: &str) -> Option<(ResponseStatus, String)> {
    for (keyword, status) in [
        ("OK", ResponseStatus::Ok),
        ("NO", ResponseStatus::No),
        ("BYE", ResponseStatus::Bye),
    ] {
        if let Some(rest) = line.strip_prefix(keyword) {
            if rest.is_empty() {
                return Some((status, String::new()));
            }
            if let Some(first) = rest.chars().next() {
                if first.is_whitespace() {
                    return Some((status, rest[first.len_utf8()..].to_string()));
                }
            }
        }
    }
    None
}

// ─── Command encoding ────────────────────────────────────────────────

/// Quote a script or account name for embedding in a command line. The
/// caller must have validated the name (see `parser::validate_script_name`);
/// no escaping is performed.
pub fn quote_name(name: &str) -> String {
    format!("\"{}\"", name)
}

/// Encode a PUTSCRIPT command with its non-synchronizing literal.
///
/// Returns the command line (without terminator) and the literal payload.
/// CRLF pairs in the body are reduced to LF and a missing trailing LF is
/// appended before the byte count is computed, so the announced count
/// always matches the bytes sent after it.
pub fn encode_put_script(name: &str, body: &[u8]) -> (String, Vec<u8>) {
    let payload = normalize_script_body(body);
    let line = format!("PUTSCRIPT {} {{{}+}}", quote_name(name), payload.len());
    (line, payload)
}

/// Reduce CRLF pairs to LF and guarantee a trailing LF.
pub fn normalize_script_body(body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(body.len() + 1);
    let mut i = 0;
    while i < body.len() {
        if body[i] == b'\r' && body.get(i + 1) == Some(&b'\n') {
            out.push(b'\n');
            i += 2;
        } else {
            out.push(body[i]);
            i += 1;
        }
    }
    if !out.ends_with(b"\n") {
        out.push(b'\n');
    }
    out
}

/// Compute the SASL PLAIN payload: base64 of `\0user\0pass`.
pub fn plain_auth_blob(username: &str, password: &str) -> String {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    STANDARD.encode(format!("\0{}\0{}", username, password))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_ok_with_text() {
        let (status, text) = parse_status("OK Ready").unwrap();
        assert_eq!(status, ResponseStatus::Ok);
        assert_eq!(text, "Ready");
    }

    #[test]
    fn test_status_bare_keyword() {
        let (status, text) = parse_status("NO").unwrap();
        assert_eq!(status, ResponseStatus::No);
        assert_eq!(text, "");
    }

    #[test]
    fn test_status_requires_token_boundary() {
        // A data line that merely starts with a status keyword is not a
        // status line.
        assert!(parse_status("NOTEWORTHY line").is_none());
        assert!(parse_status("OKAY then").is_none());
        assert!(parse_status("BYELINE").is_none());
    }

    #[test]
    fn test_status_any_whitespace_boundary() {
        let (status, text) = parse_status("OK\tdone").unwrap();
        assert_eq!(status, ResponseStatus::Ok);
        assert_eq!(text, "done");
    }

    #[test]
    fn test_status_case_sensitive() {
        assert!(parse_status("ok done").is_none());
        assert!(parse_status("bye").is_none());
    }

    #[test]
    fn test_data_line_is_not_status() {
        assert!(parse_status("\"script\" ACTIVE").is_none());
    }

    #[test]
    fn test_literal_count_matches_payload() {
        let (line, payload) = encode_put_script("test", b"if true { discard; }");
        // Missing trailing newline is appended and counted.
        assert_eq!(payload, b"if true { discard; }\n");
        assert_eq!(line, format!("PUTSCRIPT \"test\" {{{}+}}", payload.len()));
    }

    #[test]
    fn test_literal_normalizes_crlf() {
        let (line, payload) = encode_put_script("x", b"keep;\r\nstop;\r\n");
        assert_eq!(payload, b"keep;\nstop;\n");
        assert_eq!(line, "PUTSCRIPT \"x\" {12+}");
    }

    #[test]
    fn test_literal_keeps_existing_terminator() {
        let (_, payload) = encode_put_script("x", b"discard;\n");
        assert_eq!(payload, b"discard;\n");
    }

    #[test]
    fn test_literal_empty_body() {
        let (line, payload) = encode_put_script("x", b"");
        assert_eq!(payload, b"\n");
        assert_eq!(line, "PUTSCRIPT \"x\" {1+}");
    }

    #[test]
    fn test_bare_cr_is_preserved() {
        let (_, payload) = encode_put_script("x", b"a\rb\n");
        assert_eq!(payload, b"a\rb\n");
    }

    #[test]
    fn test_plain_auth_blob() {
        // base64("\0user\0pass")
        assert_eq!(plain_auth_blob("user", "pass"), "AHVzZXIAcGFzcw==");
    }

    #[test]
    fn test_quote_name() {
        assert_eq!(quote_name("vacation"), "\"vacation\"");
    }
}

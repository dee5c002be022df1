//! Stateful ManageSieve client — owns the connection and issues commands.
//!
//! Lifecycle: `connect()` → optional STARTTLS → `authenticate()` →
//! script commands → `close()`. Every public method checks the session
//! phase first and refuses out-of-order calls before any bytes are
//! written.
//!
//! One caller at a time per session; run independent sessions for
//! concurrency.

use crate::managesieve::connection;
use crate::managesieve::error::{SieveError, SieveErrorKind, SieveResult};
use crate::managesieve::parser;
use crate::managesieve::protocol::{self, SieveCodec};
use crate::managesieve::tls;
use crate::managesieve::types::*;

/// A ManageSieve client session.
pub struct SieveClient {
    config: SieveConnectionConfig,
    codec: Option<SieveCodec>,
    phase: SessionPhase,
    /// Raw greeting data lines, retained for diagnostics only.
    greeting: Vec<String>,
}

impl SieveClient {
    /// Create an idle session from connection parameters.
    pub fn new(config: SieveConnectionConfig) -> SieveResult<Self> {
        if config.host.is_empty() {
            return Err(SieveError::invalid_config("Host must not be empty"));
        }
        Ok(Self {
            config,
            codec: None,
            phase: SessionPhase::Idle,
            greeting: Vec::new(),
        })
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_encrypted(&self) -> bool {
        self.codec.as_ref().map(|c| c.is_tls()).unwrap_or(false)
    }

    /// Data lines of the server greeting (capability announcements).
    pub fn greeting(&self) -> &[String] {
        &self.greeting
    }

    // ─── Lifecycle ───────────────────────────────────────────────────

    /// Open the transport, consume the greeting, and perform the
    /// configured encryption upgrade.
    pub async fn connect(&mut self) -> SieveResult<()> {
        self.require_phase(&[SessionPhase::Idle], "connect")?;

        let (codec, greeting) = connection::connect(&self.config).await?;
        self.greeting = greeting.data;
        self.codec = Some(codec);
        self.phase = if self.config.security == SieveSecurityMode::Implicit {
            SessionPhase::Encrypted
        } else {
            SessionPhase::Connected
        };
        log::info!(
            "[managesieve] connected to {}:{} ({:?})",
            self.config.host,
            self.config.port,
            self.config.security
        );

        if self.config.security == SieveSecurityMode::StartTls {
            self.starttls().await?;
        }
        Ok(())
    }

    /// Upgrade a plaintext session to TLS in place. Only valid in
    /// `Connected`; no second greeting is read after the handshake.
    pub async fn starttls(&mut self) -> SieveResult<()> {
        self.require_phase(&[SessionPhase::Connected], "STARTTLS")?;

        let codec = self.codec_mut()?;
        codec.send_line("STARTTLS").await?;
        codec.expect_ok().await?;

        // The old plaintext handle is consumed by the upgrade; on failure
        // the transport is gone and the session is unusable.
        let plain = self.codec.take().ok_or_else(missing_transport)?;
        match tls::upgrade_to_tls(plain, &self.config.host, self.config.accept_invalid_certs).await
        {
            Ok(ciphered) => {
                self.codec = Some(ciphered);
                self.phase = SessionPhase::Encrypted;
                log::info!("[managesieve] STARTTLS upgrade complete");
                Ok(())
            }
            Err(e) => {
                self.phase = SessionPhase::Closed;
                Err(e)
            }
        }
    }

    /// Authenticate with SASL PLAIN using the configured credentials.
    pub async fn authenticate(&mut self) -> SieveResult<()> {
        self.require_phase(
            &[SessionPhase::Connected, SessionPhase::Encrypted],
            "AUTHENTICATE",
        )?;
        if self.config.username.is_empty() && self.config.password.is_empty() {
            return Err(SieveError::invalid_config(
                "Username and password must not both be empty",
            ));
        }

        let blob = protocol::plain_auth_blob(&self.config.username, &self.config.password);
        let codec = self.codec_mut()?;
        codec.send_line("AUTHENTICATE \"PLAIN\"").await?;

        // Exactly one continuation line is expected before any credential
        // bytes go out.
        let challenge = codec.read_line().await?;
        if !challenge.starts_with('+') {
            let reason = if challenge.is_empty() {
                "AUTHENTICATE failed".to_string()
            } else {
                challenge
            };
            return Err(SieveError::auth_failed(reason));
        }

        codec.send_line_sensitive(&blob).await?;
        match codec.expect_ok().await {
            Ok(_) => {
                self.phase = SessionPhase::Authenticated;
                log::info!("[managesieve] authenticated as {}", self.config.username);
                Ok(())
            }
            Err(e) if e.is_server_reported() => Err(SieveError::auth_failed(e.message)),
            Err(e) => Err(e),
        }
    }

    /// Best-effort LOGOUT, then release the transport. A failure of the
    /// logout exchange never prevents teardown.
    pub async fn close(&mut self) -> SieveResult<()> {
        self.require_phase(
            &[
                SessionPhase::Connected,
                SessionPhase::Encrypted,
                SessionPhase::Authenticated,
            ],
            "close",
        )?;

        if let Some(codec) = self.codec.as_mut() {
            let logout = async {
                codec.send_line("LOGOUT").await?;
                codec.expect_ok().await
            };
            if let Err(e) = logout.await {
                log::debug!("[managesieve] logout failed during close: {}", e);
            }
        }
        self.codec = None;
        self.phase = SessionPhase::Closed;
        Ok(())
    }

    // ─── Script commands (Authenticated only) ────────────────────────

    /// Upload a script body under `name`, using literal framing.
    pub async fn put_script(&mut self, name: &str, body: &[u8]) -> SieveResult<()> {
        self.require_phase(&[SessionPhase::Authenticated], "PUTSCRIPT")?;
        parser::validate_script_name(name)?;

        let (line, payload) = protocol::encode_put_script(name, body);
        let codec = self.codec_mut()?;
        // Non-synchronizing literal: command line, then the announced
        // bytes immediately, then the line terminator.
        codec.send_line(&line).await?;
        codec.write_raw(&payload).await?;
        codec.write_raw(b"\r\n").await?;
        codec.expect_ok().await?;
        Ok(())
    }

    /// Mark `name` as the active script.
    pub async fn set_active(&mut self, name: &str) -> SieveResult<()> {
        self.require_phase(&[SessionPhase::Authenticated], "SETACTIVE")?;
        parser::validate_script_name(name)?;
        self.simple_command(&format!("SETACTIVE {}", protocol::quote_name(name)))
            .await
    }

    /// Deactivate all scripts (`SETACTIVE ""`).
    pub async fn deactivate_all(&mut self) -> SieveResult<()> {
        self.require_phase(&[SessionPhase::Authenticated], "SETACTIVE")?;
        self.simple_command("SETACTIVE \"\"").await
    }

    /// Remove a stored script.
    pub async fn delete_script(&mut self, name: &str) -> SieveResult<()> {
        self.require_phase(&[SessionPhase::Authenticated], "DELETESCRIPT")?;
        parser::validate_script_name(name)?;
        self.simple_command(&format!("DELETESCRIPT {}", protocol::quote_name(name)))
            .await
    }

    /// List stored scripts with their active flag.
    pub async fn list_scripts(&mut self) -> SieveResult<Vec<ScriptEntry>> {
        self.require_phase(&[SessionPhase::Authenticated], "LISTSCRIPTS")?;
        let codec = self.codec_mut()?;
        codec.send_line("LISTSCRIPTS").await?;
        let resp = codec.expect_ok().await?;
        parser::parse_listing(&resp.data)
    }

    // ─── Helpers ─────────────────────────────────────────────────────

    async fn simple_command(&mut self, line: &str) -> SieveResult<()> {
        let codec = self.codec_mut()?;
        codec.send_line(line).await?;
        codec.expect_ok().await?;
        Ok(())
    }

    fn codec_mut(&mut self) -> SieveResult<&mut SieveCodec> {
        self.codec.as_mut().ok_or_else(missing_transport)
    }

    fn require_phase(&self, allowed: &[SessionPhase], op: &str) -> SieveResult<()> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(SieveError::new(
                SieveErrorKind::InvalidState,
                format!("{} is not valid in the {:?} phase", op, self.phase),
            ))
        }
    }
}

fn missing_transport() -> SieveError {
    SieveError::invalid_state("Session has no open transport")
}

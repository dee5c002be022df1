//! TLS helpers for implicit TLS and STARTTLS.
//!
//! - Builds a `tokio_rustls::TlsConnector` with either the platform trust
//!   store or a verifier that accepts any certificate.
//! - Provides `upgrade_to_tls` for wrapping an existing plain codec after
//!   a successful STARTTLS exchange.

use crate::managesieve::error::{SieveError, SieveResult};
use crate::managesieve::protocol::{ReadHalf, SieveCodec, WriteHalf};
use rustls::pki_types::ServerName;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;

/// Build a `TlsConnector` according to our configuration.
pub fn build_tls_connector(accept_invalid_certs: bool) -> SieveResult<TlsConnector> {
    let config = if accept_invalid_certs {
        rustls::ClientConfig::builder()
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyCert))
            .with_no_client_auth()
    } else {
        let mut roots = rustls::RootCertStore::empty();
        for cert in rustls_native_certs::load_native_certs().certs {
            roots.add(cert).ok();
        }
        if roots.is_empty() {
            return Err(SieveError::tls_failed("No trusted root certificates found"));
        }
        rustls::ClientConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth()
    };
    Ok(TlsConnector::from(Arc::new(config)))
}

/// Resolve the TLS server name used for identity verification.
pub fn server_name(host: &str) -> SieveResult<ServerName<'static>> {
    ServerName::try_from(host.to_string())
        .map_err(|_| SieveError::tls_failed(format!("Invalid TLS server name: {}", host)))
}

/// Upgrade an existing **plain** connection to TLS.
///
/// Called after a successful STARTTLS + OK reply. Consumes the plain
/// codec, performs the handshake, returns a new codec — the old handle is
/// gone by construction, never left alive alongside the ciphered one.
pub async fn upgrade_to_tls(
    codec: SieveCodec,
    host: &str,
    accept_invalid_certs: bool,
) -> SieveResult<SieveCodec> {
    let io_timeout = codec.io_timeout;
    let tcp = reunite_plain(codec)?;

    let connector = build_tls_connector(accept_invalid_certs)?;
    let tls = connector
        .connect(server_name(host)?, tcp)
        .await
        .map_err(|e| SieveError::tls_failed(format!("STARTTLS handshake: {}", e)))?;

    Ok(SieveCodec::from_tls(tls, io_timeout))
}

/// Reunite the read + write halves back into a `TcpStream`.
/// Only works when both halves are `Plain`.
fn reunite_plain(codec: SieveCodec) -> SieveResult<TcpStream> {
    let rd = match codec.reader {
        ReadHalf::Plain(br) => br.into_inner(),
        ReadHalf::Tls(_) => {
            return Err(SieveError::protocol(
                "Cannot upgrade: connection is already TLS",
            ))
        }
    };
    let wr = match codec.writer {
        WriteHalf::Plain(w) => w,
        WriteHalf::Tls(_) => {
            return Err(SieveError::protocol(
                "Cannot upgrade: connection is already TLS",
            ))
        }
    };
    rd.reunite(wr)
        .map_err(|e| SieveError::protocol(format!("Reunite failed: {}", e)))
}

/// Certificate verifier that accepts anything. Selected only by the
/// explicit `accept_invalid_certs` switch.
#[derive(Debug)]
struct AcceptAnyCert;

impl rustls::client::danger::ServerCertVerifier for AcceptAnyCert {
    fn verify_server_cert(
        &self,
        _end_entity: &rustls::pki_types::CertificateDer<'_>,
        _intermediates: &[rustls::pki_types::CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: rustls::pki_types::UnixTime,
    ) -> Result<rustls::client::danger::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::danger::ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        vec![
            rustls::SignatureScheme::RSA_PKCS1_SHA256,
            rustls::SignatureScheme::RSA_PKCS1_SHA384,
            rustls::SignatureScheme::RSA_PKCS1_SHA512,
            rustls::SignatureScheme::ECDSA_NISTP256_SHA256,
            rustls::SignatureScheme::ECDSA_NISTP384_SHA384,
            rustls::SignatureScheme::ECDSA_NISTP521_SHA512,
            rustls::SignatureScheme::RSA_PSS_SHA256,
            rustls::SignatureScheme::RSA_PSS_SHA384,
            rustls::SignatureScheme::RSA_PSS_SHA512,
            rustls::SignatureScheme::ED25519,
        ]
    }
}

//! Session lifecycle tests against a scripted stub server.

use mailadm_managesieve::managesieve::error::SieveErrorKind;
use mailadm_managesieve::managesieve::types::{
    SessionPhase, SieveConnectionConfig, SieveSecurityMode,
};
use mailadm_managesieve::SieveClient;
use std::future::Future;
use std::net::SocketAddr;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

const AUTH_LINE: &str = "AUTHENTICATE \"PLAIN\"";
// base64("\0user\0pass")
const AUTH_BLOB: &str = "AHVzZXIAcGFzcw==";

async fn spawn_server<F, Fut>(script: F) -> (SocketAddr, JoinHandle<()>)
where
    F: FnOnce(BufReader<OwnedReadHalf>, OwnedWriteHalf) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let (rd, wr) = stream.into_split();
        script(BufReader::new(rd), wr).await;
    });
    (addr, handle)
}

fn test_config(addr: SocketAddr) -> SieveConnectionConfig {
    SieveConnectionConfig {
        host: "127.0.0.1".to_string(),
        port: addr.port(),
        username: "user".to_string(),
        password: "pass".to_string(),
        security: SieveSecurityMode::None,
        accept_invalid_certs: false,
        timeout_secs: 5,
    }
}

async fn expect_line(reader: &mut BufReader<OwnedReadHalf>, expected: &str) {
    let mut line = String::new();
    reader.read_line(&mut line).await.unwrap();
    assert_eq!(line.trim_end_matches(['\r', '\n']), expected);
}

async fn send(writer: &mut OwnedWriteHalf, line: &str) {
    writer.write_all(line.as_bytes()).await.unwrap();
    writer.write_all(b"\r\n").await.unwrap();
}

async fn handle_auth(reader: &mut BufReader<OwnedReadHalf>, writer: &mut OwnedWriteHalf) {
    expect_line(reader, AUTH_LINE).await;
    send(writer, "+").await;
    expect_line(reader, AUTH_BLOB).await;
    send(writer, "OK Authenticated").await;
}

#[tokio::test]
async fn full_session_scenario() {
    let (addr, server) = spawn_server(|mut reader, mut writer| async move {
        send(&mut writer, "OK Ready").await;
        handle_auth(&mut reader, &mut writer).await;

        // PUTSCRIPT: command line announces the literal length; the body
        // plus its appended trailing newline follows immediately.
        let mut line = String::new();
        reader.read_line(&mut line).await.unwrap();
        assert_eq!(
            line.trim_end_matches(['\r', '\n']),
            "PUTSCRIPT \"test\" {21+}"
        );
        let mut literal = vec![0u8; 21];
        reader.read_exact(&mut literal).await.unwrap();
        assert_eq!(&literal, b"if true { discard; }\n");
        let mut terminator = String::new();
        reader.read_line(&mut terminator).await.unwrap();
        assert_eq!(terminator, "\r\n");
        send(&mut writer, "OK").await;

        expect_line(&mut reader, "LISTSCRIPTS").await;
        send(&mut writer, "\"test\" ACTIVE").await;
        send(&mut writer, "OK Listed").await;

        expect_line(&mut reader, "LOGOUT").await;
        send(&mut writer, "OK").await;
    })
    .await;

    let mut client = SieveClient::new(test_config(addr)).unwrap();
    client.connect().await.unwrap();
    assert_eq!(client.phase(), SessionPhase::Connected);

    client.authenticate().await.unwrap();
    assert_eq!(client.phase(), SessionPhase::Authenticated);

    client
        .put_script("test", b"if true { discard; }")
        .await
        .unwrap();

    let scripts = client.list_scripts().await.unwrap();
    assert_eq!(scripts.len(), 1);
    assert_eq!(scripts[0].name, "test");
    assert!(scripts[0].active);

    client.close().await.unwrap();
    assert_eq!(client.phase(), SessionPhase::Closed);

    server.await.unwrap();
}

#[tokio::test]
async fn putscript_rejection_carries_server_reason() {
    let (addr, server) = spawn_server(|mut reader, mut writer| async move {
        send(&mut writer, "OK Ready").await;
        handle_auth(&mut reader, &mut writer).await;

        let mut line = String::new();
        reader.read_line(&mut line).await.unwrap();
        let mut literal = vec![0u8; 9];
        reader.read_exact(&mut literal).await.unwrap();
        let mut terminator = String::new();
        reader.read_line(&mut terminator).await.unwrap();
        send(&mut writer, "NO Quota exceeded").await;
    })
    .await;

    let mut client = SieveClient::new(test_config(addr)).unwrap();
    client.connect().await.unwrap();
    client.authenticate().await.unwrap();

    let err = client.put_script("big", b"discard;").await.unwrap_err();
    assert_eq!(err.kind, SieveErrorKind::Rejected);
    assert_eq!(err.message, "Quota exceeded");

    server.await.unwrap();
}

#[tokio::test]
async fn commands_before_authenticate_are_rejected_locally() {
    let (addr, server) = spawn_server(|mut reader, mut writer| async move {
        send(&mut writer, "OK Ready").await;
        // The failed calls below must not have produced any bytes: the
        // very next thing on the wire is the AUTHENTICATE command.
        handle_auth(&mut reader, &mut writer).await;
    })
    .await;

    let mut client = SieveClient::new(test_config(addr)).unwrap();
    client.connect().await.unwrap();

    let err = client.put_script("x", b"keep;").await.unwrap_err();
    assert_eq!(err.kind, SieveErrorKind::InvalidState);
    let err = client.list_scripts().await.unwrap_err();
    assert_eq!(err.kind, SieveErrorKind::InvalidState);
    let err = client.delete_script("x").await.unwrap_err();
    assert_eq!(err.kind, SieveErrorKind::InvalidState);
    let err = client.set_active("x").await.unwrap_err();
    assert_eq!(err.kind, SieveErrorKind::InvalidState);

    client.authenticate().await.unwrap();
    assert_eq!(client.phase(), SessionPhase::Authenticated);

    server.await.unwrap();
}

#[tokio::test]
async fn malformed_continuation_fails_before_credentials() {
    let (addr, server) = spawn_server(|mut reader, mut writer| async move {
        send(&mut writer, "OK Ready").await;
        expect_line(&mut reader, AUTH_LINE).await;
        // A status line instead of the continuation marker.
        send(&mut writer, "NO not today").await;
        // No credential blob may follow; the client gives up and the
        // connection just closes.
        let mut line = String::new();
        let n = reader.read_line(&mut line).await.unwrap();
        assert_eq!(n, 0, "client sent credentials after a bad continuation");
    })
    .await;

    let mut client = SieveClient::new(test_config(addr)).unwrap();
    client.connect().await.unwrap();

    let err = client.authenticate().await.unwrap_err();
    assert_eq!(err.kind, SieveErrorKind::AuthFailed);
    assert_eq!(err.message, "NO not today");

    drop(client);
    server.await.unwrap();
}

#[tokio::test]
async fn rejected_credentials_fail_with_auth_error() {
    let (addr, server) = spawn_server(|mut reader, mut writer| async move {
        send(&mut writer, "OK Ready").await;
        expect_line(&mut reader, AUTH_LINE).await;
        send(&mut writer, "+").await;
        expect_line(&mut reader, AUTH_BLOB).await;
        send(&mut writer, "NO Invalid credentials").await;
    })
    .await;

    let mut client = SieveClient::new(test_config(addr)).unwrap();
    client.connect().await.unwrap();

    let err = client.authenticate().await.unwrap_err();
    assert_eq!(err.kind, SieveErrorKind::AuthFailed);
    assert_eq!(err.message, "Invalid credentials");

    server.await.unwrap();
}

#[tokio::test]
async fn close_survives_broken_transport() {
    let (addr, server) = spawn_server(|_reader, mut writer| async move {
        send(&mut writer, "OK Ready").await;
        // Drop both halves; the client's LOGOUT has no peer left.
    })
    .await;

    let mut client = SieveClient::new(test_config(addr)).unwrap();
    client.connect().await.unwrap();
    server.await.unwrap();

    // The logout failure is swallowed; the transport is still released.
    client.close().await.unwrap();
    assert_eq!(client.phase(), SessionPhase::Closed);

    let err = client.list_scripts().await.unwrap_err();
    assert_eq!(err.kind, SieveErrorKind::InvalidState);
}

#[tokio::test]
async fn bye_greeting_surfaces_as_server_bye() {
    let (addr, server) = spawn_server(|_reader, mut writer| async move {
        send(&mut writer, "BYE Too many connections").await;
    })
    .await;

    let mut client = SieveClient::new(test_config(addr)).unwrap();
    let err = client.connect().await.unwrap_err();
    assert_eq!(err.kind, SieveErrorKind::ServerBye);
    assert_eq!(err.message, "Too many connections");

    server.await.unwrap();
}

#[tokio::test]
async fn malformed_listing_line_is_a_protocol_error() {
    let (addr, server) = spawn_server(|mut reader, mut writer| async move {
        send(&mut writer, "OK Ready").await;
        handle_auth(&mut reader, &mut writer).await;
        expect_line(&mut reader, "LISTSCRIPTS").await;
        send(&mut writer, "not a quoted name").await;
        send(&mut writer, "OK").await;
    })
    .await;

    let mut client = SieveClient::new(test_config(addr)).unwrap();
    client.connect().await.unwrap();
    client.authenticate().await.unwrap();

    let err = client.list_scripts().await.unwrap_err();
    assert_eq!(err.kind, SieveErrorKind::Protocol);

    server.await.unwrap();
}

#[tokio::test]
async fn activate_and_delete_flow() {
    let (addr, server) = spawn_server(|mut reader, mut writer| async move {
        send(&mut writer, "OK Ready").await;
        handle_auth(&mut reader, &mut writer).await;
        expect_line(&mut reader, "SETACTIVE \"test\"").await;
        send(&mut writer, "OK").await;
        expect_line(&mut reader, "SETACTIVE \"\"").await;
        send(&mut writer, "OK").await;
        expect_line(&mut reader, "DELETESCRIPT \"test\"").await;
        send(&mut writer, "OK").await;
        expect_line(&mut reader, "LOGOUT").await;
        send(&mut writer, "OK").await;
    })
    .await;

    let mut client = SieveClient::new(test_config(addr)).unwrap();
    client.connect().await.unwrap();
    client.authenticate().await.unwrap();

    client.set_active("test").await.unwrap();
    client.deactivate_all().await.unwrap();
    client.delete_script("test").await.unwrap();

    // A name the encoder cannot represent is refused without touching
    // the transport.
    let err = client.put_script("bad\"name", b"keep;").await.unwrap_err();
    assert_eq!(err.kind, SieveErrorKind::InvalidName);

    client.close().await.unwrap();
    server.await.unwrap();
}

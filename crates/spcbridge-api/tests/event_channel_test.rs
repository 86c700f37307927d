#![allow(clippy::unwrap_used)]
// Push channel tests against a local tokio-tungstenite server.

use std::time::Duration;

use futures_util::SinkExt;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_util::sync::CancellationToken;
use url::Url;

use spcbridge_api::{CredentialPair, EventChannel, ReconnectConfig, StreamSignal};

fn fast_reconnect() -> ReconnectConfig {
    ReconnectConfig {
        initial_delay: Duration::from_millis(20),
        max_delay: Duration::from_millis(100),
        max_retries: Some(3),
    }
}

async fn next(channel: &mut EventChannel) -> StreamSignal {
    tokio::time::timeout(Duration::from_secs(5), channel.recv())
        .await
        .expect("timed out waiting for signal")
        .expect("channel closed")
}

/// Accept one connection, check the auth header, send frames, then close.
async fn serve_session(listener: &TcpListener, frames: &[&str], expected_auth: &str) {
    let (stream, _) = listener.accept().await.unwrap();
    let expected = expected_auth.to_owned();
    let mut ws = tokio_tungstenite::accept_hdr_async(
        stream,
        move |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
            let auth = req
                .headers()
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default();
            if auth == expected {
                Ok(resp)
            } else {
                let mut err = ErrorResponse::new(None);
                *err.status_mut() = StatusCode::UNAUTHORIZED;
                Err(err)
            }
        },
    )
    .await
    .unwrap();

    for frame in frames {
        ws.send(Message::text(*frame)).await.unwrap();
    }
    ws.close(None).await.unwrap();
}

#[tokio::test]
async fn frames_arrive_in_order_with_lifecycle_signals() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let creds = CredentialPair::new("ws_user", "ws_pwd");
    let auth = creds.basic_auth_header();

    let server = tokio::spawn(async move {
        serve_session(&listener, &[r#"{"type":"zone","id":1}"#, r#"{"type":"zone","id":2}"#], &auth)
            .await;
        serve_session(&listener, &[r#"{"type":"area","id":1}"#], &auth).await;
    });

    let cancel = CancellationToken::new();
    let url = Url::parse(&format!("ws://{addr}/ws/spc")).unwrap();
    let mut channel = EventChannel::connect(url, &creds, fast_reconnect(), cancel.clone());

    assert_eq!(next(&mut channel).await, StreamSignal::Connected);
    assert_eq!(
        next(&mut channel).await,
        StreamSignal::Frame(r#"{"type":"zone","id":1}"#.into())
    );
    assert_eq!(
        next(&mut channel).await,
        StreamSignal::Frame(r#"{"type":"zone","id":2}"#.into())
    );
    assert!(matches!(next(&mut channel).await, StreamSignal::Disconnected { .. }));

    // Reconnects and resumes.
    assert_eq!(next(&mut channel).await, StreamSignal::Connected);
    assert_eq!(
        next(&mut channel).await,
        StreamSignal::Frame(r#"{"type":"area","id":1}"#.into())
    );

    cancel.cancel();
    server.await.unwrap();
}

#[tokio::test]
async fn rejected_credentials_fail_without_retrying() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let _ = tokio_tungstenite::accept_hdr_async(
            stream,
            |_req: &Request, _resp: Response| -> Result<Response, ErrorResponse> {
                let mut err = ErrorResponse::new(None);
                *err.status_mut() = StatusCode::UNAUTHORIZED;
                Err(err)
            },
        )
        .await;
    });

    let creds = CredentialPair::new("ws_user", "wrong");
    let url = Url::parse(&format!("ws://{addr}/ws/spc")).unwrap();
    let mut channel = EventChannel::connect(url, &creds, fast_reconnect(), CancellationToken::new());

    assert!(matches!(next(&mut channel).await, StreamSignal::Failed { .. }));
    assert!(channel.recv().await.is_none());
}

#[tokio::test]
async fn gives_up_after_retry_ceiling() {
    // Bind then drop to get a port nobody listens on.
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };

    let creds = CredentialPair::new("ws_user", "ws_pwd");
    let url = Url::parse(&format!("ws://{addr}/ws/spc")).unwrap();
    let mut channel = EventChannel::connect(url, &creds, fast_reconnect(), CancellationToken::new());

    assert!(matches!(next(&mut channel).await, StreamSignal::Failed { .. }));
    assert!(channel.recv().await.is_none());
}

//! Gateway push channel with auto-reconnect.
//!
//! Connects to the gateway's `/ws/spc` endpoint with the *ws* credential
//! pair and forwards every text frame, in arrival order, through an
//! [`mpsc`] channel. Connection lifecycle is reported in-band as
//! [`StreamSignal::Connected`] / [`StreamSignal::Disconnected`] so the
//! consumer sees exactly where a gap in the stream begins and ends.
//!
//! # Example
//!
//! ```rust,ignore
//! use spcbridge_api::websocket::{EventChannel, ReconnectConfig, StreamSignal};
//! use tokio_util::sync::CancellationToken;
//!
//! let cancel = CancellationToken::new();
//! let mut channel = EventChannel::connect(
//!     client.ws_url()?,
//!     client.ws_credentials(),
//!     ReconnectConfig::default(),
//!     cancel.clone(),
//! );
//!
//! while let Some(signal) = channel.recv().await {
//!     if let StreamSignal::Frame(text) = signal {
//!         println!("{text}");
//!     }
//! }
//! ```

use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::{self, ClientRequestBuilder};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::auth::CredentialPair;
use crate::error::Error;

// ── Channel capacity ─────────────────────────────────────────────────

const SIGNAL_CHANNEL_CAPACITY: usize = 1024;

// ── StreamSignal ─────────────────────────────────────────────────────

/// One item of the ordered push stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamSignal {
    /// Handshake completed; frames follow.
    Connected,
    /// A raw text frame, untouched.
    Frame(String),
    /// An established session ended. Frames may have been missed.
    Disconnected { reason: String },
    /// The reconnect loop gave up. No further signals follow.
    Failed { reason: String },
}

// ── ReconnectConfig ──────────────────────────────────────────────────

/// Exponential backoff configuration for push channel reconnection.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt. Default: 1s.
    pub initial_delay: Duration,

    /// Upper bound on backoff delay. Default: 60s.
    pub max_delay: Duration,

    /// Maximum consecutive failed attempts before giving up.
    /// `None` means retry forever.
    pub max_retries: Option<u32>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            max_retries: None,
        }
    }
}

// ── EventChannel ─────────────────────────────────────────────────────

/// Handle to a running push channel.
///
/// Dropping the handle stops the background task at its next send; call
/// [`shutdown`](Self::shutdown) to stop it immediately.
pub struct EventChannel {
    signal_rx: mpsc::Receiver<StreamSignal>,
    cancel: CancellationToken,
}

impl EventChannel {
    /// Spawn the connection loop. Returns immediately; the first connection
    /// attempt happens in the background.
    pub fn connect(
        ws_url: Url,
        credentials: &CredentialPair,
        reconnect: ReconnectConfig,
        cancel: CancellationToken,
    ) -> Self {
        let (signal_tx, signal_rx) = mpsc::channel(SIGNAL_CHANNEL_CAPACITY);
        let auth_header = credentials.basic_auth_header();

        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            ws_loop(ws_url, auth_header, signal_tx, reconnect, task_cancel).await;
        });

        Self { signal_rx, cancel }
    }

    /// Next signal, or `None` once the loop has exited.
    pub async fn recv(&mut self) -> Option<StreamSignal> {
        self.signal_rx.recv().await
    }

    /// Signal the background task to shut down.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

// ── Background reconnection loop ─────────────────────────────────────

/// How a single session ended.
enum SessionEnd {
    /// The established connection dropped.
    Dropped(String),
    /// Cancelled or the receiver went away.
    Stop,
}

/// Main loop: connect → read → on drop or error, backoff → reconnect.
async fn ws_loop(
    ws_url: Url,
    auth_header: String,
    signal_tx: mpsc::Sender<StreamSignal>,
    reconnect: ReconnectConfig,
    cancel: CancellationToken,
) {
    let mut attempt: u32 = 0;

    loop {
        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = connect_and_read(&ws_url, &auth_header, &signal_tx, &cancel) => result,
        };

        match result {
            Ok(SessionEnd::Stop) => break,
            Ok(SessionEnd::Dropped(reason)) => {
                tracing::info!(%reason, "push channel disconnected, reconnecting");
                attempt = 0;
                if signal_tx
                    .send(StreamSignal::Disconnected { reason })
                    .await
                    .is_err()
                {
                    break;
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, attempt, "push channel connect failed");

                let exhausted = reconnect.max_retries.is_some_and(|max| attempt >= max);
                // Rejected credentials and other permanent errors end the loop.
                if exhausted || !e.is_transient() {
                    tracing::error!(
                        max_retries = ?reconnect.max_retries,
                        "push channel reconnection abandoned"
                    );
                    let _ = signal_tx
                        .send(StreamSignal::Failed {
                            reason: e.to_string(),
                        })
                        .await;
                    break;
                }
            }
        }

        let delay = calculate_backoff(attempt, &reconnect);
        tracing::info!(
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            attempt,
            "waiting before reconnect"
        );

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(delay) => {}
        }

        attempt = attempt.saturating_add(1);
    }

    tracing::debug!("push channel loop exiting");
}

// ── Single connection lifecycle ──────────────────────────────────────

/// Establish one connection and forward frames until it drops.
///
/// `Err` means the handshake never completed; once `Connected` has been
/// sent, every ending is reported as `Ok`.
async fn connect_and_read(
    url: &Url,
    auth_header: &str,
    signal_tx: &mpsc::Sender<StreamSignal>,
    cancel: &CancellationToken,
) -> Result<SessionEnd, Error> {
    tracing::info!(url = %url, "connecting to push channel");

    let uri: tungstenite::http::Uri = url
        .as_str()
        .parse()
        .map_err(|e: tungstenite::http::uri::InvalidUri| Error::WebSocketConnect(e.to_string()))?;

    let request = ClientRequestBuilder::new(uri).with_header("Authorization", auth_header);

    let (ws_stream, _response) = tokio_tungstenite::connect_async(request)
        .await
        .map_err(map_handshake_error)?;

    tracing::info!("push channel connected");
    if signal_tx.send(StreamSignal::Connected).await.is_err() {
        return Ok(SessionEnd::Stop);
    }

    let (_write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(SessionEnd::Stop),
            frame = read.next() => {
                let signal = match frame {
                    Some(Ok(tungstenite::Message::Text(text))) => {
                        StreamSignal::Frame(text.as_str().to_owned())
                    }
                    Some(Ok(tungstenite::Message::Close(frame))) => {
                        let reason = match frame {
                            Some(cf) => format!(
                                "closed by gateway (code {}): {}",
                                u16::from(cf.code),
                                cf.reason.as_str()
                            ),
                            None => "closed by gateway".to_owned(),
                        };
                        return Ok(SessionEnd::Dropped(reason));
                    }
                    Some(Ok(tungstenite::Message::Ping(_))) => {
                        tracing::trace!("push channel ping");
                        continue;
                    }
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => return Ok(SessionEnd::Dropped(e.to_string())),
                    None => return Ok(SessionEnd::Dropped("stream ended".to_owned())),
                };

                if signal_tx.send(signal).await.is_err() {
                    return Ok(SessionEnd::Stop);
                }
            }
        }
    }
}

fn map_handshake_error(e: tungstenite::Error) -> Error {
    if let tungstenite::Error::Http(ref response) = e {
        let status = response.status();
        if status == tungstenite::http::StatusCode::UNAUTHORIZED
            || status == tungstenite::http::StatusCode::FORBIDDEN
        {
            return Error::Authentication {
                message: format!("push channel rejected ws credentials (HTTP {})", status.as_u16()),
            };
        }
    }
    Error::WebSocketConnect(e.to_string())
}

// ── Backoff calculation ──────────────────────────────────────────────

/// Exponential backoff with jitter.
///
/// `delay = min((initial * 2^attempt) * jitter, max)`
///
/// Jitter is +-25%, seeded from the attempt number so it is reproducible.
/// The cap applies after jitter, so no delay ever exceeds `max_delay`.
pub fn calculate_backoff(attempt: u32, config: &ReconnectConfig) -> Duration {
    let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
    let base = config.initial_delay.as_secs_f64() * 2.0_f64.powi(exponent);

    let jitter_factor = 1.0 + 0.25 * (f64::from(attempt) * 7.3).sin();
    let with_jitter = (base * jitter_factor)
        .min(config.max_delay.as_secs_f64())
        .max(0.0);

    Duration::from_secs_f64(with_jitter)
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_reconnect_config() {
        let config = ReconnectConfig::default();
        assert_eq!(config.initial_delay, Duration::from_secs(1));
        assert_eq!(config.max_delay, Duration::from_secs(60));
        assert!(config.max_retries.is_none());
    }

    #[test]
    fn first_attempt_waits_initial_delay() {
        let config = ReconnectConfig::default();
        assert_eq!(calculate_backoff(0, &config), Duration::from_secs(1));
    }

    #[test]
    fn backoff_grows_over_attempts() {
        let config = ReconnectConfig::default();

        let d0 = calculate_backoff(0, &config);
        let d2 = calculate_backoff(2, &config);
        let d4 = calculate_backoff(4, &config);

        assert!(d2 > d0, "d2 ({d2:?}) should be greater than d0 ({d0:?})");
        assert!(d4 > d2, "d4 ({d4:?}) should be greater than d2 ({d2:?})");
    }

    #[test]
    fn backoff_never_exceeds_max_delay() {
        let config = ReconnectConfig::default();
        for attempt in 0..200 {
            let delay = calculate_backoff(attempt, &config);
            assert!(
                delay <= Duration::from_secs(60),
                "attempt {attempt} waited {delay:?}"
            );
        }
    }

    #[test]
    fn backoff_reaches_cap() {
        let config = ReconnectConfig::default();
        assert_eq!(calculate_backoff(30, &config), Duration::from_secs(60));
    }
}

// ── Core error types ──
//
// User-facing errors from spcbridge-core. Consumers never see HTTP status
// codes or JSON parse failures directly; the `From<spcbridge_api::Error>`
// impl translates transport-layer errors into domain variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    /// Network failure, or the bridge is not `Synced`.
    #[error("Cannot reach gateway at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    // ── Command errors ───────────────────────────────────────────────
    /// The gateway answered with a non-zero result code.
    #[error("Command rejected by gateway (code {code}): {message}")]
    CommandRejected { code: u32, message: String },

    /// Bad target, unknown action or malformed argument. Never sent to the gateway.
    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    // ── Data errors ──────────────────────────────────────────────────
    /// Malformed frame or snapshot.
    #[error("Decode error: {message}")]
    Decode { message: String },

    #[error("Entity not found: {entity_type} with id {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            message: message.into(),
        }
    }

    pub(crate) fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    pub(crate) fn not_found(entity_type: impl ToString, id: u32) -> Self {
        Self::NotFound {
            entity_type: entity_type.to_string(),
            identifier: id.to_string(),
        }
    }

    /// Whether a retry with backoff may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConnectionFailed { .. } | Self::Timeout { .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<spcbridge_api::Error> for CoreError {
    fn from(err: spcbridge_api::Error) -> Self {
        use spcbridge_api::Error as ApiError;

        match err {
            ApiError::Authentication { message } => CoreError::AuthenticationFailed { message },
            ApiError::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_ms: 0 }
                } else {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                }
            }
            ApiError::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            ApiError::Timeout { timeout_secs } => CoreError::Timeout {
                timeout_ms: timeout_secs.saturating_mul(1000),
            },
            ApiError::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            ApiError::Gateway { status, message } if status >= 500 => {
                CoreError::ConnectionFailed {
                    url: String::new(),
                    reason: format!("gateway error (HTTP {status}): {message}"),
                }
            }
            ApiError::Gateway { status, message } => CoreError::Internal(format!(
                "gateway error (HTTP {status}): {message}"
            )),
            ApiError::WebSocketConnect(reason) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("push channel connection failed: {reason}"),
            },
            ApiError::WebSocketClosed { code, reason } => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("push channel closed (code {code}): {reason}"),
            },
            ApiError::Deserialization { message, body: _ } => CoreError::Decode { message },
        }
    }
}

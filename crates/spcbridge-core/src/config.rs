// ── Runtime connection configuration ──
//
// These types describe *how* to reach a gateway. They carry credential
// data and connection tuning, but never touch disk. The CLI builds a
// `BridgeConfig` from its profile and hands it in.

use std::time::Duration;

use spcbridge_api::{BridgeCredentials, ReconnectConfig, TlsMode, TransportConfig};
use url::Url;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification. Default, since gateways ship self-signed.
    #[default]
    DangerAcceptInvalid,
}

/// Configuration for one gateway connection.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Gateway URL, e.g. `http://192.168.1.50:8088`.
    pub url: Url,
    /// Push endpoint override. Derived from `url` when `None`.
    pub ws_url: Option<Url>,
    /// The get / put / ws credential pairs.
    pub credentials: BridgeCredentials,
    pub tls: TlsVerification,
    /// HTTP request timeout.
    pub timeout: Duration,
    /// Per-command timeout; the target's slot is released when it fires.
    pub command_timeout: Duration,
    /// Snapshot fetch attempts after the first failure. `None` retries forever.
    pub max_connect_retries: Option<u32>,
    /// Push channel backoff.
    pub reconnect: ReconnectConfig,
    /// Open the push channel after the initial load.
    pub push_enabled: bool,
}

impl BridgeConfig {
    pub fn new(url: Url, credentials: BridgeCredentials) -> Self {
        Self {
            url,
            ws_url: None,
            credentials,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            command_timeout: Duration::from_secs(10),
            max_connect_retries: Some(3),
            reconnect: ReconnectConfig::default(),
            push_enabled: true,
        }
    }

    pub(crate) fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: match &self.tls {
                TlsVerification::SystemDefaults => TlsMode::System,
                TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
                TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
            },
            timeout: self.timeout,
            ..TransportConfig::default()
        }
    }
}

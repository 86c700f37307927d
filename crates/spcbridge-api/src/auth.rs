use secrecy::{ExposeSecret, SecretString};

/// Which gateway channel a credential pair unlocks.
///
/// Marker enum (no data) -- the actual secrets live in [`BridgeCredentials`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Read-only HTTP requests (`GET /spc/...`).
    Get,
    /// State-changing HTTP requests (`PUT /spc/...`).
    Put,
    /// The WebSocket push channel.
    Ws,
}

/// A username/password pair for one gateway channel.
#[derive(Debug, Clone)]
pub struct CredentialPair {
    pub username: String,
    pub password: SecretString,
}

impl CredentialPair {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }

    /// Value for an `Authorization: Basic ...` header.
    pub fn basic_auth_header(&self) -> String {
        use base64::Engine;
        use base64::engine::general_purpose::STANDARD;

        let raw = format!("{}:{}", self.username, self.password.expose_secret());
        format!("Basic {}", STANDARD.encode(raw))
    }
}

/// The three credential sets the gateway requires.
///
/// Each pair is used only for its own channel; the client never falls
/// back from one to another.
#[derive(Debug, Clone)]
pub struct BridgeCredentials {
    pub get: CredentialPair,
    pub put: CredentialPair,
    pub ws: CredentialPair,
}

impl BridgeCredentials {
    pub fn for_channel(&self, channel: Channel) -> &CredentialPair {
        match channel {
            Channel::Get => &self.get,
            Channel::Put => &self.put,
            Channel::Ws => &self.ws,
        }
    }
}

impl Default for BridgeCredentials {
    /// Factory defaults of a freshly installed gateway.
    fn default() -> Self {
        Self {
            get: CredentialPair::new("get_user", "get_pwd"),
            put: CredentialPair::new("put_user", "put_pwd"),
            ws: CredentialPair::new("ws_user", "ws_pwd"),
        }
    }
}

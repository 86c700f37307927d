// spcbridge-api: Async Rust client for the Lundix SPC Bridge gateway (HTTP + WebSocket)

pub mod auth;
pub mod client;
pub mod error;
pub mod models;
pub mod transport;
pub mod websocket;

pub use auth::{BridgeCredentials, Channel, CredentialPair};
pub use client::{BridgeClient, DEFAULT_PORT};
pub use error::Error;
pub use models::{
    CommandResponse, RawArea, RawArmStatus, RawDoor, RawOutput, RawPanel, RawSnapshot, RawUser,
    RawZone,
};
pub use transport::{TlsMode, TransportConfig};
pub use websocket::{EventChannel, ReconnectConfig, StreamSignal};

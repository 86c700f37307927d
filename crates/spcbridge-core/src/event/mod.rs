// ── Event processing ──
//
// Decodes push frames, applies them to the state store and publishes
// what changed. Also owns the per-connection sync state machine:
//
//   Loading ──snapshot applied──▶ Synced ──transport lost──▶ Reconnecting
//      ▲                                                         │
//      └──────────────────────reconnected────────────────────────┘

pub mod change;
pub mod decode;
pub mod processor;

use serde::Serialize;
use strum::Display;

pub use change::{ChangeCause, ChangeSet};
pub use decode::{EntityUpdate, Frame, decode_frame};
pub use processor::{EventProcessor, FrameOutcome};

/// Sync state of one gateway connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SyncState {
    /// Snapshot fetch in progress.
    Loading,
    /// Store mirrors the gateway; events are applied live.
    Synced,
    /// Transport lost. Store content is stale and flagged unreliable.
    Reconnecting,
}

/// One edge of the state machine, as broadcast to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SyncTransition {
    pub from: SyncState,
    pub to: SyncState,
}

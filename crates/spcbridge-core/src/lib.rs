// spcbridge-core: State store, event processing and command dispatch between
// spcbridge-api and consumers (CLI, home-automation adapters).

pub mod bridge;
pub mod command;
pub mod config;
mod convert;
pub mod error;
pub mod event;
pub mod model;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use bridge::Bridge;
pub use command::{
    Action, ArmRequest, ArmStatus, Command, CommandDispatcher, CommandResponse, PanelGateway,
};
pub use config::{BridgeConfig, TlsVerification};
pub use error::CoreError;
pub use event::{
    ChangeCause, ChangeSet, EntityUpdate, EventProcessor, Frame, FrameOutcome, SyncState,
    SyncTransition, decode_frame,
};
pub use store::{Snapshot, StateStore};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    Area, ArmMode, Door, DoorMode, EntityKind, EntityRef, Output, PANEL_ID, Panel, User, Zone,
    ZoneState, ZoneType,
};

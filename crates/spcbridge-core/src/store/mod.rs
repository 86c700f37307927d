// ── State store ──
//
// In-memory mirror of the gateway. One writer path (snapshot load and
// event application share a mutex); readers load the current entity set
// through `ArcSwap` and never block.

mod collection;
mod state_store;

pub use state_store::StateStore;

use crate::model::{Area, Door, Output, Panel, User, Zone};

/// A full configuration + state dump, already converted to domain types.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub panel: Panel,
    pub areas: Vec<Area>,
    pub zones: Vec<Zone>,
    pub outputs: Vec<Output>,
    pub doors: Vec<Door>,
    pub users: Vec<User>,
}

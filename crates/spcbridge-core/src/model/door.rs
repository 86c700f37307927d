use serde::{Deserialize, Serialize};

use super::modes::DoorMode;

/// An access-control point.
///
/// The `*_granted` / `*_denied` fields hold the user last seen at the
/// reader for that direction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Door {
    pub id: u32,
    pub name: String,
    pub mode: DoorMode,
    pub entry_granted: Option<String>,
    pub entry_denied: Option<String>,
    pub exit_granted: Option<String>,
    pub exit_denied: Option<String>,
}

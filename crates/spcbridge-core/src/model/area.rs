// ── Area domain type ──

use serde::{Deserialize, Serialize};

use super::modes::ArmMode;

/// A partition of zones sharing one set/unset state.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub id: u32,
    pub name: String,
    pub mode: ArmMode,

    pub a_enabled: bool,
    pub b_enabled: bool,
    pub a_name: Option<String>,
    pub b_name: Option<String>,
    pub exit_time: Option<u32>,
    pub entry_time: Option<u32>,

    pub intrusion: bool,
    pub fire: bool,
    pub tamper: bool,
    pub problem: bool,
    pub verified: bool,
    pub alarm_status: Option<String>,

    /// User who last set the area.
    pub set_user: Option<String>,
    /// User who last unset the area.
    pub unset_user: Option<String>,
    pub changed_by: Option<String>,

    /// Zones in this area. Non-owning: zones are looked up in the store.
    pub zone_ids: Vec<u32>,
}

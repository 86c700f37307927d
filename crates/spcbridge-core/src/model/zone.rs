// ── Zone domain type ──

use serde::{Deserialize, Serialize};

use super::modes::{ZoneState, ZoneType};

/// A single sensor input.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: u32,
    pub name: String,
    pub zone_type: ZoneType,
    pub state: ZoneState,
    pub inhibited: bool,
    pub isolated: bool,
    pub tamper: bool,
    pub problem: bool,
    pub intrusion: bool,
    pub fire: bool,
    pub alarm_status: Option<String>,
    /// Owning area. Always resolves in the store.
    pub area_id: u32,
}

impl Zone {
    /// Excluded from setting, either temporarily or permanently.
    pub fn is_bypassed(&self) -> bool {
        self.inhibited || self.isolated
    }
}

// ── Panel domain type ──

use serde::{Deserialize, Serialize};

use super::entity_ref::PANEL_ID;
use super::modes::ArmMode;

/// The alarm control unit. One per connection.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Panel {
    pub id: u32,
    pub serial: Option<String>,
    pub model: Option<String>,
    pub firmware: Option<String>,

    // Global alarm flags
    pub intrusion: bool,
    pub fire: bool,
    pub tamper: bool,
    pub problem: bool,
    pub verified: bool,

    pub mode: ArmMode,
    pub alarm_status: Option<String>,

    // Part-set configuration
    pub a_enabled: bool,
    pub b_enabled: bool,
    pub a_name: Option<String>,
    pub b_name: Option<String>,
    pub exit_time: Option<u32>,
    pub entry_time: Option<u32>,

    /// Last panel log entry, as the raw JSON the gateway pushed.
    pub last_event: Option<String>,
    pub changed_by: Option<String>,
    pub area_ids: Vec<u32>,
}

impl Default for Panel {
    fn default() -> Self {
        Self {
            id: PANEL_ID,
            serial: None,
            model: None,
            firmware: None,
            intrusion: false,
            fire: false,
            tamper: false,
            problem: false,
            verified: false,
            mode: ArmMode::Unknown,
            alarm_status: None,
            a_enabled: false,
            b_enabled: false,
            a_name: None,
            b_name: None,
            exit_time: None,
            entry_time: None,
            last_event: None,
            changed_by: None,
            area_ids: Vec::new(),
        }
    }
}

impl Panel {
    /// Any global alarm condition active.
    pub fn in_alarm(&self) -> bool {
        self.intrusion || self.fire || self.tamper
    }
}

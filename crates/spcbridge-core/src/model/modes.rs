// ── Mode and state enums ──

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Arm mode of the panel or an area.
///
/// Gateway wire codes are 0..=6 in declaration order; anything else
/// decodes to `Unknown` rather than failing.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ArmMode {
    Unset,
    PartSetA,
    PartSetB,
    FullSet,
    PartlySetA,
    PartlySetB,
    PartlyFullSet,
    #[default]
    Unknown,
}

impl ArmMode {
    pub fn from_wire(code: u32) -> Self {
        match code {
            0 => Self::Unset,
            1 => Self::PartSetA,
            2 => Self::PartSetB,
            3 => Self::FullSet,
            4 => Self::PartlySetA,
            5 => Self::PartlySetB,
            6 => Self::PartlyFullSet,
            _ => Self::Unknown,
        }
    }

    /// Any set or partly-set mode.
    pub fn is_armed(self) -> bool {
        !matches!(self, Self::Unset | Self::Unknown)
    }

    /// A transition that has not completed for every area.
    pub fn is_partial(self) -> bool {
        matches!(
            self,
            Self::PartlySetA | Self::PartlySetB | Self::PartlyFullSet
        )
    }
}

/// Lock mode of an access-controlled door.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DoorMode {
    Normal,
    Locked,
    Unlocked,
    #[default]
    Unknown,
}

impl DoorMode {
    pub fn from_wire(code: u32) -> Self {
        match code {
            0 => Self::Normal,
            1 => Self::Locked,
            2 => Self::Unlocked,
            _ => Self::Unknown,
        }
    }
}

/// Sensor class of a zone.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ZoneType {
    Motion,
    Door,
    Window,
    Smoke,
    Fire,
    #[default]
    Other,
}

impl ZoneType {
    pub fn from_wire(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "motion" | "pir" | "alarm" => Self::Motion,
            "door" | "entry_exit" | "entry/exit" => Self::Door,
            "window" => Self::Window,
            "smoke" => Self::Smoke,
            "fire" => Self::Fire,
            _ => Self::Other,
        }
    }

    pub fn is_fire(self) -> bool {
        matches!(self, Self::Fire | Self::Smoke)
    }
}

/// Input state reported for a zone.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ZoneState {
    Closed,
    Open,
    Short,
    Disconnected,
    Masked,
    Offline,
    #[default]
    Unknown,
}

impl ZoneState {
    pub fn from_wire(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "closed" | "0" => Self::Closed,
            "open" | "1" => Self::Open,
            "short" => Self::Short,
            "disconnected" | "disconnect" => Self::Disconnected,
            "masked" | "pir_masked" => Self::Masked,
            "offline" => Self::Offline,
            _ => Self::Unknown,
        }
    }
}

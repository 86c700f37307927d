// Arm-status diagnostics: which areas would refuse to arm, and why.

use serde::Serialize;
use spcbridge_api::RawArmStatus;
use strum::{Display, IntoStaticStr};

use crate::error::CoreError;

/// Arm mode to query, normalised from free-form input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ArmRequest {
    Set,
    SetA,
    SetB,
    /// Sent to the gateway as `disarm`.
    #[strum(serialize = "disarm")]
    #[serde(rename = "disarm")]
    Unset,
}

impl ArmRequest {
    /// Normalise by prefix: `set_a*`, `set_b*`, `set*`, `disarm*` / `unset*`.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let mode = raw.trim().to_ascii_lowercase();
        if mode.starts_with("set_a") {
            Ok(Self::SetA)
        } else if mode.starts_with("set_b") {
            Ok(Self::SetB)
        } else if mode.starts_with("set") {
            Ok(Self::Set)
        } else if mode.starts_with("disarm") || mode.starts_with("unset") {
            Ok(Self::Unset)
        } else {
            Err(CoreError::validation(format!("unknown arm mode '{raw}'")))
        }
    }

    pub fn as_wire(self) -> &'static str {
        self.into()
    }
}

/// Blocking reasons for one area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArmStatus {
    pub area_id: u32,
    pub reasons: Vec<String>,
}

impl ArmStatus {
    /// No reasons means the area would arm.
    pub fn is_ready(&self) -> bool {
        self.reasons.is_empty()
    }
}

impl From<RawArmStatus> for ArmStatus {
    fn from(raw: RawArmStatus) -> Self {
        Self {
            area_id: raw.area_id,
            reasons: raw.reasons,
        }
    }
}

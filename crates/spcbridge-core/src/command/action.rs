use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

use crate::error::CoreError;
use crate::model::EntityKind;

/// A command verb, as sent in the gateway's URL path.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Action {
    // ── Panel / area ────────────────────────────────────────────────
    Set,
    SetA,
    SetB,
    Unset,
    ClearAlerts,

    // ── Zone ────────────────────────────────────────────────────────
    Inhibit,
    Deinhibit,
    Isolate,
    Deisolate,
    Restore,

    // ── Output ──────────────────────────────────────────────────────
    On,
    Off,

    // ── Door ────────────────────────────────────────────────────────
    Open,
    OpenPermanently,
    Lock,
    Unlock,
    Normal,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// Whether this action is valid for entities of `kind`.
    pub fn applies_to(self, kind: EntityKind) -> bool {
        use Action as A;
        match kind {
            EntityKind::Panel | EntityKind::Area => {
                matches!(self, A::Set | A::SetA | A::SetB | A::Unset | A::ClearAlerts)
            }
            EntityKind::Zone => matches!(
                self,
                A::Inhibit | A::Deinhibit | A::Isolate | A::Deisolate | A::Restore
            ),
            EntityKind::Output => matches!(self, A::On | A::Off),
            EntityKind::Door => matches!(
                self,
                A::Open | A::OpenPermanently | A::Lock | A::Unlock | A::Normal
            ),
            EntityKind::User => false,
        }
    }

    /// Every action accepted by `kind`, in declaration order.
    pub fn for_kind(kind: EntityKind) -> Vec<Action> {
        Action::iter().filter(|a| a.applies_to(kind)).collect()
    }

    /// Parse `raw` and check it against `kind`.
    pub fn parse_for(kind: EntityKind, raw: &str) -> Result<Action, CoreError> {
        let action: Action = raw
            .parse()
            .map_err(|_| CoreError::validation(format!("unknown action '{raw}'")))?;
        if !action.applies_to(kind) {
            return Err(CoreError::validation(format!(
                "action '{action}' does not apply to {kind}"
            )));
        }
        Ok(action)
    }
}

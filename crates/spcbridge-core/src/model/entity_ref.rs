// ── Entity identity ──
//
// Every notification and every command names its target with an
// `EntityRef`: an explicit kind tag plus the gateway-assigned id.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::error::CoreError;

/// The panel is a singleton; the gateway always reports it as id 1.
pub const PANEL_ID: u32 = 1;

/// Kind of SPC entity.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum EntityKind {
    Panel,
    Area,
    Zone,
    Output,
    Door,
    User,
}

impl EntityKind {
    /// Path segment used by the gateway (`/spc/{kind}/...`).
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// Typed reference to one entity: `(kind, id)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: u32,
}

impl EntityRef {
    pub fn new(kind: EntityKind, id: u32) -> Self {
        Self { kind, id }
    }

    pub fn panel() -> Self {
        Self::new(EntityKind::Panel, PANEL_ID)
    }

    pub fn area(id: u32) -> Self {
        Self::new(EntityKind::Area, id)
    }

    pub fn zone(id: u32) -> Self {
        Self::new(EntityKind::Zone, id)
    }

    pub fn output(id: u32) -> Self {
        Self::new(EntityKind::Output, id)
    }

    pub fn door(id: u32) -> Self {
        Self::new(EntityKind::Door, id)
    }

    pub fn user(id: u32) -> Self {
        Self::new(EntityKind::User, id)
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// Parses `zone:10`, or bare `panel`.
impl FromStr for EntityRef {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, id) = match s.split_once(':') {
            Some((kind, id)) => (kind, Some(id)),
            None => (s, None),
        };
        let kind: EntityKind = kind
            .trim()
            .parse()
            .map_err(|_| CoreError::validation(format!("unknown entity kind: {kind:?}")))?;

        let id = match (kind, id) {
            (EntityKind::Panel, None) => PANEL_ID,
            (_, Some(id)) => id
                .trim()
                .parse()
                .map_err(|_| CoreError::validation(format!("invalid entity id: {id:?}")))?,
            (_, None) => return Err(CoreError::validation(format!("missing id for {kind}"))),
        };
        Ok(Self { kind, id })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn display_and_parse_agree() {
        let r = EntityRef::zone(10);
        assert_eq!(r.to_string(), "zone:10");
        assert_eq!("zone:10".parse::<EntityRef>().unwrap(), r);
    }

    #[test]
    fn bare_panel_parses_to_singleton() {
        assert_eq!("panel".parse::<EntityRef>().unwrap(), EntityRef::panel());
    }

    #[test]
    fn kind_without_id_is_rejected() {
        assert!("door".parse::<EntityRef>().is_err());
        assert!("widget:1".parse::<EntityRef>().is_err());
    }

    #[test]
    fn kind_parses_case_insensitively() {
        assert_eq!("Output".parse::<EntityKind>().unwrap(), EntityKind::Output);
        assert_eq!(EntityKind::Door.as_str(), "door");
    }
}

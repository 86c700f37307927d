// Include metadata: which entities a consumer shows, and as what.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use spcbridge_core::Zone;

use crate::ConfigError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Inclusion {
    #[default]
    Include,
    Exclude,
}

/// How a zone is presented, or whether it is hidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ZoneClass {
    Exclude,
    Motion,
    Door,
    Window,
    Smoke,
    Other,
}

impl ZoneClass {
    /// Default class when none is configured.
    pub fn default_for(zone: &Zone) -> Self {
        if zone.zone_type.is_fire() {
            Self::Smoke
        } else {
            Self::Motion
        }
    }
}

/// Per-profile include tables, keyed by entity id.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct IncludeConfig {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub areas: BTreeMap<String, Inclusion>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub zones: BTreeMap<String, ZoneClass>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub outputs: BTreeMap<String, Inclusion>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub doors: BTreeMap<String, Inclusion>,
}

impl IncludeConfig {
    pub fn area(&self, id: u32) -> Inclusion {
        lookup(&self.areas, id).unwrap_or_default()
    }

    pub fn output(&self, id: u32) -> Inclusion {
        lookup(&self.outputs, id).unwrap_or_default()
    }

    pub fn door(&self, id: u32) -> Inclusion {
        lookup(&self.doors, id).unwrap_or_default()
    }

    pub fn zone(&self, zone: &Zone) -> ZoneClass {
        lookup(&self.zones, zone.id).unwrap_or_else(|| ZoneClass::default_for(zone))
    }

    /// Every key must be an entity id as the gateway writes it.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_keys("areas", self.areas.keys())?;
        check_keys("zones", self.zones.keys())?;
        check_keys("outputs", self.outputs.keys())?;
        check_keys("doors", self.doors.keys())
    }
}

fn check_keys<'a>(table: &str, keys: impl Iterator<Item = &'a String>) -> Result<(), ConfigError> {
    for key in keys {
        // "03" would parse but never match a lookup.
        let canonical = key.parse::<u32>().is_ok_and(|id| id.to_string() == *key);
        if !canonical {
            return Err(ConfigError::validation(
                format!("include.{table}.{key}"),
                "key must be an entity id without leading zeros",
            ));
        }
    }
    Ok(())
}

fn lookup<T: Copy>(table: &BTreeMap<String, T>, id: u32) -> Option<T> {
    table.get(&id.to_string()).copied()
}

#[cfg(test)]
mod tests {
    use spcbridge_core::ZoneType;

    use super::*;

    fn zone(id: u32, zone_type: ZoneType) -> Zone {
        Zone {
            id,
            zone_type,
            area_id: 1,
            ..Zone::default()
        }
    }

    #[test]
    fn zone_defaults_follow_type() {
        let include = IncludeConfig::default();
        assert_eq!(include.zone(&zone(1, ZoneType::Fire)), ZoneClass::Smoke);
        assert_eq!(include.zone(&zone(2, ZoneType::Smoke)), ZoneClass::Smoke);
        assert_eq!(include.zone(&zone(3, ZoneType::Door)), ZoneClass::Motion);
    }

    #[test]
    fn configured_values_win() {
        let include = IncludeConfig {
            zones: BTreeMap::from([("3".into(), ZoneClass::Exclude)]),
            doors: BTreeMap::from([("1".into(), Inclusion::Exclude)]),
            ..IncludeConfig::default()
        };
        assert_eq!(include.zone(&zone(3, ZoneType::Door)), ZoneClass::Exclude);
        assert_eq!(include.door(1), Inclusion::Exclude);
        assert_eq!(include.door(2), Inclusion::Include);
        assert_eq!(include.area(9), Inclusion::Include);
    }

    #[test]
    fn keys_must_be_plain_ids() {
        let valid = IncludeConfig {
            areas: BTreeMap::from([("2".into(), Inclusion::Exclude)]),
            zones: BTreeMap::from([("10".into(), ZoneClass::Door)]),
            ..IncludeConfig::default()
        };
        assert!(valid.validate().is_ok());

        for key in ["03", "abc", "-1", ""] {
            let include = IncludeConfig {
                outputs: BTreeMap::from([(key.to_owned(), Inclusion::Exclude)]),
                ..IncludeConfig::default()
            };
            assert!(
                matches!(include.validate(), Err(ConfigError::Validation { ref field, .. }) if field.starts_with("include.outputs.")),
                "key {key:?} accepted"
            );
        }
    }
}

// ── Wire-to-domain conversion ──
//
// Raw gateway records carry every field as `Option`. A full record and a
// partial push update share the same shape, so one `Patch` impl per type
// serves both: snapshot entities are built as `Default` + patch, events
// patch the stored copy in place.

use spcbridge_api::{RawArea, RawDoor, RawOutput, RawPanel, RawSnapshot, RawUser, RawZone};

use crate::error::CoreError;
use crate::model::{
    Area, ArmMode, Door, DoorMode, EntityKind, Output, PANEL_ID, Panel, User, Zone, ZoneState,
    ZoneType,
};
use crate::store::Snapshot;

/// Overwrite the fields present in `raw`. Returns `true` if any value changed.
pub(crate) trait Patch<R> {
    fn patch(&mut self, raw: &R) -> bool;
}

/// Assign `$value` (an `Option`) to `$field` when present and different.
macro_rules! set_if {
    ($changed:ident, $field:expr, $value:expr) => {
        if let Some(value) = $value {
            if $field != value {
                $field = value;
                $changed = true;
            }
        }
    };
}

impl Patch<RawPanel> for Panel {
    fn patch(&mut self, raw: &RawPanel) -> bool {
        let mut changed = false;
        set_if!(changed, self.serial, raw.serial.clone().map(Some));
        set_if!(changed, self.model, raw.model.clone().map(Some));
        set_if!(changed, self.firmware, raw.firmware.clone().map(Some));
        set_if!(changed, self.intrusion, raw.intrusion);
        set_if!(changed, self.fire, raw.fire);
        set_if!(changed, self.tamper, raw.tamper);
        set_if!(changed, self.problem, raw.problem);
        set_if!(changed, self.verified, raw.verified);
        set_if!(changed, self.mode, raw.mode.map(ArmMode::from_wire));
        set_if!(changed, self.alarm_status, raw.alarm_status.clone().map(Some));
        set_if!(changed, self.a_enabled, raw.a_enabled);
        set_if!(changed, self.b_enabled, raw.b_enabled);
        set_if!(changed, self.a_name, raw.a_name.clone().map(Some));
        set_if!(changed, self.b_name, raw.b_name.clone().map(Some));
        set_if!(changed, self.exit_time, raw.exittime.map(Some));
        set_if!(changed, self.entry_time, raw.entrytime.map(Some));
        set_if!(changed, self.changed_by, raw.changed_by.clone().map(Some));
        set_if!(changed, self.area_ids, raw.areas.clone());
        changed
    }
}

impl Patch<RawArea> for Area {
    fn patch(&mut self, raw: &RawArea) -> bool {
        let mut changed = false;
        set_if!(changed, self.name, raw.name.clone());
        set_if!(changed, self.mode, raw.mode.map(ArmMode::from_wire));
        set_if!(changed, self.a_enabled, raw.a_enabled);
        set_if!(changed, self.b_enabled, raw.b_enabled);
        set_if!(changed, self.a_name, raw.a_name.clone().map(Some));
        set_if!(changed, self.b_name, raw.b_name.clone().map(Some));
        set_if!(changed, self.exit_time, raw.exittime.map(Some));
        set_if!(changed, self.entry_time, raw.entrytime.map(Some));
        set_if!(changed, self.intrusion, raw.intrusion);
        set_if!(changed, self.fire, raw.fire);
        set_if!(changed, self.tamper, raw.tamper);
        set_if!(changed, self.problem, raw.problem);
        set_if!(changed, self.verified, raw.verified);
        set_if!(changed, self.alarm_status, raw.alarm_status.clone().map(Some));
        set_if!(changed, self.set_user, raw.set_user.clone().map(Some));
        set_if!(changed, self.unset_user, raw.unset_user.clone().map(Some));
        set_if!(changed, self.changed_by, raw.changed_by.clone().map(Some));
        set_if!(changed, self.zone_ids, raw.zones.clone());
        changed
    }
}

impl Patch<RawZone> for Zone {
    fn patch(&mut self, raw: &RawZone) -> bool {
        let mut changed = false;
        set_if!(changed, self.name, raw.name.clone());
        set_if!(changed, self.zone_type, raw.zone_type.as_deref().map(ZoneType::from_wire));
        set_if!(changed, self.state, raw.state.as_deref().map(ZoneState::from_wire));
        set_if!(changed, self.inhibited, raw.inhibited);
        set_if!(changed, self.isolated, raw.isolated);
        set_if!(changed, self.tamper, raw.tamper);
        set_if!(changed, self.problem, raw.problem);
        set_if!(changed, self.intrusion, raw.intrusion);
        set_if!(changed, self.fire, raw.fire);
        set_if!(changed, self.alarm_status, raw.alarm_status.clone().map(Some));
        set_if!(changed, self.area_id, raw.area);
        changed
    }
}

impl Patch<RawOutput> for Output {
    fn patch(&mut self, raw: &RawOutput) -> bool {
        let mut changed = false;
        set_if!(changed, self.name, raw.name.clone());
        set_if!(changed, self.state, raw.state);
        changed
    }
}

impl Patch<RawDoor> for Door {
    fn patch(&mut self, raw: &RawDoor) -> bool {
        let mut changed = false;
        set_if!(changed, self.name, raw.name.clone());
        set_if!(changed, self.mode, raw.mode.map(DoorMode::from_wire));
        set_if!(changed, self.entry_granted, raw.entry_granted.clone().map(Some));
        set_if!(changed, self.entry_denied, raw.entry_denied.clone().map(Some));
        set_if!(changed, self.exit_granted, raw.exit_granted.clone().map(Some));
        set_if!(changed, self.exit_denied, raw.exit_denied.clone().map(Some));
        changed
    }
}

impl Patch<RawUser> for User {
    fn patch(&mut self, raw: &RawUser) -> bool {
        let mut changed = false;
        set_if!(changed, self.name, raw.name.clone());
        changed
    }
}

// ── Snapshot records ─────────────────────────────────────────────────

fn require_id(kind: EntityKind, id: Option<u32>) -> Result<u32, CoreError> {
    id.ok_or_else(|| CoreError::decode(format!("{kind} record without id")))
}

fn build<T, R>(raw: &R, init: T) -> T
where
    T: Patch<R>,
{
    let mut entity = init;
    entity.patch(raw);
    entity
}

impl TryFrom<RawSnapshot> for Snapshot {
    type Error = CoreError;

    /// Build domain entities from raw records. Every record must carry an
    /// id, and every zone an area; reference checks happen in the store.
    fn try_from(raw: RawSnapshot) -> Result<Self, Self::Error> {
        let panel = build(
            &raw.panel,
            Panel {
                id: PANEL_ID,
                ..Panel::default()
            },
        );

        let areas = raw
            .areas
            .iter()
            .map(|r| {
                let id = require_id(EntityKind::Area, r.id)?;
                Ok(build(r, Area { id, ..Area::default() }))
            })
            .collect::<Result<Vec<_>, CoreError>>()?;

        let zones = raw
            .zones
            .iter()
            .map(|r| {
                let id = require_id(EntityKind::Zone, r.id)?;
                let area_id = r
                    .area
                    .ok_or_else(|| CoreError::decode(format!("zone {id} has no area")))?;
                Ok(build(
                    r,
                    Zone {
                        id,
                        area_id,
                        ..Zone::default()
                    },
                ))
            })
            .collect::<Result<Vec<_>, CoreError>>()?;

        let outputs = raw
            .outputs
            .iter()
            .map(|r| {
                let id = require_id(EntityKind::Output, r.id)?;
                Ok(build(r, Output { id, ..Output::default() }))
            })
            .collect::<Result<Vec<_>, CoreError>>()?;

        let doors = raw
            .doors
            .iter()
            .map(|r| {
                let id = require_id(EntityKind::Door, r.id)?;
                Ok(build(r, Door { id, ..Door::default() }))
            })
            .collect::<Result<Vec<_>, CoreError>>()?;

        let users = raw
            .users
            .iter()
            .map(|r| {
                let id = require_id(EntityKind::User, r.id)?;
                Ok(build(r, User { id, ..User::default() }))
            })
            .collect::<Result<Vec<_>, CoreError>>()?;

        Ok(Snapshot {
            panel,
            areas,
            zones,
            outputs,
            doors,
            users,
        })
    }
}

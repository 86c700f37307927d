use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::{ArcSwap, ArcSwapOption};
use chrono::{DateTime, Utc};
use tracing::debug;

use super::Snapshot;
use super::collection::EntityCollection;
use crate::convert::Patch;
use crate::error::CoreError;
use crate::event::{ChangeCause, ChangeSet, EntityUpdate};
use crate::model::{Area, Door, EntityKind, EntityRef, Output, PANEL_ID, Panel, User, Zone};

/// One consistent generation of every entity.
#[derive(Debug, Clone, Default)]
struct Entities {
    panel: Option<Arc<Panel>>,
    areas: EntityCollection<Area>,
    zones: EntityCollection<Zone>,
    outputs: EntityCollection<Output>,
    doors: EntityCollection<Door>,
    users: EntityCollection<User>,
}

/// Shared, lock-free-for-readers store of panel state.
pub struct StateStore {
    entities: ArcSwap<Entities>,
    /// Serializes writers. Readers never take it.
    write_lock: Mutex<()>,
    reliable: AtomicBool,
    last_full_load: ArcSwapOption<DateTime<Utc>>,
    last_event: ArcSwapOption<DateTime<Utc>>,
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore {
    pub fn new() -> Self {
        Self {
            entities: ArcSwap::from_pointee(Entities::default()),
            write_lock: Mutex::new(()),
            reliable: AtomicBool::new(false),
            last_full_load: ArcSwapOption::empty(),
            last_event: ArcSwapOption::empty(),
        }
    }

    // ── Writers ──────────────────────────────────────────────────────

    /// Replace every entity with `snapshot`, atomically.
    ///
    /// Rejects snapshots with duplicate ids or zones whose area is not in
    /// the same snapshot. Returns every entity added, removed or modified
    /// relative to the previous generation.
    pub fn load(&self, snapshot: Snapshot) -> Result<ChangeSet, CoreError> {
        let next = build_entities(snapshot)?;

        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let current = self.entities.load_full();

        let mut changes = ChangeSet::new(ChangeCause::Reload);
        if current.panel != next.panel {
            changes.insert(EntityRef::panel());
        }
        changes.extend_ids(EntityKind::Area, current.areas.changed_ids(&next.areas));
        changes.extend_ids(EntityKind::Zone, current.zones.changed_ids(&next.zones));
        changes.extend_ids(EntityKind::Output, current.outputs.changed_ids(&next.outputs));
        changes.extend_ids(EntityKind::Door, current.doors.changed_ids(&next.doors));
        changes.extend_ids(EntityKind::User, current.users.changed_ids(&next.users));

        debug!(
            areas = next.areas.len(),
            zones = next.zones.len(),
            outputs = next.outputs.len(),
            doors = next.doors.len(),
            users = next.users.len(),
            changed = changes.len(),
            "snapshot loaded"
        );

        self.entities.store(Arc::new(next));
        self.last_full_load.store(Some(Arc::new(Utc::now())));
        self.reliable.store(true, Ordering::Release);
        Ok(changes)
    }

    /// Apply one partial update. Only fields present in the update are
    /// written; the change set lists the entity only if a value differed.
    pub fn apply_event(&self, update: &EntityUpdate) -> Result<ChangeSet, CoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = Entities::clone(&self.entities.load());
        // Areas whose zone list followed a zone to another area.
        let mut touched_areas = Vec::new();

        let (target, changed) = match update {
            EntityUpdate::Panel(raw) => {
                let panel = next
                    .panel
                    .as_mut()
                    .ok_or_else(|| CoreError::not_found(EntityKind::Panel, PANEL_ID))?;
                (EntityRef::panel(), Arc::make_mut(panel).patch(raw))
            }
            EntityUpdate::PanelLog { entry, changed_by } => {
                let panel = next
                    .panel
                    .as_mut()
                    .ok_or_else(|| CoreError::not_found(EntityKind::Panel, PANEL_ID))?;
                let panel = Arc::make_mut(panel);
                let mut changed = false;
                if panel.last_event.as_deref() != Some(entry.as_str()) {
                    panel.last_event = Some(entry.clone());
                    changed = true;
                }
                if changed_by.is_some() && panel.changed_by != *changed_by {
                    panel.changed_by.clone_from(changed_by);
                    changed = true;
                }
                (EntityRef::panel(), changed)
            }
            EntityUpdate::Area(id, raw) => {
                if let Some(zone_id) = raw.zones.iter().flatten().find(|z| !next.zones.contains(**z)) {
                    return Err(CoreError::decode(format!(
                        "area {id} lists unknown zone {zone_id}"
                    )));
                }
                let changed = next
                    .areas
                    .update(*id, |area| area.patch(raw))
                    .ok_or_else(|| CoreError::not_found(EntityKind::Area, *id))?;
                (EntityRef::area(*id), changed)
            }
            EntityUpdate::Zone(id, raw) => {
                if let Some(area_id) = raw.area {
                    if !next.areas.contains(area_id) {
                        return Err(CoreError::decode(format!(
                            "zone {id} moved to unknown area {area_id}"
                        )));
                    }
                }
                let previous_area = next.zones.get(*id).map(|zone| zone.area_id);
                let changed = next
                    .zones
                    .update(*id, |zone| zone.patch(raw))
                    .ok_or_else(|| CoreError::not_found(EntityKind::Zone, *id))?;
                if let (Some(from), Some(to)) = (previous_area, raw.area) {
                    if from != to {
                        touched_areas = move_zone(&mut next.areas, *id, from, to);
                    }
                }
                (EntityRef::zone(*id), changed)
            }
            EntityUpdate::Output(id, raw) => {
                let changed = next
                    .outputs
                    .update(*id, |output| output.patch(raw))
                    .ok_or_else(|| CoreError::not_found(EntityKind::Output, *id))?;
                (EntityRef::output(*id), changed)
            }
            EntityUpdate::Door(id, raw) => {
                let changed = next
                    .doors
                    .update(*id, |door| door.patch(raw))
                    .ok_or_else(|| CoreError::not_found(EntityKind::Door, *id))?;
                (EntityRef::door(*id), changed)
            }
        };

        self.last_event.store(Some(Arc::new(Utc::now())));

        let mut changes = ChangeSet::new(ChangeCause::Event);
        if changed {
            changes.insert(target);
        }
        for area in touched_areas {
            changes.insert(area);
        }
        if !changes.is_empty() {
            self.entities.store(Arc::new(next));
        }
        Ok(changes)
    }

    /// Flag the content as stale. Cleared by the next successful `load`.
    pub fn mark_unreliable(&self) {
        self.reliable.store(false, Ordering::Release);
    }

    // ── Readers ──────────────────────────────────────────────────────

    /// `false` before the first load and while reconnecting.
    pub fn is_reliable(&self) -> bool {
        self.reliable.load(Ordering::Acquire)
    }

    /// Whether any snapshot has been loaded yet.
    pub fn is_loaded(&self) -> bool {
        self.entities.load().panel.is_some()
    }

    pub fn last_full_load(&self) -> Option<DateTime<Utc>> {
        self.last_full_load.load().as_deref().copied()
    }

    pub fn last_event(&self) -> Option<DateTime<Utc>> {
        self.last_event.load().as_deref().copied()
    }

    pub fn panel(&self) -> Result<Arc<Panel>, CoreError> {
        self.entities
            .load()
            .panel
            .clone()
            .ok_or_else(|| CoreError::not_found(EntityKind::Panel, PANEL_ID))
    }

    pub fn area(&self, id: u32) -> Result<Arc<Area>, CoreError> {
        self.entities
            .load()
            .areas
            .get(id)
            .ok_or_else(|| CoreError::not_found(EntityKind::Area, id))
    }

    pub fn zone(&self, id: u32) -> Result<Arc<Zone>, CoreError> {
        self.entities
            .load()
            .zones
            .get(id)
            .ok_or_else(|| CoreError::not_found(EntityKind::Zone, id))
    }

    pub fn output(&self, id: u32) -> Result<Arc<Output>, CoreError> {
        self.entities
            .load()
            .outputs
            .get(id)
            .ok_or_else(|| CoreError::not_found(EntityKind::Output, id))
    }

    pub fn door(&self, id: u32) -> Result<Arc<Door>, CoreError> {
        self.entities
            .load()
            .doors
            .get(id)
            .ok_or_else(|| CoreError::not_found(EntityKind::Door, id))
    }

    pub fn user(&self, id: u32) -> Result<Arc<User>, CoreError> {
        self.entities
            .load()
            .users
            .get(id)
            .ok_or_else(|| CoreError::not_found(EntityKind::User, id))
    }

    /// Whether the referenced entity exists in the current generation.
    pub fn contains(&self, entity: EntityRef) -> bool {
        let entities = self.entities.load();
        match entity.kind {
            EntityKind::Panel => entity.id == PANEL_ID && entities.panel.is_some(),
            EntityKind::Area => entities.areas.contains(entity.id),
            EntityKind::Zone => entities.zones.contains(entity.id),
            EntityKind::Output => entities.outputs.contains(entity.id),
            EntityKind::Door => entities.doors.contains(entity.id),
            EntityKind::User => entities.users.contains(entity.id),
        }
    }

    pub fn areas_snapshot(&self) -> Vec<Arc<Area>> {
        self.entities.load().areas.snapshot()
    }

    pub fn zones_snapshot(&self) -> Vec<Arc<Zone>> {
        self.entities.load().zones.snapshot()
    }

    pub fn outputs_snapshot(&self) -> Vec<Arc<Output>> {
        self.entities.load().outputs.snapshot()
    }

    pub fn doors_snapshot(&self) -> Vec<Arc<Door>> {
        self.entities.load().doors.snapshot()
    }

    pub fn users_snapshot(&self) -> Vec<Arc<User>> {
        self.entities.load().users.snapshot()
    }

    /// Zones whose back reference points at `area_id`.
    pub fn zones_in_area(&self, area_id: u32) -> Vec<Arc<Zone>> {
        self.entities
            .load()
            .zones
            .values()
            .filter(|zone| zone.area_id == area_id)
            .cloned()
            .collect()
    }
}

/// Move `zone_id` from one area's zone list to another's. Returns the
/// areas whose list actually changed.
fn move_zone(
    areas: &mut EntityCollection<Area>,
    zone_id: u32,
    from: u32,
    to: u32,
) -> Vec<EntityRef> {
    let removed = areas.update(from, |area| {
        let before = area.zone_ids.len();
        area.zone_ids.retain(|id| *id != zone_id);
        area.zone_ids.len() != before
    });
    let added = areas.update(to, |area| {
        if area.zone_ids.contains(&zone_id) {
            return false;
        }
        area.zone_ids.push(zone_id);
        area.zone_ids.sort_unstable();
        true
    });

    let mut touched = Vec::new();
    if removed == Some(true) {
        touched.push(EntityRef::area(from));
    }
    if added == Some(true) {
        touched.push(EntityRef::area(to));
    }
    touched
}

fn build_entities(snapshot: Snapshot) -> Result<Entities, CoreError> {
    fn duplicate(kind: EntityKind) -> impl FnOnce(u32) -> CoreError {
        move |id| CoreError::decode(format!("duplicate {kind} id {id} in snapshot"))
    }

    let areas = EntityCollection::from_entities(snapshot.areas.into_iter().map(|a| (a.id, a)))
        .map_err(duplicate(EntityKind::Area))?;

    if let Some(zone) = snapshot.zones.iter().find(|z| !areas.contains(z.area_id)) {
        return Err(CoreError::decode(format!(
            "zone {} references unknown area {}",
            zone.id, zone.area_id
        )));
    }

    Ok(Entities {
        panel: Some(Arc::new(snapshot.panel)),
        areas,
        zones: EntityCollection::from_entities(snapshot.zones.into_iter().map(|z| (z.id, z)))
            .map_err(duplicate(EntityKind::Zone))?,
        outputs: EntityCollection::from_entities(snapshot.outputs.into_iter().map(|o| (o.id, o)))
            .map_err(duplicate(EntityKind::Output))?,
        doors: EntityCollection::from_entities(snapshot.doors.into_iter().map(|d| (d.id, d)))
            .map_err(duplicate(EntityKind::Door))?,
        users: EntityCollection::from_entities(snapshot.users.into_iter().map(|u| (u.id, u)))
            .map_err(duplicate(EntityKind::User))?,
    })
}

//! Entity listings. Excluded entities are hidden unless `--all` is given.

use std::sync::Arc;

use serde::Serialize;
use tabled::Tabled;

use spcbridge_config::{Inclusion, ZoneClass};
use spcbridge_core::{Area, ArmMode, Door, DoorMode, Output, StateStore, User, Zone, ZoneState};

use crate::cli::{GlobalOpts, ListArgs, ZonesArgs};
use crate::config::Resolved;
use crate::error::CliError;
use crate::output::{self, Tone, paint};

use super::load_store;

// ── Rows ─────────────────────────────────────────────────────────────

#[derive(Tabled)]
struct AreaRow {
    #[tabled(rename = "ID")]
    id: u32,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Mode")]
    mode: String,
    #[tabled(rename = "Alarm")]
    alarm: String,
    #[tabled(rename = "Zones")]
    zones: usize,
}

#[derive(Tabled)]
struct ZoneRow {
    #[tabled(rename = "ID")]
    id: u32,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Area")]
    area: String,
    #[tabled(rename = "Class")]
    class: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Flags")]
    flags: String,
}

#[derive(Tabled)]
struct OutputRow {
    #[tabled(rename = "ID")]
    id: u32,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "State")]
    state: String,
}

#[derive(Tabled)]
struct DoorRow {
    #[tabled(rename = "ID")]
    id: u32,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Mode")]
    mode: String,
    #[tabled(rename = "Last entry")]
    last_entry: String,
}

#[derive(Tabled)]
struct UserRow {
    #[tabled(rename = "ID")]
    id: u32,
    #[tabled(rename = "Name")]
    name: String,
}

/// A zone with its configured class, for structured output.
#[derive(Serialize)]
struct ZoneView {
    #[serde(flatten)]
    zone: Arc<Zone>,
    class: ZoneClass,
}

// ── Tones ────────────────────────────────────────────────────────────

fn mode_tone(mode: ArmMode) -> Tone {
    match mode {
        ArmMode::Unset => Tone::Good,
        ArmMode::Unknown => Tone::Normal,
        _ => Tone::Warn,
    }
}

fn zone_state_tone(state: ZoneState) -> Tone {
    match state {
        ZoneState::Closed => Tone::Good,
        ZoneState::Open => Tone::Warn,
        ZoneState::Unknown => Tone::Normal,
        _ => Tone::Alarm,
    }
}

fn zone_flags(zone: &Zone) -> String {
    let mut flags = Vec::new();
    if zone.intrusion {
        flags.push("intrusion");
    }
    if zone.fire {
        flags.push("fire");
    }
    if zone.tamper {
        flags.push("tamper");
    }
    if zone.problem {
        flags.push("problem");
    }
    if zone.inhibited {
        flags.push("inhibited");
    }
    if zone.isolated {
        flags.push("isolated");
    }
    flags.join(",")
}

// ── Handlers ─────────────────────────────────────────────────────────

pub async fn areas(resolved: &Resolved, args: &ListArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let store = load_store(resolved).await?;
    let include = &resolved.profile.include;
    let color = output::should_color(global.color);

    let areas: Vec<Arc<Area>> = store
        .areas_snapshot()
        .into_iter()
        .filter(|a| args.all || include.area(a.id) == Inclusion::Include)
        .collect();

    let out = output::render_list(
        global.output,
        &areas,
        |a| AreaRow {
            id: a.id,
            name: a.name.clone(),
            mode: paint(a.mode, mode_tone(a.mode), color),
            alarm: if a.intrusion || a.fire || a.tamper {
                paint("ALARM", Tone::Alarm, color)
            } else {
                String::new()
            },
            zones: store.zones_in_area(a.id).len(),
        },
        |a| a.id.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn zones(resolved: &Resolved, args: &ZonesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let store = load_store(resolved).await?;
    let include = &resolved.profile.include;
    let color = output::should_color(global.color);

    let zones: Vec<ZoneView> = store
        .zones_snapshot()
        .into_iter()
        .filter(|z| args.area.is_none_or(|area| z.area_id == area))
        .map(|zone| ZoneView {
            class: include.zone(&zone),
            zone,
        })
        .filter(|v| args.list.all || v.class != ZoneClass::Exclude)
        .collect();

    let out = output::render_list(
        global.output,
        &zones,
        |v| ZoneRow {
            id: v.zone.id,
            name: v.zone.name.clone(),
            area: area_name(&store, v.zone.area_id),
            class: v.class.to_string(),
            state: paint(v.zone.state, zone_state_tone(v.zone.state), color),
            flags: zone_flags(&v.zone),
        },
        |v| v.zone.id.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn outputs(resolved: &Resolved, args: &ListArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let store = load_store(resolved).await?;
    let include = &resolved.profile.include;
    let color = output::should_color(global.color);

    let outputs: Vec<Arc<Output>> = store
        .outputs_snapshot()
        .into_iter()
        .filter(|o| args.all || include.output(o.id) == Inclusion::Include)
        .collect();

    let out = output::render_list(
        global.output,
        &outputs,
        |o| OutputRow {
            id: o.id,
            name: o.name.clone(),
            state: if o.state {
                paint("on", Tone::Warn, color)
            } else {
                "off".into()
            },
        },
        |o| o.id.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn doors(resolved: &Resolved, args: &ListArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let store = load_store(resolved).await?;
    let include = &resolved.profile.include;
    let color = output::should_color(global.color);

    let doors: Vec<Arc<Door>> = store
        .doors_snapshot()
        .into_iter()
        .filter(|d| args.all || include.door(d.id) == Inclusion::Include)
        .collect();

    let out = output::render_list(
        global.output,
        &doors,
        |d| DoorRow {
            id: d.id,
            name: d.name.clone(),
            mode: paint(
                d.mode,
                if d.mode == DoorMode::Unlocked { Tone::Warn } else { Tone::Normal },
                color,
            ),
            last_entry: d.entry_granted.clone().unwrap_or_default(),
        },
        |d| d.id.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn users(resolved: &Resolved, global: &GlobalOpts) -> Result<(), CliError> {
    let store = load_store(resolved).await?;
    let users: Vec<Arc<User>> = store.users_snapshot();

    let out = output::render_list(
        global.output,
        &users,
        |u| UserRow {
            id: u.id,
            name: u.name.clone(),
        },
        |u| u.id.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

fn area_name(store: &StateStore, id: u32) -> String {
    store
        .area(id)
        .map_or_else(|_| id.to_string(), |a| format!("{} ({id})", a.name))
}

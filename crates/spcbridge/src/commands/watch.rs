//! Live change stream.
//!
//! Connects with the push channel enabled and prints one line per changed
//! entity (or one JSON object per change set) until Ctrl-C.

use std::pin::pin;

use chrono::Utc;
use futures_util::StreamExt;
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;

use spcbridge_core::{
    Bridge, ChangeCause, ChangeSet, EntityKind, EntityRef, StateStore, SyncState, SyncTransition,
};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::config::Resolved;
use crate::error::CliError;
use crate::output::{self, Tone, paint};

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WatchLine<'a> {
    Change(&'a ChangeSet),
    Sync(&'a SyncTransition),
}

pub async fn handle(resolved: Resolved, global: &GlobalOpts) -> Result<(), CliError> {
    let mut config = resolved.bridge;
    config.push_enabled = true;
    config.max_connect_retries = None;

    let bridge = Bridge::new(config)?;
    // Subscribe first so the initial Loading -> Synced is printed too.
    let mut transitions = bridge.sync_transitions();
    let mut changes = pin!(bridge.change_stream());
    let mut ctrl_c = pin!(tokio::signal::ctrl_c());
    let color = output::should_color(global.color);

    bridge.connect().await?;

    loop {
        tokio::select! {
            biased;
            _ = &mut ctrl_c => break,
            transition = transitions.recv() => match transition {
                Ok(t) => print_transition(&t, global, color)?,
                Err(RecvError::Lagged(n)) => tracing::warn!(skipped = n, "sync transitions lagged"),
                Err(RecvError::Closed) => break,
            },
            change = changes.next() => match change {
                Some(set) => print_changes(&set, bridge.store(), global, color)?,
                None => break,
            },
        }
    }

    bridge.disconnect().await;
    Ok(())
}

fn print_transition(t: &SyncTransition, global: &GlobalOpts, color: bool) -> Result<(), CliError> {
    let line = match global.output {
        OutputFormat::Json | OutputFormat::JsonCompact => serde_json::to_string(&WatchLine::Sync(t))?,
        OutputFormat::Yaml => serde_yaml::to_string(&WatchLine::Sync(t))?,
        OutputFormat::Table | OutputFormat::Plain => {
            let tone = match t.to {
                SyncState::Synced => Tone::Good,
                SyncState::Loading => Tone::Normal,
                SyncState::Reconnecting => Tone::Warn,
            };
            format!("{} sync {} -> {}", timestamp(), t.from, paint(t.to, tone, color))
        }
    };
    output::print_output(&line, global.quiet);
    Ok(())
}

fn print_changes(
    set: &ChangeSet,
    store: &StateStore,
    global: &GlobalOpts,
    color: bool,
) -> Result<(), CliError> {
    let text = match global.output {
        OutputFormat::Json | OutputFormat::JsonCompact => serde_json::to_string(&WatchLine::Change(set))?,
        OutputFormat::Yaml => serde_yaml::to_string(&WatchLine::Change(set))?,
        OutputFormat::Table | OutputFormat::Plain => {
            if set.cause == ChangeCause::Reload {
                format!("{} reload {} entities", timestamp(), set.len())
            } else {
                set.entities
                    .iter()
                    .map(|e| format!("{} {}", timestamp(), describe(store, *e, color)))
                    .collect::<Vec<_>>()
                    .join("\n")
            }
        }
    };
    output::print_output(&text, global.quiet);
    Ok(())
}

fn timestamp() -> String {
    Utc::now().format("%H:%M:%S").to_string()
}

/// One-line summary of an entity's current value.
fn describe(store: &StateStore, entity: EntityRef, color: bool) -> String {
    let EntityRef { kind, id } = entity;
    let summary = match kind {
        EntityKind::Panel => store.panel().map(|p| {
            let tone = if p.in_alarm() { Tone::Alarm } else { Tone::Normal };
            paint(p.mode, tone, color)
        }),
        EntityKind::Area => store.area(id).map(|a| {
            let tone = if a.intrusion || a.fire { Tone::Alarm } else { Tone::Normal };
            format!("{}: {}", a.name, paint(a.mode, tone, color))
        }),
        EntityKind::Zone => store.zone(id).map(|z| {
            let tone = if z.intrusion || z.fire || z.tamper { Tone::Alarm } else { Tone::Normal };
            format!("{}: {}", z.name, paint(z.state, tone, color))
        }),
        EntityKind::Output => store
            .output(id)
            .map(|o| format!("{}: {}", o.name, if o.state { "on" } else { "off" })),
        EntityKind::Door => store.door(id).map(|d| format!("{}: {}", d.name, d.mode)),
        EntityKind::User => store.user(id).map(|u| u.name.clone()),
    };
    match summary {
        Ok(text) => format!("{kind} {id} {text}"),
        Err(_) => format!("{kind} {id} (gone)"),
    }
}

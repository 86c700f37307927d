//! Panel summary.

use chrono::{DateTime, Utc};
use serde::Serialize;

use spcbridge_core::{ArmMode, Bridge, SyncState};

use crate::cli::GlobalOpts;
use crate::config::Resolved;
use crate::error::CliError;
use crate::output::{self, Tone, paint};

#[derive(Debug, Serialize)]
struct PanelStatus {
    gateway: String,
    serial: Option<String>,
    model: Option<String>,
    firmware: Option<String>,
    mode: ArmMode,
    alarm_status: Option<String>,
    in_alarm: bool,
    areas: usize,
    zones: usize,
    sync_state: SyncState,
    loaded_at: Option<DateTime<Utc>>,
}

pub async fn handle(resolved: &Resolved, global: &GlobalOpts) -> Result<(), CliError> {
    let status = Bridge::oneshot(resolved.bridge.clone(), |bridge| async move {
        let store = bridge.store();
        let panel = store.panel()?;
        Ok(PanelStatus {
            gateway: bridge.config().url.to_string(),
            serial: panel.serial.clone(),
            model: panel.model.clone(),
            firmware: panel.firmware.clone(),
            mode: panel.mode,
            alarm_status: panel.alarm_status.clone(),
            in_alarm: panel.in_alarm(),
            areas: store.areas_snapshot().len(),
            zones: store.zones_snapshot().len(),
            sync_state: bridge.sync_state(),
            loaded_at: store.last_full_load(),
        })
    })
    .await?;

    let color = output::should_color(global.color);
    let out = output::render_single(
        global.output,
        &status,
        |s| {
            output::render_detail(&[
                ("Gateway", s.gateway.clone()),
                ("Serial", s.serial.clone().unwrap_or_default()),
                ("Model", s.model.clone().unwrap_or_default()),
                ("Firmware", s.firmware.clone().unwrap_or_default()),
                (
                    "Mode",
                    paint(s.mode, if s.mode == ArmMode::Unset { Tone::Good } else { Tone::Warn }, color),
                ),
                (
                    "Alarm",
                    if s.in_alarm {
                        paint(s.alarm_status.as_deref().unwrap_or("ALARM"), Tone::Alarm, color)
                    } else {
                        paint("none", Tone::Good, color)
                    },
                ),
                ("Areas", s.areas.to_string()),
                ("Zones", s.zones.to_string()),
                (
                    "Loaded",
                    s.loaded_at
                        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                        .unwrap_or_default(),
                ),
            ])
        },
        |s| s.serial.clone().unwrap_or_default(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

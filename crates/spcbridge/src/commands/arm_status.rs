//! Arm-status diagnostic report.

use serde::Serialize;
use tabled::Tabled;

use spcbridge_core::{ArmStatus, Bridge};

use crate::cli::{ArmStatusArgs, GlobalOpts};
use crate::config::Resolved;
use crate::error::CliError;
use crate::output::{self, Tone, paint};

#[derive(Tabled)]
struct ArmStatusRow {
    #[tabled(rename = "Area")]
    area: String,
    #[tabled(rename = "Ready")]
    ready: String,
    #[tabled(rename = "Reasons")]
    reasons: String,
}

#[derive(Serialize)]
struct ArmStatusView {
    #[serde(flatten)]
    status: ArmStatus,
    #[serde(skip)]
    area_name: Option<String>,
}

pub async fn handle(resolved: &Resolved, args: ArmStatusArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let ArmStatusArgs { mode, area } = args;
    let report = Bridge::oneshot(resolved.bridge.clone(), |bridge| async move {
        let statuses = bridge.arm_status(&mode, area).await?;
        Ok(statuses
            .into_iter()
            .map(|status| ArmStatusView {
                area_name: bridge.store().area(status.area_id).ok().map(|a| a.name.clone()),
                status,
            })
            .collect::<Vec<_>>())
    })
    .await?;

    let color = output::should_color(global.color);
    let out = output::render_list(
        global.output,
        &report,
        |v| ArmStatusRow {
            area: match v.area_name {
                Some(ref name) => format!("{name} ({})", v.status.area_id),
                None => v.status.area_id.to_string(),
            },
            ready: if v.status.is_ready() {
                paint("yes", Tone::Good, color)
            } else {
                paint("no", Tone::Alarm, color)
            },
            reasons: v.status.reasons.join("\n"),
        },
        |v| {
            if v.status.is_ready() {
                format!("{} ready", v.status.area_id)
            } else {
                format!("{} {}", v.status.area_id, v.status.reasons.join("; "))
            }
        },
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

//! `spcbridge command <kind> <id> <action>`.

use serde::Serialize;

use spcbridge_core::{Bridge, EntityKind, PANEL_ID};

use crate::cli::{CommandArgs, GlobalOpts};
use crate::config::Resolved;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct CommandOutcome {
    kind: EntityKind,
    id: u32,
    action: String,
    code: u32,
    message: String,
}

pub async fn handle(resolved: &Resolved, args: CommandArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let CommandArgs {
        kind,
        id,
        action,
        code,
    } = args;

    if kind == EntityKind::Panel && id != PANEL_ID {
        return Err(CliError::validation("id", format!("the panel id is always {PANEL_ID}")));
    }

    let keypad = resolved.keypad_map()?;
    let code = keypad.translate(resolved.user_identify(), code.as_deref())?;

    let response = Bridge::oneshot(resolved.bridge.clone(), |bridge| {
        let action = action.clone();
        async move { bridge.command(kind, id, &action, code).await }
    })
    .await?;

    let outcome = CommandOutcome {
        kind,
        id,
        action,
        code: response.code,
        message: response.message,
    };
    let out = output::render_single(
        global.output,
        &outcome,
        |o| {
            let message = if o.message.is_empty() { "accepted" } else { o.message.as_str() };
            format!("{} {} {}: {message}", o.kind, o.id, o.action)
        },
        |o| o.code.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

//! Command dispatch: bridges CLI args -> core operations -> output formatting.

pub mod arm_status;
pub mod config_cmd;
pub mod control;
pub mod entities;
pub mod status;
pub mod watch;

use std::sync::Arc;

use spcbridge_core::{Bridge, StateStore};

use crate::cli::{Command, GlobalOpts};
use crate::config::Resolved;
use crate::error::CliError;

/// Dispatch a gateway-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, resolved: Resolved, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Status => status::handle(&resolved, global).await,
        Command::Areas(args) => entities::areas(&resolved, &args, global).await,
        Command::Zones(args) => entities::zones(&resolved, &args, global).await,
        Command::Outputs(args) => entities::outputs(&resolved, &args, global).await,
        Command::Doors(args) => entities::doors(&resolved, &args, global).await,
        Command::Users => entities::users(&resolved, global).await,
        Command::Command(args) => control::handle(&resolved, args, global).await,
        Command::ArmStatus(args) => arm_status::handle(&resolved, args, global).await,
        Command::Watch => watch::handle(resolved, global).await,
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "config and completions are handled before dispatch".into(),
        )),
    }
}

/// Load one snapshot without the push channel and hand back the store.
pub(crate) async fn load_store(resolved: &Resolved) -> Result<Arc<StateStore>, CliError> {
    let store = Bridge::oneshot(resolved.bridge.clone(), |bridge| async move {
        Ok(Arc::clone(bridge.store()))
    })
    .await?;
    Ok(store)
}

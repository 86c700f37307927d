// ── Command API ──
//
// Every write goes through `CommandDispatcher`: validated against the
// action table and the store, serialised per target, bounded by a
// timeout, then handed to a `PanelGateway`.

mod action;
mod arm_status;
mod dispatcher;

use std::future::Future;

use secrecy::SecretString;
use spcbridge_api::BridgeClient;

use crate::error::CoreError;
use crate::model::EntityRef;

pub use action::Action;
pub use arm_status::{ArmRequest, ArmStatus};
pub use dispatcher::CommandDispatcher;
pub use spcbridge_api::CommandResponse;

/// One command against one entity.
#[derive(Debug, Clone)]
pub struct Command {
    pub target: EntityRef,
    pub action: Action,
    /// Keypad code or SPC password, when the gateway requires one.
    pub code: Option<SecretString>,
}

impl Command {
    pub fn new(target: EntityRef, action: Action) -> Self {
        Self {
            target,
            action,
            code: None,
        }
    }

    pub fn with_code(mut self, code: SecretString) -> Self {
        self.code = Some(code);
        self
    }
}

/// The write side of a gateway connection.
pub trait PanelGateway: Send + Sync + 'static {
    /// Send one already-validated command and return the gateway's answer,
    /// success or not.
    fn dispatch(
        &self,
        target: EntityRef,
        action: Action,
        code: Option<&SecretString>,
    ) -> impl Future<Output = Result<CommandResponse, CoreError>> + Send;
}

impl PanelGateway for BridgeClient {
    async fn dispatch(
        &self,
        target: EntityRef,
        action: Action,
        code: Option<&SecretString>,
    ) -> Result<CommandResponse, CoreError> {
        let response = self
            .send_command(target.kind.as_str(), target.id, action.as_str(), code)
            .await?;
        Ok(response)
    }
}

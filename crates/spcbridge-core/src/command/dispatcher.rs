use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::{Command, CommandResponse, PanelGateway};
use crate::error::CoreError;
use crate::model::EntityRef;
use crate::store::StateStore;

/// Validates commands and forwards them to a [`PanelGateway`], at most
/// one in flight per target.
pub struct CommandDispatcher<G> {
    gateway: G,
    store: Arc<StateStore>,
    /// One slot per target ever commanded. Entries are never removed;
    /// the id space is small and fixed per connection.
    slots: DashMap<EntityRef, Arc<Mutex<()>>>,
    timeout: Duration,
}

impl<G: PanelGateway> CommandDispatcher<G> {
    pub fn new(gateway: G, store: Arc<StateStore>, timeout: Duration) -> Self {
        Self {
            gateway,
            store,
            slots: DashMap::new(),
            timeout,
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Check the action against the target kind and the target against
    /// the store. Never touches the network.
    pub fn validate(&self, command: &Command) -> Result<(), CoreError> {
        let Command { target, action, .. } = command;
        if !action.applies_to(target.kind) {
            return Err(CoreError::validation(format!(
                "action '{action}' does not apply to {}",
                target.kind
            )));
        }
        if !self.store.contains(*target) {
            return Err(CoreError::validation(format!("{target} does not exist")));
        }
        Ok(())
    }

    /// Validate, wait for the target's slot, then send.
    ///
    /// The timeout covers the gateway call only, not the wait for the slot.
    /// A non-zero result code becomes [`CoreError::CommandRejected`].
    pub async fn dispatch(&self, command: Command) -> Result<CommandResponse, CoreError> {
        self.validate(&command)?;

        let slot = self.slot(command.target);
        let _in_flight = slot.lock().await;

        debug!(entity = %command.target, action = %command.action, "dispatching command");
        let call = self
            .gateway
            .dispatch(command.target, command.action, command.code.as_ref());
        let response = tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| {
                warn!(entity = %command.target, action = %command.action, "command timed out");
                CoreError::Timeout {
                    timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
                }
            })??;

        if !response.is_success() {
            warn!(
                entity = %command.target,
                code = response.code,
                message = %response.message,
                "command rejected"
            );
            return Err(CoreError::CommandRejected {
                code: response.code,
                message: response.message,
            });
        }
        Ok(response)
    }

    fn slot(&self, target: EntityRef) -> Arc<Mutex<()>> {
        Arc::clone(&self.slots.entry(target).or_default())
    }
}

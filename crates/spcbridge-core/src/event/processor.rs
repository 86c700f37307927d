use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use super::{ChangeSet, Frame, SyncState, SyncTransition, decode_frame};
use crate::error::CoreError;
use crate::store::{Snapshot, StateStore};

const CHANGE_CHANNEL_SIZE: usize = 256;
const TRANSITION_CHANNEL_SIZE: usize = 32;

/// What became of one push frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Applied; these entities changed and were broadcast.
    Applied(Arc<ChangeSet>),
    /// Decoded and applied, but every field already had that value.
    Unchanged,
    /// The gateway asked for a full reload.
    ReloadRequested,
    /// Malformed, unknown or out-of-state. Already logged.
    Dropped,
}

/// Applies push frames and snapshots to the store and publishes the
/// resulting change sets. Owns the connection's [`SyncState`].
pub struct EventProcessor {
    store: Arc<StateStore>,
    state: watch::Sender<SyncState>,
    transitions: broadcast::Sender<SyncTransition>,
    changes: broadcast::Sender<Arc<ChangeSet>>,
}

impl EventProcessor {
    /// Starts in [`SyncState::Loading`].
    pub fn new(store: Arc<StateStore>) -> Self {
        let (state, _) = watch::channel(SyncState::Loading);
        let (transitions, _) = broadcast::channel(TRANSITION_CHANNEL_SIZE);
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_SIZE);
        Self {
            store,
            state,
            transitions,
            changes,
        }
    }

    pub fn store(&self) -> &Arc<StateStore> {
        &self.store
    }

    // ── State machine ────────────────────────────────────────────────

    pub fn sync_state(&self) -> SyncState {
        *self.state.borrow()
    }

    /// Move to `to`. Self-transitions are swallowed.
    pub fn transition(&self, to: SyncState) {
        let from = self.state.send_replace(to);
        if from == to {
            return;
        }
        info!(%from, %to, "sync state changed");
        let _ = self.transitions.send(SyncTransition { from, to });
    }

    /// Transport lost: keep the stale entities but flag them.
    pub fn handle_disconnect(&self, reason: &str) {
        warn!(%reason, "push channel lost");
        self.store.mark_unreliable();
        self.transition(SyncState::Reconnecting);
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Replace the store with `snapshot`, publish the diff and go `Synced`.
    ///
    /// The reload change set is published even when empty, so consumers
    /// always learn that a reload completed.
    pub fn apply_snapshot(&self, snapshot: Snapshot) -> Result<Arc<ChangeSet>, CoreError> {
        let changes = Arc::new(self.store.load(snapshot)?);
        debug!(changed = changes.len(), "snapshot applied");
        let _ = self.changes.send(Arc::clone(&changes));
        self.transition(SyncState::Synced);
        Ok(changes)
    }

    /// Decode and apply one text frame. Never fails: bad frames are logged
    /// and reported as [`FrameOutcome::Dropped`].
    pub fn handle_frame(&self, text: &str) -> FrameOutcome {
        let state = self.sync_state();
        if state != SyncState::Synced {
            debug!(%state, "frame ignored while not synced");
            return FrameOutcome::Dropped;
        }

        let update = match decode_frame(text) {
            Ok(Frame::Update(update)) => update,
            Ok(Frame::Reload) => {
                info!("gateway requested reload");
                return FrameOutcome::ReloadRequested;
            }
            Ok(Frame::Unknown(kind)) => {
                debug!(%kind, "unknown frame type dropped");
                return FrameOutcome::Dropped;
            }
            Err(e) => {
                warn!(error = %e, frame = %text, "undecodable frame dropped");
                return FrameOutcome::Dropped;
            }
        };

        match self.store.apply_event(&update) {
            Ok(changes) if changes.is_empty() => FrameOutcome::Unchanged,
            Ok(changes) => {
                let changes = Arc::new(changes);
                let _ = self.changes.send(Arc::clone(&changes));
                FrameOutcome::Applied(changes)
            }
            Err(e) => {
                warn!(error = %e, "event dropped");
                FrameOutcome::Dropped
            }
        }
    }

    // ── Observation ──────────────────────────────────────────────────

    pub fn subscribe_state(&self) -> watch::Receiver<SyncState> {
        self.state.subscribe()
    }

    pub fn subscribe_transitions(&self) -> broadcast::Receiver<SyncTransition> {
        self.transitions.subscribe()
    }

    pub fn subscribe_changes(&self) -> broadcast::Receiver<Arc<ChangeSet>> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::event::ChangeCause;
    use crate::model::{Area, EntityRef, Zone, ZoneState, ZoneType};

    fn snapshot() -> Snapshot {
        Snapshot {
            areas: vec![Area {
                id: 1,
                name: "Ground Floor".into(),
                ..Area::default()
            }],
            zones: vec![Zone {
                id: 10,
                name: "Hall".into(),
                zone_type: ZoneType::Motion,
                state: ZoneState::Closed,
                area_id: 1,
                ..Zone::default()
            }],
            ..Snapshot::default()
        }
    }

    fn synced() -> EventProcessor {
        let processor = EventProcessor::new(Arc::new(StateStore::new()));
        processor.apply_snapshot(snapshot()).unwrap();
        processor
    }

    #[test]
    fn snapshot_moves_loading_to_synced() {
        let processor = EventProcessor::new(Arc::new(StateStore::new()));
        let mut transitions = processor.subscribe_transitions();
        let mut changes = processor.subscribe_changes();
        assert_eq!(processor.sync_state(), SyncState::Loading);

        processor.apply_snapshot(snapshot()).unwrap();

        assert_eq!(processor.sync_state(), SyncState::Synced);
        assert_eq!(
            transitions.try_recv().unwrap(),
            SyncTransition {
                from: SyncState::Loading,
                to: SyncState::Synced
            }
        );
        let published = changes.try_recv().unwrap();
        assert_eq!(published.cause, ChangeCause::Reload);
        assert!(published.contains(EntityRef::zone(10)));
    }

    #[test]
    fn zone_frame_is_applied_and_broadcast() {
        let processor = synced();
        let mut changes = processor.subscribe_changes();

        let outcome = processor.handle_frame(r#"{"type":"zone","id":10,"state":"open"}"#);

        let FrameOutcome::Applied(set) = outcome else {
            panic!("expected an applied change set");
        };
        assert_eq!(set.entities.iter().copied().collect::<Vec<_>>(), vec![EntityRef::zone(10)]);
        assert_eq!(changes.try_recv().unwrap(), set);
        assert_eq!(processor.store().zone(10).unwrap().state, ZoneState::Open);
    }

    #[test]
    fn repeated_frame_is_unchanged_and_silent() {
        let processor = synced();
        let frame = r#"{"type":"zone","id":10,"state":"open"}"#;
        processor.handle_frame(frame);

        let mut changes = processor.subscribe_changes();
        assert_eq!(processor.handle_frame(frame), FrameOutcome::Unchanged);
        assert!(changes.try_recv().is_err());
    }

    #[test]
    fn bad_frames_are_dropped_without_changing_state() {
        let processor = synced();
        for frame in [
            "not json",
            r#"{"id":10}"#,
            r#"{"type":"zone"}"#,
            r#"{"type":"weather","id":1}"#,
            r#"{"type":"zone","id":99,"state":"open"}"#,
        ] {
            assert_eq!(processor.handle_frame(frame), FrameOutcome::Dropped, "{frame}");
        }
        assert_eq!(processor.sync_state(), SyncState::Synced);
        assert_eq!(processor.store().zone(10).unwrap().state, ZoneState::Closed);
    }

    #[test]
    fn reload_frame_is_surfaced() {
        let processor = synced();
        assert_eq!(
            processor.handle_frame(r#"{"type":"reload"}"#),
            FrameOutcome::ReloadRequested
        );
    }

    #[test]
    fn disconnect_flags_store_and_ignores_frames() {
        let processor = synced();
        processor.handle_disconnect("stream ended");

        assert_eq!(processor.sync_state(), SyncState::Reconnecting);
        assert!(!processor.store().is_reliable());
        assert!(processor.store().zone(10).is_ok());
        assert_eq!(
            processor.handle_frame(r#"{"type":"zone","id":10,"state":"open"}"#),
            FrameOutcome::Dropped
        );
    }

    #[test]
    fn repeated_transition_is_not_rebroadcast() {
        let processor = synced();
        let mut transitions = processor.subscribe_transitions();
        processor.transition(SyncState::Synced);
        assert!(transitions.try_recv().is_err());
    }
}

// ── Bridge ──
//
// Lifecycle of one gateway connection: initial load, push channel,
// resync after every gap, and the command path. Consumers hold a
// cheaply cloneable `Bridge` handle; nothing is global.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{Stream, StreamExt};
use secrecy::SecretString;
use spcbridge_api::websocket::calculate_backoff;
use spcbridge_api::{BridgeClient, EventChannel, StreamSignal};
use tokio::sync::{Mutex, broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::command::{Action, ArmRequest, ArmStatus, Command, CommandDispatcher, CommandResponse};
use crate::config::BridgeConfig;
use crate::error::CoreError;
use crate::event::{ChangeSet, EventProcessor, FrameOutcome, SyncState, SyncTransition};
use crate::model::{EntityKind, EntityRef};
use crate::store::{Snapshot, StateStore};

const RELOAD_QUEUE_SIZE: usize = 4;

/// Reply slot for a reload routed through the push task.
type ReloadReply = oneshot::Sender<Result<Arc<ChangeSet>, CoreError>>;

/// Handle to one gateway connection.
///
/// Cheaply cloneable via `Arc<BridgeInner>`.
#[derive(Clone)]
pub struct Bridge {
    inner: Arc<BridgeInner>,
}

struct BridgeInner {
    config: BridgeConfig,
    client: BridgeClient,
    processor: EventProcessor,
    dispatcher: CommandDispatcher<BridgeClient>,
    cancel: CancellationToken,
    /// Child token for the current connection; replaced on every `connect`.
    cancel_child: Mutex<CancellationToken>,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
    /// Reload requests for the running push task, if any.
    reload_tx: Mutex<Option<mpsc::Sender<ReloadReply>>>,
}

impl Bridge {
    /// Build a bridge from configuration. Does not connect.
    pub fn new(config: BridgeConfig) -> Result<Self, CoreError> {
        let mut client = BridgeClient::new(
            config.url.clone(),
            config.credentials.clone(),
            &config.transport(),
        )?;
        if let Some(ws_url) = &config.ws_url {
            client = client.with_ws_url(ws_url.clone());
        }
        Ok(Self::with_client(config, client))
    }

    /// Build a bridge around an existing client.
    pub fn with_client(config: BridgeConfig, client: BridgeClient) -> Self {
        let store = Arc::new(StateStore::new());
        let processor = EventProcessor::new(Arc::clone(&store));
        let dispatcher = CommandDispatcher::new(client.clone(), store, config.command_timeout);
        let cancel = CancellationToken::new();
        let cancel_child = cancel.child_token();

        Self {
            inner: Arc::new(BridgeInner {
                config,
                client,
                processor,
                dispatcher,
                cancel,
                cancel_child: Mutex::new(cancel_child),
                task_handles: Mutex::new(Vec::new()),
                reload_tx: Mutex::new(None),
            }),
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.inner.config
    }

    pub fn client(&self) -> &BridgeClient {
        &self.inner.client
    }

    pub fn store(&self) -> &Arc<StateStore> {
        self.inner.processor.store()
    }

    // ── Connection lifecycle ─────────────────────────────────────────

    /// Load the initial snapshot and, if enabled, open the push channel.
    ///
    /// Snapshot fetch failures are retried with backoff up to
    /// `max_connect_retries`; authentication failures are not retried.
    ///
    /// Connecting again replaces the running push task.
    pub async fn connect(&self) -> Result<(), CoreError> {
        self.stop_tasks().await;
        let child = self.inner.cancel.child_token();
        *self.inner.cancel_child.lock().await = child.clone();

        self.inner.processor.transition(SyncState::Loading);
        let snapshot = fetch_with_retry(&self.inner, &child).await?;
        self.inner.processor.apply_snapshot(snapshot)?;

        if self.inner.config.push_enabled {
            let ws_url = self.inner.client.ws_url()?;
            let channel = EventChannel::connect(
                ws_url,
                self.inner.client.ws_credentials(),
                self.inner.config.reconnect.clone(),
                child.child_token(),
            );
            let (reload_tx, reload_rx) = mpsc::channel(RELOAD_QUEUE_SIZE);
            *self.inner.reload_tx.lock().await = Some(reload_tx);
            let bridge = self.clone();
            self.inner
                .task_handles
                .lock()
                .await
                .push(tokio::spawn(push_task(bridge, channel, reload_rx, child)));
        }

        info!(url = %self.inner.config.url, "connected to gateway");
        Ok(())
    }

    /// Stop background tasks. The store keeps its content, flagged stale.
    pub async fn disconnect(&self) {
        self.stop_tasks().await;
        self.store().mark_unreliable();
        self.inner.processor.transition(SyncState::Loading);
        debug!("disconnected");
    }

    /// Cancel the current connection's tasks and wait for them to exit.
    async fn stop_tasks(&self) {
        self.inner.cancel_child.lock().await.cancel();
        *self.inner.reload_tx.lock().await = None;

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
    }

    /// Fetch a fresh snapshot now and replace the store.
    ///
    /// With the push channel running, the reload is performed by the push
    /// task so frames arriving during the fetch queue up behind it instead
    /// of being dropped. Fails with `ConnectionFailed` while the push
    /// channel is down; the reconnect reloads on its own.
    pub async fn reload(&self) -> Result<Arc<ChangeSet>, CoreError> {
        let reload_tx = self.inner.reload_tx.lock().await.clone();
        if let Some(reload_tx) = reload_tx {
            let (reply_tx, reply_rx) = oneshot::channel();
            if reload_tx.send(reply_tx).await.is_ok() {
                return reply_rx
                    .await
                    .map_err(|_| CoreError::Internal("push task stopped during reload".into()))?;
            }
            // The push task has exited (channel failed for good).
            return Err(CoreError::ConnectionFailed {
                url: self.inner.config.url.to_string(),
                reason: "push channel is down".into(),
            });
        }

        let cancel = self.inner.cancel_child.lock().await.clone();
        self.resync(&cancel).await
    }

    async fn resync(&self, cancel: &CancellationToken) -> Result<Arc<ChangeSet>, CoreError> {
        let processor = &self.inner.processor;
        processor.transition(SyncState::Loading);

        let result = match fetch_with_retry(&self.inner, cancel).await {
            Ok(snapshot) => processor.apply_snapshot(snapshot),
            Err(e) => Err(e),
        };
        if let Err(ref e) = result {
            error!(error = %e, "resync failed");
            processor.store().mark_unreliable();
            processor.transition(SyncState::Reconnecting);
        }
        result
    }

    // ── One-shot convenience ─────────────────────────────────────────

    /// Connect without the push channel, run `f`, disconnect.
    pub async fn oneshot<F, Fut, T>(config: BridgeConfig, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(Bridge) -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        let mut cfg = config;
        cfg.push_enabled = false;

        let bridge = Bridge::new(cfg)?;
        bridge.connect().await?;
        let result = f(bridge.clone()).await;
        bridge.disconnect().await;
        result
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Send `action` to entity `kind`/`id`.
    pub async fn command(
        &self,
        kind: EntityKind,
        id: u32,
        action: &str,
        code: Option<SecretString>,
    ) -> Result<CommandResponse, CoreError> {
        let action: Action = action
            .parse()
            .map_err(|_| CoreError::validation(format!("unknown action '{action}'")))?;
        let command = Command {
            target: EntityRef::new(kind, id),
            action,
            code,
        };
        self.execute(command).await
    }

    /// Dispatch a prepared command. Fails fast unless `Synced`.
    pub async fn execute(&self, command: Command) -> Result<CommandResponse, CoreError> {
        self.ensure_synced()?;
        self.inner.dispatcher.dispatch(command).await
    }

    /// Which areas would refuse to arm in `mode`, and why.
    pub async fn arm_status(
        &self,
        mode: &str,
        area: Option<u32>,
    ) -> Result<Vec<ArmStatus>, CoreError> {
        let request = ArmRequest::parse(mode)?;
        self.ensure_synced()?;
        if let Some(id) = area {
            if !self.store().contains(EntityRef::area(id)) {
                return Err(CoreError::validation(format!("area {id} does not exist")));
            }
        }

        let statuses = self.inner.client.arm_status(request.as_wire(), area).await?;
        Ok(statuses.into_iter().map(ArmStatus::from).collect())
    }

    fn ensure_synced(&self) -> Result<(), CoreError> {
        match self.sync_state() {
            SyncState::Synced => Ok(()),
            state => Err(CoreError::ConnectionFailed {
                url: self.inner.config.url.to_string(),
                reason: format!("bridge is {state}"),
            }),
        }
    }

    // ── State observation ────────────────────────────────────────────

    pub fn sync_state(&self) -> SyncState {
        self.inner.processor.sync_state()
    }

    pub fn subscribe_sync_state(&self) -> watch::Receiver<SyncState> {
        self.inner.processor.subscribe_state()
    }

    pub fn sync_transitions(&self) -> broadcast::Receiver<SyncTransition> {
        self.inner.processor.subscribe_transitions()
    }

    /// Subscribe to change notifications.
    pub fn changes(&self) -> broadcast::Receiver<Arc<ChangeSet>> {
        self.inner.processor.subscribe_changes()
    }

    /// Change notifications as a `Stream`. Lagged gaps are logged and skipped.
    pub fn change_stream(&self) -> impl Stream<Item = Arc<ChangeSet>> + Send + 'static {
        BroadcastStream::new(self.changes()).filter_map(|item| async move {
            match item {
                Ok(changes) => Some(changes),
                Err(BroadcastStreamRecvError::Lagged(n)) => {
                    warn!(skipped = n, "change stream lagged");
                    None
                }
            }
        })
    }
}

// ── Background tasks ─────────────────────────────────────────────────

/// Resync bookkeeping of one push task.
#[derive(Debug, Default)]
struct Resync {
    /// The store may have missed events since the last snapshot.
    needed: bool,
    /// Consecutive failed resyncs on a live session.
    attempt: u32,
    /// When the next timed retry fires, if one is scheduled.
    retry_at: Option<Instant>,
}

impl Resync {
    fn gap(&mut self) {
        *self = Self {
            needed: true,
            ..Self::default()
        };
    }
}

/// Feed push signals into the processor, resyncing after every gap.
///
/// A resync that fails while the push session is up is retried on a
/// backoff timer, so a quiet gateway cannot leave the bridge stuck in
/// `Reconnecting`.
async fn push_task(
    bridge: Bridge,
    mut channel: EventChannel,
    mut reload_rx: mpsc::Receiver<ReloadReply>,
    cancel: CancellationToken,
) {
    let processor = &bridge.inner.processor;
    // The initial load stands in for the first session's resync.
    let mut resync = Resync::default();
    let mut session_live = true;

    loop {
        let retry_armed = session_live && resync.retry_at.is_some();
        let retry_at = resync.retry_at.unwrap_or_else(Instant::now);

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep_until(retry_at), if retry_armed => {
                resync.retry_at = None;
                let _ = run_resync(&bridge, &mut resync, &cancel).await;
            }
            Some(reply) = reload_rx.recv() => {
                let result = if session_live {
                    run_resync(&bridge, &mut resync, &cancel).await
                } else {
                    Err(CoreError::ConnectionFailed {
                        url: bridge.inner.config.url.to_string(),
                        reason: "push channel is reconnecting".into(),
                    })
                };
                let _ = reply.send(result);
            }
            signal = channel.recv() => {
                let Some(signal) = signal else { break };
                match signal {
                    StreamSignal::Connected => {
                        session_live = true;
                        if resync.needed {
                            let _ = run_resync(&bridge, &mut resync, &cancel).await;
                        }
                    }
                    StreamSignal::Frame(text) => {
                        if processor.handle_frame(&text) == FrameOutcome::ReloadRequested {
                            let _ = run_resync(&bridge, &mut resync, &cancel).await;
                        }
                    }
                    StreamSignal::Disconnected { reason } => {
                        session_live = false;
                        processor.handle_disconnect(&reason);
                        resync.gap();
                    }
                    StreamSignal::Failed { reason } => {
                        error!(%reason, "push channel gave up");
                        processor.handle_disconnect(&reason);
                        break;
                    }
                }
            }
        }
    }

    channel.shutdown();
    debug!("push task exiting");
}

/// Resync once; on failure schedule the next timed attempt.
async fn run_resync(
    bridge: &Bridge,
    resync: &mut Resync,
    cancel: &CancellationToken,
) -> Result<Arc<ChangeSet>, CoreError> {
    let result = bridge.resync(cancel).await;
    if result.is_ok() {
        *resync = Resync::default();
    } else {
        let delay = calculate_backoff(resync.attempt, &bridge.inner.config.reconnect);
        warn!(
            attempt = resync.attempt,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            "scheduling resync retry"
        );
        resync.needed = true;
        resync.attempt = resync.attempt.saturating_add(1);
        resync.retry_at = Some(Instant::now() + delay);
    }
    result
}

/// Fetch and convert a snapshot, retrying retryable failures with backoff.
async fn fetch_with_retry(
    inner: &BridgeInner,
    cancel: &CancellationToken,
) -> Result<Snapshot, CoreError> {
    let max_retries = inner.config.max_connect_retries;
    let mut attempt: u32 = 0;

    loop {
        let result = match inner.client.fetch_snapshot().await {
            Ok(raw) => Snapshot::try_from(raw),
            Err(e) => Err(CoreError::from(e)),
        };

        let e = match result {
            Ok(snapshot) => return Ok(snapshot),
            Err(e) if e.is_retryable() && max_retries.is_none_or(|max| attempt < max) => e,
            Err(e) => return Err(e),
        };

        let delay: Duration = calculate_backoff(attempt, &inner.config.reconnect);
        warn!(
            error = %e,
            attempt,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            "snapshot fetch failed, retrying"
        );
        tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(e),
            () = tokio::time::sleep(delay) => {}
        }
        attempt = attempt.saturating_add(1);
    }
}

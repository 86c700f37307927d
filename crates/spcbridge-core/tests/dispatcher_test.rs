#![allow(clippy::unwrap_used)]
// Command dispatcher tests with an in-memory gateway double.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pretty_assertions::assert_eq;
use secrecy::{ExposeSecret, SecretString};

use spcbridge_core::{
    Action, Area, Command, CommandDispatcher, CommandResponse, CoreError, Door, EntityRef,
    PanelGateway, Snapshot, StateStore,
};

// ── Gateway double ──────────────────────────────────────────────────

#[derive(Default)]
struct RecordingGateway {
    log: Mutex<Vec<String>>,
    /// Per-target delay before answering.
    delays: HashMap<EntityRef, Duration>,
    /// Per-target result code.
    codes: HashMap<EntityRef, u32>,
}

impl RecordingGateway {
    fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    fn calls(&self) -> usize {
        self.log().iter().filter(|l| l.starts_with("start")).count()
    }
}

impl PanelGateway for RecordingGateway {
    async fn dispatch(
        &self,
        target: EntityRef,
        action: Action,
        code: Option<&SecretString>,
    ) -> Result<CommandResponse, CoreError> {
        let tag = format!(
            "{target} {action} {}",
            code.map_or("-", |c| c.expose_secret())
        );
        self.log.lock().unwrap().push(format!("start {tag}"));

        if let Some(delay) = self.delays.get(&target) {
            tokio::time::sleep(*delay).await;
        }

        self.log.lock().unwrap().push(format!("end {tag}"));
        let code = self.codes.get(&target).copied().unwrap_or(0);
        Ok(CommandResponse {
            code,
            message: if code == 0 { "OK".into() } else { "Zone open".into() },
        })
    }
}

fn store() -> Arc<StateStore> {
    let store = StateStore::new();
    store
        .load(Snapshot {
            areas: vec![Area {
                id: 2,
                name: "Garage".into(),
                ..Area::default()
            }],
            doors: vec![
                Door {
                    id: 1,
                    name: "Front".into(),
                    ..Door::default()
                },
                Door {
                    id: 2,
                    name: "Back".into(),
                    ..Door::default()
                },
            ],
            ..Snapshot::default()
        })
        .unwrap();
    Arc::new(store)
}

fn dispatcher(gateway: RecordingGateway) -> Arc<CommandDispatcher<RecordingGateway>> {
    Arc::new(CommandDispatcher::new(gateway, store(), Duration::from_secs(10)))
}

// ── Validation ──────────────────────────────────────────────────────

#[tokio::test]
async fn missing_area_is_rejected_before_any_call() {
    let dispatcher = dispatcher(RecordingGateway::default());
    let command = Command::new(EntityRef::area(1), Action::Set)
        .with_code(SecretString::from("1234".to_string()));

    let result = dispatcher.dispatch(command).await;

    assert!(
        matches!(result, Err(CoreError::ValidationFailed { .. })),
        "expected ValidationFailed, got: {result:?}"
    );
    assert_eq!(dispatcher.gateway().calls(), 0);
}

#[tokio::test]
async fn action_not_valid_for_kind_is_rejected() {
    let dispatcher = dispatcher(RecordingGateway::default());

    let result = dispatcher.dispatch(Command::new(EntityRef::door(1), Action::SetA)).await;

    assert!(matches!(result, Err(CoreError::ValidationFailed { .. })));
    assert_eq!(dispatcher.gateway().calls(), 0);
}

#[tokio::test]
async fn user_accepts_no_actions() {
    let dispatcher = dispatcher(RecordingGateway::default());
    let result = dispatcher.dispatch(Command::new(EntityRef::user(1), Action::On)).await;
    assert!(matches!(result, Err(CoreError::ValidationFailed { .. })));
}

// ── Results ─────────────────────────────────────────────────────────

#[tokio::test]
async fn code_is_forwarded_and_success_returned() {
    let dispatcher = dispatcher(RecordingGateway::default());
    let command = Command::new(EntityRef::area(2), Action::SetA)
        .with_code(SecretString::from("1234".to_string()));

    let response = dispatcher.dispatch(command).await.unwrap();

    assert!(response.is_success());
    assert_eq!(
        dispatcher.gateway().log(),
        vec!["start area:2 set_a 1234", "end area:2 set_a 1234"]
    );
}

#[tokio::test]
async fn non_zero_code_is_command_rejected() {
    let gateway = RecordingGateway {
        codes: HashMap::from([(EntityRef::area(2), 7)]),
        ..RecordingGateway::default()
    };
    let dispatcher = dispatcher(gateway);

    match dispatcher.dispatch(Command::new(EntityRef::area(2), Action::Set)).await {
        Err(CoreError::CommandRejected { code, message }) => {
            assert_eq!(code, 7);
            assert_eq!(message, "Zone open");
        }
        other => panic!("expected CommandRejected, got: {other:?}"),
    }
}

// ── Concurrency ─────────────────────────────────────────────────────

/// Yield until the gateway has seen `n` call starts.
async fn wait_for_starts(dispatcher: &CommandDispatcher<RecordingGateway>, n: usize) {
    while dispatcher.gateway().calls() < n {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn same_door_commands_are_serialised() {
    let gateway = RecordingGateway {
        delays: HashMap::from([(EntityRef::door(1), Duration::from_millis(200))]),
        ..RecordingGateway::default()
    };
    let dispatcher = dispatcher(gateway);

    let first = {
        let d = Arc::clone(&dispatcher);
        tokio::spawn(async move { d.dispatch(Command::new(EntityRef::door(1), Action::Lock)).await })
    };
    wait_for_starts(&dispatcher, 1).await;

    let second = {
        let d = Arc::clone(&dispatcher);
        tokio::spawn(async move { d.dispatch(Command::new(EntityRef::door(1), Action::Unlock)).await })
    };

    first.await.unwrap().unwrap();
    second.await.unwrap().unwrap();

    assert_eq!(
        dispatcher.gateway().log(),
        vec![
            "start door:1 lock -",
            "end door:1 lock -",
            "start door:1 unlock -",
            "end door:1 unlock -",
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn different_doors_run_concurrently() {
    let gateway = RecordingGateway {
        delays: HashMap::from([
            (EntityRef::door(1), Duration::from_millis(200)),
            (EntityRef::door(2), Duration::from_millis(10)),
        ]),
        ..RecordingGateway::default()
    };
    let dispatcher = dispatcher(gateway);

    let slow = {
        let d = Arc::clone(&dispatcher);
        tokio::spawn(async move { d.dispatch(Command::new(EntityRef::door(1), Action::Open)).await })
    };
    wait_for_starts(&dispatcher, 1).await;
    let fast = {
        let d = Arc::clone(&dispatcher);
        tokio::spawn(async move { d.dispatch(Command::new(EntityRef::door(2), Action::Open)).await })
    };

    fast.await.unwrap().unwrap();
    slow.await.unwrap().unwrap();

    assert_eq!(
        dispatcher.gateway().log(),
        vec![
            "start door:1 open -",
            "start door:2 open -",
            "end door:2 open -",
            "end door:1 open -",
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn timeout_releases_the_target_slot() {
    let gateway = RecordingGateway {
        delays: HashMap::from([(EntityRef::door(1), Duration::from_secs(3600))]),
        ..RecordingGateway::default()
    };
    let dispatcher = Arc::new(CommandDispatcher::new(
        gateway,
        store(),
        Duration::from_secs(10),
    ));

    let result = dispatcher.dispatch(Command::new(EntityRef::door(1), Action::Lock)).await;
    assert!(
        matches!(result, Err(CoreError::Timeout { timeout_ms: 10_000 })),
        "expected Timeout, got: {result:?}"
    );

    // The slot is free again: a second command reaches the gateway.
    let second = dispatcher.dispatch(Command::new(EntityRef::door(1), Action::Unlock));
    let _ = tokio::time::timeout(Duration::from_secs(1), second).await;
    assert_eq!(dispatcher.gateway().calls(), 2);
}

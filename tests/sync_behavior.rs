//! Behaviour tests for the sync loop and submission pipeline working
//! together, with a mock API whose response timing is scripted. These cover
//! the ordering guarantees a fast unit test cannot: overlapping fetches,
//! stopped-loop discards, and the submit → refresh handoff.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use reminder_sync::{
    Health, ListSnapshot, NewTaskRequest, SubmissionPipeline, SubmitOutcome, SyncConfig,
    SyncError, SyncHandle, SyncLoop, Task, TaskApi, TaskCreated,
};

fn task(id: &str) -> Task {
    Task {
        task_id: id.into(),
        title: format!("task {id}"),
        time: "2026-09-01T09:00:00+00:00".into(),
        phone: "+1234567890".into(),
        name: None,
        status: "pending".into(),
    }
}

enum Fetch {
    Tasks(Vec<Task>),
    Fail(&'static str),
}

/// Mock API whose nth `list_tasks` call sleeps for the nth scripted delay
/// before answering with the nth outcome. Repeats the final entry once the
/// script runs out.
struct TimedApi {
    fetches: Vec<(Duration, Fetch)>,
    list_calls: AtomicUsize,
    add_calls: AtomicUsize,
    reject_adds: bool,
}

impl TimedApi {
    fn new(fetches: Vec<(Duration, Fetch)>) -> Self {
        Self {
            fetches,
            list_calls: AtomicUsize::new(0),
            add_calls: AtomicUsize::new(0),
            reject_adds: false,
        }
    }

    fn rejecting_adds(mut self) -> Self {
        self.reject_adds = true;
        self
    }

    fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

/// Local wrapper so the foreign `TaskApi` trait can be implemented for a
/// shared `TimedApi` without tripping the orphan rule on `Arc`.
#[derive(Clone)]
struct SharedApi(Arc<TimedApi>);

impl TaskApi for SharedApi {
    async fn list_tasks(&self) -> reminder_sync::Result<Vec<Task>> {
        let n = self.0.list_calls.fetch_add(1, Ordering::SeqCst);
        let (delay, outcome) = &self.0.fetches[n.min(self.0.fetches.len() - 1)];
        tokio::time::sleep(*delay).await;
        match outcome {
            Fetch::Tasks(tasks) => Ok(tasks.clone()),
            Fetch::Fail(message) => Err(SyncError::Transport((*message).to_owned())),
        }
    }

    async fn add_task(&self, _request: &NewTaskRequest) -> reminder_sync::Result<TaskCreated> {
        self.0.add_calls.fetch_add(1, Ordering::SeqCst);
        if self.0.reject_adds {
            return Err(SyncError::api(400, Some("phone invalid".into())));
        }
        Ok(TaskCreated {
            task_id: "created-1".into(),
        })
    }

    async fn health(&self) -> reminder_sync::Result<Health> {
        Ok(Health {
            status: "ok".into(),
        })
    }
}

/// Spawn a loop over `api` with a long interval, so every fetch after the
/// first is driven explicitly by the test.
fn spawn_manual(api: Arc<TimedApi>) -> SyncHandle {
    let config = SyncConfig::default();
    SyncLoop::new(SharedApi(api), &config)
        .with_poll_interval(Duration::from_secs(60))
        .spawn()
}

async fn wait_for_calls(api: &TimedApi, at_least: usize) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while api.list_calls() < at_least {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("expected fetches issued");
}

#[tokio::test]
async fn later_tick_beats_slow_earlier_fetch() {
    // First fetch is slow and returns a shorter (older) list; a refresh
    // issued while it is in flight returns quickly with the longer one.
    let api = Arc::new(TimedApi::new(vec![
        (Duration::from_millis(300), Fetch::Tasks(vec![task("x")])),
        (
            Duration::from_millis(10),
            Fetch::Tasks(vec![task("x"), task("y")]),
        ),
    ]));
    let handle = spawn_manual(Arc::clone(&api));

    wait_for_calls(&api, 1).await;
    handle.refresh_now();
    wait_for_calls(&api, 2).await;

    // Give both responses time to land, slow one last.
    tokio::time::sleep(Duration::from_millis(500)).await;
    let snapshot = handle.snapshot();
    assert_eq!(
        snapshot.tasks.len(),
        2,
        "stale early response must not overwrite the newer list"
    );
    assert!(snapshot.error.is_none());
    handle.stop();
}

#[tokio::test]
async fn slow_failure_never_masks_newer_success() {
    let api = Arc::new(TimedApi::new(vec![
        (Duration::from_millis(300), Fetch::Fail("connection refused")),
        (Duration::from_millis(10), Fetch::Tasks(vec![task("x")])),
    ]));
    let handle = spawn_manual(Arc::clone(&api));

    wait_for_calls(&api, 1).await;
    handle.refresh_now();
    tokio::time::sleep(Duration::from_millis(500)).await;

    let snapshot = handle.snapshot();
    assert_eq!(snapshot.tasks.len(), 1);
    assert!(
        snapshot.error.is_none(),
        "stale failure must not flag an error over a newer success"
    );
    handle.stop();
}

#[tokio::test]
async fn stop_discards_in_flight_fetch() {
    let api = Arc::new(TimedApi::new(vec![(
        Duration::from_millis(200),
        Fetch::Tasks(vec![task("x")]),
    )]));
    let handle = spawn_manual(Arc::clone(&api));

    wait_for_calls(&api, 1).await;
    handle.stop();

    // The fetch completes after stop; its result must not be published.
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(handle.snapshot(), ListSnapshot::default());
}

#[tokio::test]
async fn accepted_submission_triggers_one_refresh() {
    let api = Arc::new(TimedApi::new(vec![(
        Duration::from_millis(1),
        Fetch::Tasks(vec![task("x")]),
    )]));
    let handle = spawn_manual(Arc::clone(&api));
    let pipeline = SubmissionPipeline::new(SharedApi(Arc::clone(&api)), handle.refresh_handle());

    wait_for_calls(&api, 1).await;

    pipeline.edit_draft(|draft| {
        draft.title = "Call mum".into();
        draft.time = "2026-09-01T14:30".into();
        draft.phone = "+1234567890".into();
    });
    let outcome = pipeline.submit().await.expect("submit succeeds");
    assert!(matches!(outcome, SubmitOutcome::Accepted { .. }));
    assert!(pipeline.draft().is_empty());

    // Poll interval is 60 s; a second fetch this soon means refresh fired.
    wait_for_calls(&api, 2).await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(api.list_calls(), 2, "exactly one extra fetch");
    handle.stop();
}

#[tokio::test]
async fn rejected_submission_leaves_list_and_draft_alone() {
    let api = Arc::new(
        TimedApi::new(vec![(
            Duration::from_millis(1),
            Fetch::Tasks(vec![task("x")]),
        )])
        .rejecting_adds(),
    );
    let handle = spawn_manual(Arc::clone(&api));
    let pipeline = SubmissionPipeline::new(SharedApi(Arc::clone(&api)), handle.refresh_handle());

    wait_for_calls(&api, 1).await;

    pipeline.edit_draft(|draft| {
        draft.title = "Call mum".into();
        draft.time = "2026-09-01T14:30".into();
        draft.phone = "not a phone".into();
    });
    let err = pipeline.submit().await.unwrap_err();
    assert_eq!(err.to_string(), "phone invalid");
    assert_eq!(pipeline.last_error().as_deref(), Some("phone invalid"));
    assert_eq!(pipeline.draft().phone, "not a phone", "draft preserved");

    // No refresh on failure, and the published list is untouched.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(api.list_calls(), 1);
    let snapshot = handle.snapshot();
    assert_eq!(snapshot.tasks.len(), 1);
    assert!(snapshot.error.is_none());
    handle.stop();
}

//! Periodic task-list synchronization.
//!
//! [`SyncLoop`] polls `GET /tasks` on a fixed interval and republishes the
//! authoritative list through a [`watch`] channel. It owns the "last known
//! good" snapshot: a failed fetch sets the error slot but never blanks the
//! previously published list.
//!
//! # Ordering
//!
//! A tick fires whether or not the previous fetch has completed, so fetches
//! can overlap. Each tick carries a sequence number and a response may only
//! publish if no later-issued tick has published before it: last-writer-wins
//! by tick *issuance* order, not response-arrival order. A slow, stale
//! response from an early tick can never overwrite the result of a newer one.
//!
//! # Lifecycle
//!
//! The loop is an explicit object: [`SyncLoop::new`] → [`SyncLoop::spawn`] →
//! [`SyncHandle::stop`]. The handle cancels the loop when dropped, so an
//! instance never leaks its timer. After `stop()`, in-flight fetches may
//! still complete but their results are discarded.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::TaskApi;
use crate::config::SyncConfig;
use crate::types::{ListSnapshot, Task};

/// Sequence-gated publisher shared by the loop and its in-flight fetches.
///
/// Holds the single published-list slot (the watch channel) and the
/// high-water mark of the newest tick that has published so far.
struct Publisher {
    tx: watch::Sender<ListSnapshot>,
    last_published: Mutex<u64>,
}

impl Publisher {
    fn new(tx: watch::Sender<ListSnapshot>) -> Self {
        Self {
            tx,
            last_published: Mutex::new(0),
        }
    }

    /// Claim the right to publish for tick `seq`. Returns `false` if a
    /// later-issued tick already published.
    fn claim(&self, seq: u64) -> bool {
        let mut last = self
            .last_published
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if seq <= *last {
            return false;
        }
        *last = seq;
        true
    }

    /// Publish a successful fetch: replace the list wholesale, clear the
    /// error slot.
    fn publish_tasks(&self, seq: u64, tasks: Vec<Task>) {
        if !self.claim(seq) {
            debug!(seq, "discarding stale fetch result");
            return;
        }
        self.tx.send_modify(|snapshot| {
            snapshot.tasks = tasks;
            snapshot.error = None;
        });
    }

    /// Publish a failed fetch: set the error slot, keep the previous list
    /// visible (stale-but-available beats blank).
    fn publish_error(&self, seq: u64, message: String) {
        if !self.claim(seq) {
            debug!(seq, "discarding stale fetch error");
            return;
        }
        self.tx.send_modify(|snapshot| {
            snapshot.error = Some(message);
        });
    }
}

/// Requests an out-of-band sync tick.
///
/// Cloneable and cheap; held by the submission pipeline to refresh the list
/// right after a task is accepted. Requests sent after the loop has stopped
/// are silently dropped.
#[derive(Debug, Clone)]
pub struct RefreshHandle {
    tx: mpsc::UnboundedSender<()>,
}

impl RefreshHandle {
    pub(crate) fn new(tx: mpsc::UnboundedSender<()>) -> Self {
        Self { tx }
    }

    /// Trigger one extra tick outside the interval cadence. Does not reset
    /// or disturb the interval's own schedule.
    pub fn request(&self) {
        if self.tx.send(()).is_err() {
            debug!("refresh requested after sync loop stopped");
        }
    }
}

/// Handle to a running [`SyncLoop`].
///
/// Dropping the handle stops the loop.
#[derive(Debug)]
pub struct SyncHandle {
    cancel: CancellationToken,
    refresh: RefreshHandle,
    snapshot_rx: watch::Receiver<ListSnapshot>,
}

impl SyncHandle {
    /// Subscribe to published snapshots. The receiver always holds the most
    /// recently published [`ListSnapshot`].
    pub fn subscribe(&self) -> watch::Receiver<ListSnapshot> {
        self.snapshot_rx.clone()
    }

    /// Clone of the currently published snapshot.
    pub fn snapshot(&self) -> ListSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Trigger one extra fetch outside the interval cadence.
    pub fn refresh_now(&self) {
        self.refresh.request();
    }

    /// A cloneable handle for requesting refreshes, for components that
    /// should not hold the whole [`SyncHandle`].
    pub fn refresh_handle(&self) -> RefreshHandle {
        self.refresh.clone()
    }

    /// Stop the loop. In-flight fetches may complete but publish nothing.
    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// The periodic fetch-and-publish loop.
pub struct SyncLoop<C: TaskApi + 'static> {
    api: Arc<C>,
    poll_interval: Duration,
    publisher: Arc<Publisher>,
    cancel: CancellationToken,
    refresh_tx: mpsc::UnboundedSender<()>,
    refresh_rx: mpsc::UnboundedReceiver<()>,
    snapshot_rx: watch::Receiver<ListSnapshot>,
}

impl<C: TaskApi + 'static> SyncLoop<C> {
    /// Create a loop polling `api` every `config.poll_interval_secs` seconds.
    ///
    /// Nothing runs until [`spawn`](Self::spawn) is called.
    pub fn new(api: C, config: &SyncConfig) -> Self {
        let (snapshot_tx, snapshot_rx) = watch::channel(ListSnapshot::default());
        let (refresh_tx, refresh_rx) = mpsc::unbounded_channel();
        Self {
            api: Arc::new(api),
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            publisher: Arc::new(Publisher::new(snapshot_tx)),
            cancel: CancellationToken::new(),
            refresh_tx,
            refresh_rx,
            snapshot_rx,
        }
    }

    /// Override the poll interval with sub-second resolution (for tests).
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Start the loop on the tokio runtime.
    ///
    /// The first fetch is issued immediately, then one per interval until
    /// the returned handle is stopped or dropped.
    pub fn spawn(self) -> SyncHandle {
        let handle = SyncHandle {
            cancel: self.cancel.clone(),
            refresh: RefreshHandle::new(self.refresh_tx.clone()),
            snapshot_rx: self.snapshot_rx.clone(),
        };
        tokio::spawn(self.run());
        handle
    }

    /// Run the loop until cancelled. The first interval tick fires
    /// immediately.
    async fn run(mut self) {
        info!(interval = ?self.poll_interval, "sync loop started");
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut seq: u64 = 0;

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!("sync loop stopped");
                    break;
                }
                _ = ticker.tick() => {
                    seq += 1;
                    self.issue_fetch(seq);
                }
                Some(()) = self.refresh_rx.recv() => {
                    seq += 1;
                    debug!(seq, "out-of-band refresh");
                    self.issue_fetch(seq);
                }
            }
        }
    }

    /// Issue one fetch as its own task so a slow response never blocks the
    /// ticker or a newer fetch.
    fn issue_fetch(&self, seq: u64) {
        let api = Arc::clone(&self.api);
        let publisher = Arc::clone(&self.publisher);
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            let outcome = api.list_tasks().await;
            if cancel.is_cancelled() {
                // Stopped while in flight: no observable effect after stop.
                return;
            }
            match outcome {
                Ok(tasks) => publisher.publish_tasks(seq, tasks),
                Err(err) => {
                    warn!(seq, error = %err, "task list fetch failed");
                    publisher.publish_error(seq, err.to_string());
                }
            }
        });
    }
}

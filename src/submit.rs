//! Draft validation, normalization, and submission.
//!
//! [`SubmissionPipeline`] owns the client-side [`DraftTask`] and the
//! displayed submission error, and turns the draft into a validated,
//! time-normalized `POST /add-task` request. On success the draft is reset
//! and one out-of-band sync refresh is requested, so the UI never shows
//! state the server has not acknowledged. On failure the draft is left
//! untouched for the user to retry.
//!
//! State machine: Idle → Submitting → {Idle-with-cleared-draft on success |
//! Idle-with-error on failure}. There are no automatic retries, and there is
//! no idempotency key; the single-outstanding-request guard is the only
//! safeguard against rapid double submission.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, warn};

use crate::api::TaskApi;
use crate::error::{Result, SyncError};
use crate::sync::RefreshHandle;
use crate::timefmt;
use crate::types::{DraftTask, NewTaskRequest};

/// Outcome of a [`SubmissionPipeline::submit`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The server accepted the task and assigned it an identifier.
    Accepted {
        /// Identifier of the newly created task.
        task_id: String,
    },
    /// A submission was already outstanding; no request was issued.
    Ignored,
}

/// Resets the in-flight flag when the submission path exits, on every
/// branch including early validation errors.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Validates, normalizes, and submits draft tasks.
#[derive(Debug)]
pub struct SubmissionPipeline<C: TaskApi> {
    api: Arc<C>,
    refresh: RefreshHandle,
    draft: Mutex<DraftTask>,
    error: Mutex<Option<String>>,
    in_flight: AtomicBool,
}

impl<C: TaskApi> SubmissionPipeline<C> {
    /// Create a pipeline submitting through `api`, requesting a sync
    /// refresh via `refresh` after each accepted task.
    pub fn new(api: C, refresh: RefreshHandle) -> Self {
        Self {
            api: Arc::new(api),
            refresh,
            draft: Mutex::new(DraftTask::default()),
            error: Mutex::new(None),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Clone of the current draft, for rendering the form.
    pub fn draft(&self) -> DraftTask {
        self.lock_draft().clone()
    }

    /// Apply an edit to the draft (one per keystroke, typically).
    pub fn edit_draft(&self, edit: impl FnOnce(&mut DraftTask)) {
        edit(&mut self.lock_draft());
    }

    /// The message from the most recent failed submission, if any.
    /// Cleared by the next successful submission.
    pub fn last_error(&self) -> Option<String> {
        self.lock_error().clone()
    }

    /// Whether a submission is currently outstanding. A UI should render
    /// its submit control as inert while this is true.
    pub fn is_submitting(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Validate, normalize, and submit the current draft.
    ///
    /// Returns [`SubmitOutcome::Ignored`] without issuing a request if a
    /// submission is already outstanding.
    ///
    /// # Errors
    ///
    /// [`SyncError::Validation`] if a required field is missing or the time
    /// cannot be parsed; [`SyncError::Api`] or [`SyncError::Transport`] if
    /// the server rejects the request or is unreachable. In every error
    /// case the draft is preserved and the error message is stored for
    /// display.
    pub async fn submit(&self) -> Result<SubmitOutcome> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("submission already outstanding, ignoring");
            return Ok(SubmitOutcome::Ignored);
        }
        let _guard = InFlightGuard(&self.in_flight);

        let draft = self.lock_draft().clone();
        let request = match build_request(&draft) {
            Ok(request) => request,
            Err(err) => {
                *self.lock_error() = Some(err.to_string());
                return Err(err);
            }
        };

        match self.api.add_task(&request).await {
            Ok(created) => {
                self.lock_draft().reset();
                *self.lock_error() = None;
                self.refresh.request();
                debug!(task_id = %created.task_id, "task accepted");
                Ok(SubmitOutcome::Accepted {
                    task_id: created.task_id,
                })
            }
            Err(err) => {
                warn!(error = %err, "submission failed");
                *self.lock_error() = Some(err.to_string());
                Err(err)
            }
        }
    }

    fn lock_draft(&self) -> std::sync::MutexGuard<'_, DraftTask> {
        self.draft.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_error(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.error.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Validate a draft and build the wire request, normalizing the wall-clock
/// time to the UTC transmission format.
///
/// Phone format is not checked beyond non-empty; the server is authoritative
/// for E.164 correctness.
fn build_request(draft: &DraftTask) -> Result<NewTaskRequest> {
    let title = draft.title.trim();
    if title.is_empty() {
        return Err(SyncError::Validation("title is required".into()));
    }
    let phone = draft.phone.trim();
    if phone.is_empty() {
        return Err(SyncError::Validation("phone is required".into()));
    }
    let time = timefmt::normalize_wall_clock(&draft.time)?;

    let name = draft.name.trim();
    Ok(NewTaskRequest {
        title: title.to_owned(),
        time,
        phone: phone.to_owned(),
        name: (!name.is_empty()).then(|| name.to_owned()),
    })
}

//! # reminder-sync
//!
//! Client-side sync and submission engine for a phone-call reminder service.
//!
//! The server owns the task list (create, mutate, deliver); this crate keeps
//! a client's view of that list fresh under periodic polling and turns form
//! drafts into validated, time-normalized submissions. It is a library for a
//! view layer to embed: no network listeners, no persisted state, no UI.
//!
//! ## Design
//!
//! - [`SyncLoop`] polls `GET /tasks` every few seconds and republishes the
//!   list through a watch channel; stale responses from overlapping fetches
//!   are discarded by tick sequence number, and a failed fetch never blanks
//!   the previously published list
//! - [`SubmissionPipeline`] validates a [`DraftTask`], converts its local
//!   wall-clock time to an explicit-UTC instant, posts it, and on success
//!   resets the draft and triggers one immediate refresh, so the UI never
//!   shows a task the server has not acknowledged
//! - [`timefmt`] handles both directions of the timezone round-trip: local
//!   wall clock out, viewer-local display back in
//! - Errors carry stable display strings; a structured server rejection
//!   (`{"error": "..."}`) surfaces verbatim
//!
//! ## Usage
//!
//! ```no_run
//! # async fn example() -> reminder_sync::Result<()> {
//! let config = reminder_sync::SyncConfig::from_env();
//! let (sync, pipeline) = reminder_sync::start(config)?;
//!
//! let mut snapshots = sync.subscribe();
//! pipeline.edit_draft(|draft| {
//!     draft.title = "Revision of software development".into();
//!     draft.time = "2026-09-01T14:30".into();
//!     draft.phone = "+1234567890".into();
//! });
//! pipeline.submit().await?;
//!
//! snapshots.changed().await.ok();
//! for task in &snapshots.borrow().tasks {
//!     println!("{}: {}", task.title, task.status);
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod submit;
pub mod sync;
pub mod timefmt;
pub mod types;

pub use api::{HttpTaskApi, TaskApi};
pub use config::SyncConfig;
pub use error::{Result, SyncError};
pub use submit::{SubmissionPipeline, SubmitOutcome};
pub use sync::{RefreshHandle, SyncHandle, SyncLoop};
pub use timefmt::{format_local, normalize_wall_clock};
pub use types::{DraftTask, Health, ListSnapshot, NewTaskRequest, Task, TaskCreated};

/// Wire up a sync loop and submission pipeline against the HTTP API in
/// `config`, and start polling.
///
/// Must be called from within a tokio runtime. The loop issues its first
/// fetch immediately and keeps polling until the returned [`SyncHandle`] is
/// stopped or dropped.
///
/// # Errors
///
/// Returns [`SyncError::Config`] if the configuration is invalid, or
/// [`SyncError::Transport`] if the HTTP client cannot be constructed.
pub fn start(config: SyncConfig) -> Result<(SyncHandle, SubmissionPipeline<HttpTaskApi>)> {
    config.validate()?;
    let api = HttpTaskApi::new(&config)?;
    let handle = SyncLoop::new(api.clone(), &config).spawn();
    let pipeline = SubmissionPipeline::new(api, handle.refresh_handle());
    Ok((handle, pipeline))
}

//! Core types for the reminder task list and submission wire format.

use serde::{Deserialize, Serialize};

/// A scheduled reminder task as returned by the server.
///
/// Server-owned and read-only: the client never mutates a task, it only
/// replaces its whole view of the list with whatever the server returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Opaque identifier, stable and unique across the list.
    pub task_id: String,
    /// Reminder title.
    pub title: String,
    /// Scheduled instant, ISO-8601 with an explicit UTC offset.
    pub time: String,
    /// Recipient phone number in E.164 format.
    pub phone: String,
    /// Optional recipient display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Server-defined status label ("pending", "sent", "failed", ...).
    /// Treated as opaque; the set is open-ended and owned by the server.
    pub status: String,
}

/// Client-local, unsubmitted form state.
///
/// Exists only between user keystrokes and a successful submission. All
/// fields are plain strings as typed; `time` is a wall-clock value with no
/// offset attached (the `datetime-local` input shape).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftTask {
    /// Reminder title (required).
    pub title: String,
    /// Local wall-clock time as typed, e.g. `2026-09-01T14:30`.
    pub time: String,
    /// Recipient phone number (required; format checked server-side).
    pub phone: String,
    /// Optional recipient name. Empty means unset.
    pub name: String,
}

impl DraftTask {
    /// Clear all fields, returning the draft to its pristine state.
    /// Called after a successful submission.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Whether every field is empty.
    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.time.is_empty() && self.phone.is_empty() && self.name.is_empty()
    }
}

/// Request body for `POST /add-task`.
///
/// `time` carries the normalized instant (`%Y-%m-%dT%H:%M:%S+00:00`);
/// `name` is omitted from the JSON entirely when not provided.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTaskRequest {
    /// Reminder title.
    pub title: String,
    /// Normalized scheduled instant with explicit `+00:00` offset.
    pub time: String,
    /// Recipient phone number.
    pub phone: String,
    /// Optional recipient name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Success body returned by `POST /add-task`.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskCreated {
    /// Identifier assigned to the newly created task.
    pub task_id: String,
}

/// Body returned by `GET /health`.
#[derive(Debug, Clone, Deserialize)]
pub struct Health {
    /// Server-reported status, `"ok"` when healthy.
    pub status: String,
}

/// The snapshot the sync loop publishes to the display layer.
///
/// Both fields are replaced by single assignment, never mutated
/// incrementally, by whichever fetch currently holds the right to publish.
/// A failed fetch sets `error` but leaves `tasks` untouched, so a transient
/// failure never blanks the UI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListSnapshot {
    /// Last successfully fetched task list (stale-but-available on failure).
    pub tasks: Vec<Task>,
    /// Message from the most recent failed fetch, cleared on success.
    pub error: Option<String>,
}

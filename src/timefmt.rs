//! Wall-clock and instant conversion for the write and read paths.
//!
//! # Write path
//!
//! The time the user types has no timezone attached (the HTML
//! `datetime-local` shape, `2026-09-01T14:30`). [`normalize_wall_clock`]
//! interprets it in the host's local timezone and re-expresses it as a UTC
//! instant in the exact transmission format the server expects:
//! `%Y-%m-%dT%H:%M:%S+00:00`, whole seconds, explicit zero offset. The server
//! re-expresses that instant in whatever timezone its scheduler uses; the
//! client makes no assumption about it.
//!
//! # Read path
//!
//! [`format_local`] renders a transmitted instant in the viewer's local
//! timezone for display. A malformed server value is returned unmodified
//! rather than raising an error: display is the one place where degrading
//! gracefully beats failing loudly.

use chrono::{DateTime, Local, LocalResult, NaiveDateTime, TimeZone, Utc};
use tracing::warn;

use crate::error::{Result, SyncError};

/// Transmission format: UTC instant with an explicit `+00:00` offset,
/// truncated to whole seconds.
const WIRE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S+00:00";

/// Display format for task times, rendered in the viewer's local timezone.
const DISPLAY_FORMAT: &str = "%b %d, %Y %H:%M";

/// Wall-clock input shapes accepted from the draft form. Fractional seconds
/// parse but are truncated by the wire format.
const WALL_CLOCK_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Normalize a local wall-clock string into the UTC transmission format.
///
/// Interprets `input` in the host's local timezone. See [`normalize_in_zone`]
/// for the zone-generic core and the DST edge-case policy.
///
/// # Errors
///
/// Returns [`SyncError::Validation`] if the input is empty, unparseable, or
/// names a local time that does not exist in the host timezone.
pub fn normalize_wall_clock(input: &str) -> Result<String> {
    normalize_in_zone(input, &Local)
}

/// Zone-generic normalization core.
///
/// Separate from [`normalize_wall_clock`] so tests can pin a
/// [`chrono::FixedOffset`] instead of depending on the host timezone.
///
/// DST policy: an ambiguous wall-clock time (clocks rolled back) resolves to
/// the earlier instant; a nonexistent one (clocks sprang forward) is a
/// validation error rather than a silent shift.
pub fn normalize_in_zone<Tz: TimeZone>(input: &str, tz: &Tz) -> Result<String> {
    let instant = wall_clock_to_instant(input, tz)?;
    Ok(instant.format(WIRE_FORMAT).to_string())
}

/// Render a transmitted instant in the viewer's local timezone.
///
/// Returns the raw string unmodified if it cannot be parsed as an ISO-8601
/// instant with an offset.
pub fn format_local(raw: &str) -> String {
    format_in_zone(raw, &Local)
}

/// Zone-generic display core, split out for deterministic tests.
pub fn format_in_zone<Tz: TimeZone>(raw: &str, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    match DateTime::parse_from_rfc3339(raw) {
        Ok(instant) => instant.with_timezone(tz).format(DISPLAY_FORMAT).to_string(),
        Err(_) => raw.to_owned(),
    }
}

/// Interpret a wall-clock string as an instant in the given timezone.
fn wall_clock_to_instant<Tz: TimeZone>(input: &str, tz: &Tz) -> Result<DateTime<Utc>> {
    let token = input.trim();
    if token.is_empty() {
        return Err(SyncError::Validation("time is required".into()));
    }

    let naive = parse_wall_clock(token)?;
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(first, second) => {
            warn!(input = token, "ambiguous local time, using earliest");
            let chosen = if first <= second { first } else { second };
            Ok(chosen.with_timezone(&Utc))
        }
        LocalResult::None => Err(SyncError::Validation(format!(
            "local time does not exist in this timezone: {token}"
        ))),
    }
}

/// Parse one of the accepted wall-clock shapes into a [`NaiveDateTime`].
fn parse_wall_clock(token: &str) -> Result<NaiveDateTime> {
    for fmt in WALL_CLOCK_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(token, fmt) {
            return Ok(naive);
        }
    }
    Err(SyncError::Validation(format!(
        "unrecognized time format: {token} (expected YYYY-MM-DDTHH:MM)"
    )))
}

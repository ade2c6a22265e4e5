//! Inclusive time windows, transition averages, and windowed counts.

use chrono::{DateTime, Duration, Utc};
use hotellyx_core::model::Request;
use serde::Serialize;

/// An inclusive `[start, end]` interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Window {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Window {
    #[must_use]
    pub const fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// The `length` ending at `end`.
    #[must_use]
    pub fn trailing(end: DateTime<Utc>, length: Duration) -> Self {
        Self::new(end - length, end)
    }

    /// The window of equal length that ends where this one starts.
    #[must_use]
    pub fn previous(self) -> Self {
        Self::new(self.start - (self.end - self.start), self.start)
    }

    #[must_use]
    pub fn contains(self, ts: DateTime<Utc>) -> bool {
        within_range(ts, self.start, self.end)
    }
}

/// Inclusive on both ends.
#[must_use]
pub fn within_range(ts: DateTime<Utc>, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    ts >= start && ts <= end
}

/// Whether `ts` falls in the `hours` up to and including `now`.
#[must_use]
pub fn within_last_hours(ts: DateTime<Utc>, hours: u32, now: DateTime<Utc>) -> bool {
    Window::trailing(now, Duration::hours(i64::from(hours))).contains(ts)
}

/// Minutes from `start` to `end`, or `None` when `end` precedes `start`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn minutes_between(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<f64> {
    if end < start {
        return None;
    }
    Some((end - start).num_milliseconds() as f64 / 60_000.0)
}

/// The stamp a transition average is measured to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    /// Creation to first acceptance (response time).
    Accepted,
    /// Creation to first completion.
    Done,
}

impl Transition {
    #[must_use]
    pub const fn stamp(self, request: &Request) -> Option<DateTime<Utc>> {
        match self {
            Self::Accepted => request.stamps.accepted_at,
            Self::Done => request.stamps.done_at,
        }
    }
}

/// Mean minutes from creation to `transition` over requests whose stamp
/// falls inside `window`.
///
/// `None` means no request qualified; a genuine average of zero is
/// `Some(0.0)`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn average_transition_minutes(
    requests: &[Request],
    transition: Transition,
    window: Window,
) -> Option<f64> {
    let values: Vec<f64> = requests
        .iter()
        .filter_map(|request| {
            let stamp = transition.stamp(request).filter(|ts| window.contains(*ts))?;
            minutes_between(request.created_at, stamp)
        })
        .collect();

    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Requests created inside `window`.
#[must_use]
pub fn requests_in_window(requests: &[Request], window: Window) -> usize {
    requests
        .iter()
        .filter(|request| window.contains(request.created_at))
        .count()
}

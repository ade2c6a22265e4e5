use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ParseEnumError, iso, normalize};

/// The five request lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    New,
    Accepted,
    InProgress,
    Done,
    Cancelled,
}

impl RequestStatus {
    /// Every status, in display order.
    pub const ALL: [Self; 5] = [
        Self::New,
        Self::Accepted,
        Self::InProgress,
        Self::Done,
        Self::Cancelled,
    ];

    /// The canonical forward path. `Cancelled` is not on it.
    pub const FLOW: [Self; 4] = [Self::New, Self::Accepted, Self::InProgress, Self::Done];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Accepted => "accepted",
            Self::InProgress => "in_progress",
            Self::Done => "done",
            Self::Cancelled => "cancelled",
        }
    }

    /// Human label shown on boards and badges.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Accepted => "Accepted",
            Self::InProgress => "In progress",
            Self::Done => "Done",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Next status along [`Self::FLOW`].
    ///
    /// The last step and any status off the path (`Cancelled`) both map to
    /// `Done`.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::New => Self::Accepted,
            Self::Accepted => Self::InProgress,
            Self::InProgress | Self::Done | Self::Cancelled => Self::Done,
        }
    }

    /// `Done` and `Cancelled` end the lifecycle.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Cancelled)
    }
}

/// Staff-assigned urgency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
}

impl Priority {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
        }
    }
}

/// First-arrival timestamps, one per non-initial status.
///
/// Each slot is written at most once; see [`StatusStamps::stamp_if_unset`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusStamps {
    #[serde(with = "iso::option", skip_serializing_if = "Option::is_none")]
    pub accepted_at: Option<DateTime<Utc>>,
    #[serde(with = "iso::option", skip_serializing_if = "Option::is_none")]
    pub in_progress_at: Option<DateTime<Utc>>,
    #[serde(with = "iso::option", skip_serializing_if = "Option::is_none")]
    pub done_at: Option<DateTime<Utc>>,
    #[serde(with = "iso::option", skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl StatusStamps {
    /// The stamp recorded for `status`. `New` has no stamp slot.
    #[must_use]
    pub const fn get(&self, status: RequestStatus) -> Option<DateTime<Utc>> {
        match status {
            RequestStatus::New => None,
            RequestStatus::Accepted => self.accepted_at,
            RequestStatus::InProgress => self.in_progress_at,
            RequestStatus::Done => self.done_at,
            RequestStatus::Cancelled => self.cancelled_at,
        }
    }

    fn slot_mut(&mut self, status: RequestStatus) -> Option<&mut Option<DateTime<Utc>>> {
        match status {
            RequestStatus::New => None,
            RequestStatus::Accepted => Some(&mut self.accepted_at),
            RequestStatus::InProgress => Some(&mut self.in_progress_at),
            RequestStatus::Done => Some(&mut self.done_at),
            RequestStatus::Cancelled => Some(&mut self.cancelled_at),
        }
    }

    /// Record `now` as the first arrival at `status` unless already recorded.
    ///
    /// Returns `true` when a stamp was written.
    pub fn stamp_if_unset(&mut self, status: RequestStatus, now: DateTime<Utc>) -> bool {
        let Some(slot) = self.slot_mut(status) else {
            return false;
        };
        if slot.is_some() {
            return false;
        }
        *slot = Some(now);
        true
    }

    /// Whether no status beyond `New` has ever been reached.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.accepted_at.is_none()
            && self.in_progress_at.is_none()
            && self.done_at.is_none()
            && self.cancelled_at.is_none()
    }
}

/// A guest-initiated unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub id: String,
    pub room_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_number: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: RequestStatus,
    #[serde(with = "iso")]
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(with = "iso::option", skip_serializing_if = "Option::is_none")]
    pub scheduled_for: Option<DateTime<Utc>>,
    pub priority: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staff_note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_team: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_person: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eta_minutes: Option<u32>,
    #[serde(flatten)]
    pub stamps: StatusStamps,
}

/// One reached stage of a request's progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimelineEntry {
    pub label: &'static str,
    #[serde(with = "iso::option")]
    pub at: Option<DateTime<Utc>>,
}

impl Request {
    /// Display label for the request category.
    #[must_use]
    pub fn type_label(&self) -> String {
        format_request_type(&self.kind)
    }

    /// Room label for display: the denormalized number, else the token.
    #[must_use]
    pub fn room_label(&self) -> &str {
        self.room_number.as_deref().unwrap_or(&self.room_token)
    }

    /// `Submitted` followed by every stage of the forward path that was
    /// reached, either by current status or by a recorded stamp.
    #[must_use]
    pub fn timeline(&self) -> Vec<TimelineEntry> {
        let reached_rank = RequestStatus::FLOW
            .iter()
            .position(|status| *status == self.status);

        let mut entries = vec![TimelineEntry {
            label: "Submitted",
            at: Some(self.created_at),
        }];

        for (rank, stage) in RequestStatus::FLOW.iter().enumerate().skip(1) {
            let stamp = self.stamps.get(*stage);
            let by_status = reached_rank.is_some_and(|current| current >= rank);
            if by_status || stamp.is_some() {
                entries.push(TimelineEntry {
                    label: stage.label(),
                    at: stamp,
                });
            }
        }

        entries
    }
}

/// Display label for a request category; known quick-request types get a
/// friendly name, anything else renders verbatim.
#[must_use]
pub fn format_request_type(kind: &str) -> String {
    match kind.to_lowercase().as_str() {
        "towels" => "Towels".to_string(),
        "cleaning" => "Cleaning".to_string(),
        "water" => "Water".to_string(),
        "issue" => "Report an issue".to_string(),
        _ => kind.to_string(),
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        match normalized.as_str() {
            "new" => Ok(Self::New),
            "accepted" => Ok(Self::Accepted),
            "in_progress" => Ok(Self::InProgress),
            "done" => Ok(Self::Done),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(ParseEnumError {
                expected: "status",
                got: s.to_string(),
            }),
        }
    }
}

impl FromStr for Priority {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        match normalized.as_str() {
            "low" => Ok(Self::Low),
            "normal" => Ok(Self::Normal),
            "high" => Ok(Self::High),
            _ => Err(ParseEnumError {
                expected: "priority",
                got: s.to_string(),
            }),
        }
    }
}

//! Staff queue tabs, room search, and tab counts.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use hotellyx_core::model::{ParseEnumError, Request, RequestStatus, Room};
use hotellyx_core::rooms;
use serde::Serialize;

use crate::sla::is_sla_risk_at;

/// A tab on the staff board.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffTab {
    #[default]
    All,
    New,
    Accepted,
    InProgress,
    Done,
    SlaRisk,
}

impl StaffTab {
    pub const ALL: [Self; 6] = [
        Self::All,
        Self::New,
        Self::Accepted,
        Self::InProgress,
        Self::Done,
        Self::SlaRisk,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::New => "new",
            Self::Accepted => "accepted",
            Self::InProgress => "in_progress",
            Self::Done => "done",
            Self::SlaRisk => "sla_risk",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::New => "New",
            Self::Accepted => "Accepted",
            Self::InProgress => "In progress",
            Self::Done => "Done",
            Self::SlaRisk => "SLA risk",
        }
    }

    /// The status a tab filters on; `None` for `All` and `SlaRisk`.
    #[must_use]
    pub const fn status(self) -> Option<RequestStatus> {
        match self {
            Self::New => Some(RequestStatus::New),
            Self::Accepted => Some(RequestStatus::Accepted),
            Self::InProgress => Some(RequestStatus::InProgress),
            Self::Done => Some(RequestStatus::Done),
            Self::All | Self::SlaRisk => None,
        }
    }
}

impl fmt::Display for StaffTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StaffTab {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|tab| tab.as_str() == normalized)
            .ok_or_else(|| ParseEnumError {
                expected: "tab",
                got: s.to_string(),
            })
    }
}

/// How staff narrowed the queue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueFilter {
    pub tab: StaffTab,
    /// Case-insensitive substring of the room label or token.
    pub room_query: String,
}

/// Room label for a request: its own number, the registered room's number,
/// or the raw token.
#[must_use]
pub fn room_display(request: &Request, rooms_list: &[Room]) -> String {
    request
        .room_number
        .clone()
        .or_else(|| rooms::resolve(rooms_list, &request.room_token).map(|room| room.room_number.clone()))
        .unwrap_or_else(|| request.room_token.clone())
}

fn matches_tab(
    request: &Request,
    tab: StaffTab,
    now: DateTime<Utc>,
    sla_threshold_minutes: u32,
) -> bool {
    match tab {
        StaffTab::All => true,
        StaffTab::SlaRisk => is_sla_risk_at(request, now, sla_threshold_minutes),
        other => other.status() == Some(request.status),
    }
}

/// Requests visible under `filter`, newest first.
#[must_use]
pub fn filter_queue(
    requests: &[Request],
    rooms_list: &[Room],
    filter: &QueueFilter,
    now: DateTime<Utc>,
    sla_threshold_minutes: u32,
) -> Vec<Request> {
    let query = filter.room_query.trim().to_lowercase();

    let mut visible: Vec<Request> = requests
        .iter()
        .filter(|request| {
            query.is_empty()
                || room_display(request, rooms_list).to_lowercase().contains(&query)
                || request.room_token.to_lowercase().contains(&query)
        })
        .filter(|request| matches_tab(request, filter.tab, now, sla_threshold_minutes))
        .cloned()
        .collect();

    visible.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    visible
}

/// One tab with the number of requests under it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TabCount {
    pub tab: StaffTab,
    pub label: String,
    pub count: usize,
}

/// Counts for every tab. The SLA risk label carries its count, e.g.
/// `SLA risk (3)`.
#[must_use]
pub fn tab_counts(
    requests: &[Request],
    now: DateTime<Utc>,
    sla_threshold_minutes: u32,
) -> Vec<TabCount> {
    StaffTab::ALL
        .into_iter()
        .map(|tab| {
            let count = requests
                .iter()
                .filter(|request| matches_tab(request, tab, now, sla_threshold_minutes))
                .count();
            let label = match tab {
                StaffTab::SlaRisk => format!("{} ({count})", tab.label()),
                _ => tab.label().to_string(),
            };
            TabCount { tab, label, count }
        })
        .collect()
}

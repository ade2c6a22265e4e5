//! Live overview cards for the staff board.
//!
//! Each card pairs a current figure with the same figure one comparison
//! window earlier:
//!
//! | card              | current                       | baseline                         |
//! |-------------------|-------------------------------|----------------------------------|
//! | active requests   | active at `now`               | active at `now - offset`         |
//! | SLA risk          | at risk at `now`              | at risk at `now - offset`        |
//! | avg response      | `accepted_at` in last window  | the window before it             |
//! | avg completion    | `done_at` in last window      | the window before it             |
//! | requests per hour | created in last rate window   | the rate window before it        |

use chrono::{DateTime, Duration, Utc};
use hotellyx_core::config::HotelConfig;
use hotellyx_core::model::Request;
use serde::Serialize;
use tracing::debug;

use crate::format::format_duration;
use crate::sla::{is_active_at, is_sla_risk_at};
use crate::trend::{trend_count, trend_percent};
use crate::window::{Transition, Window, average_transition_minutes, requests_in_window};

/// One figure on the overview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricCard {
    pub id: &'static str,
    pub label: &'static str,
    pub value: String,
    pub helper: String,
    pub trend: Option<String>,
}

/// Thresholds and window lengths for [`live_overview`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverviewSettings {
    pub sla_threshold_minutes: u32,
    pub response_window: Duration,
    pub rate_window: Duration,
    pub comparison_offset: Duration,
}

impl Default for OverviewSettings {
    fn default() -> Self {
        Self::from(&HotelConfig::default())
    }
}

impl From<&HotelConfig> for OverviewSettings {
    fn from(config: &HotelConfig) -> Self {
        Self {
            sla_threshold_minutes: config.sla.threshold_minutes,
            response_window: Duration::hours(i64::from(config.dashboard.response_window_hours)),
            rate_window: Duration::minutes(i64::from(config.dashboard.rate_window_minutes)),
            comparison_offset: Duration::minutes(i64::from(
                config.dashboard.comparison_offset_minutes,
            )),
        }
    }
}

/// Compose the overview at `now`.
#[must_use]
pub fn live_overview(
    requests: &[Request],
    now: DateTime<Utc>,
    settings: &OverviewSettings,
) -> Vec<MetricCard> {
    let baseline_at = now - settings.comparison_offset;
    let threshold = settings.sla_threshold_minutes;

    let count_at = |at: DateTime<Utc>, pred: &dyn Fn(&Request, DateTime<Utc>) -> bool| {
        requests.iter().filter(|request| pred(request, at)).count()
    };
    let at_risk = |request: &Request, at: DateTime<Utc>| is_sla_risk_at(request, at, threshold);

    let active = count_at(now, &is_active_at);
    let active_before = count_at(baseline_at, &is_active_at);
    let risk = count_at(now, &at_risk);
    let risk_before = count_at(baseline_at, &at_risk);

    let response_window = Window::trailing(now, settings.response_window);
    let response = average_transition_minutes(requests, Transition::Accepted, response_window);
    let response_before =
        average_transition_minutes(requests, Transition::Accepted, response_window.previous());
    let completion = average_transition_minutes(requests, Transition::Done, response_window);
    let completion_before =
        average_transition_minutes(requests, Transition::Done, response_window.previous());

    let rate_window = Window::trailing(now, settings.rate_window);
    let rate = requests_in_window(requests, rate_window);
    let rate_before = requests_in_window(requests, rate_window.previous());

    debug!(active, risk, rate, "computed live overview");

    let response_helper = format!("Last {}h", settings.response_window.num_hours());

    vec![
        MetricCard {
            id: "active",
            label: "Active requests",
            value: active.to_string(),
            helper: "Live queue".to_string(),
            trend: trend_count(active, active_before),
        },
        MetricCard {
            id: "sla_risk",
            label: "SLA risk",
            value: risk.to_string(),
            helper: format!("Older than {threshold} min"),
            trend: trend_count(risk, risk_before),
        },
        MetricCard {
            id: "avg_response",
            label: "Avg response time",
            value: format_duration(response),
            helper: response_helper.clone(),
            trend: trend_percent(response, response_before),
        },
        MetricCard {
            id: "avg_completion",
            label: "Avg completion time",
            value: format_duration(completion),
            helper: response_helper,
            trend: trend_percent(completion, completion_before),
        },
        MetricCard {
            id: "per_hour",
            label: "Requests per hour",
            value: rate.to_string(),
            helper: format!("Last {} min", settings.rate_window.num_minutes()),
            trend: trend_count(rate, rate_before),
        },
    ]
}

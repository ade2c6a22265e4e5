//! `hx dashboard`: live operational overview for the front desk.

use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use clap::Args;
use hotellyx_core::clock::Clock;
use hotellyx_metrics::queue::{TabCount, tab_counts};
use hotellyx_metrics::{MetricCard, OverviewSettings, live_overview};
use serde::Serialize;

use crate::cmd::{Session, local_time, parse_timestamp};
use crate::output::{OutputMode, pretty_section, render_mode};

/// Arguments for `hx dashboard`.
#[derive(Args, Debug, Default)]
pub struct DashboardArgs {
    /// Evaluate the overview at this instant instead of now (RFC 3339).
    #[arg(long, value_parser = parse_timestamp)]
    pub at: Option<DateTime<Utc>>,
}

/// Report payload for `hx dashboard`.
#[derive(Debug, Serialize)]
pub struct Dashboard {
    #[serde(serialize_with = "serialize_at")]
    pub at: DateTime<Utc>,
    pub sla_threshold_minutes: u32,
    pub cards: Vec<MetricCard>,
    pub tabs: Vec<TabCount>,
}

fn serialize_at<S: serde::Serializer>(at: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&hotellyx_core::model::format_iso(*at))
}

/// Execute `hx dashboard`.
///
/// # Errors
///
/// Returns an error if the config is invalid, the store cannot be opened, or
/// output rendering fails.
pub fn run_dashboard(
    args: &DashboardArgs,
    store_flag: Option<&Path>,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    let session = Session::open(project_root, store_flag, output)?;
    let at = args.at.unwrap_or_else(|| session.clock.now());
    let settings = OverviewSettings::from(&session.config);
    let requests = session.requests().all();

    let payload = Dashboard {
        at,
        sla_threshold_minutes: settings.sla_threshold_minutes,
        cards: live_overview(&requests, at, &settings),
        tabs: tab_counts(&requests, at, settings.sla_threshold_minutes),
    };

    render_mode(
        output,
        &payload,
        |payload, w| render_dashboard_text(payload, w),
        |payload, w| render_dashboard_pretty(payload, w),
    )
}

fn render_dashboard_text(payload: &Dashboard, w: &mut dyn Write) -> std::io::Result<()> {
    for card in &payload.cards {
        writeln!(
            w,
            "{}\t{}\t{}",
            card.id,
            card.value,
            card.trend.as_deref().unwrap_or("-")
        )?;
    }
    Ok(())
}

fn render_dashboard_pretty(payload: &Dashboard, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, &format!("Live overview at {}", local_time(payload.at)))?;
    for card in &payload.cards {
        let trend = card
            .trend
            .as_deref()
            .map_or_else(String::new, |trend| format!("  ({trend} vs previous)"));
        writeln!(
            w,
            "{:<20} {:>7}  {:<18}{trend}",
            card.label, card.value, card.helper
        )?;
    }

    writeln!(w)?;
    pretty_section(w, "Queue")?;
    for tab in &payload.tabs {
        writeln!(w, "{:<14} {:>5}", tab.label, tab.count)?;
    }
    Ok(())
}

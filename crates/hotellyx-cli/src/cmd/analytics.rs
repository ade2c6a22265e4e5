//! `hx analytics`: which requests and services guests actually use.

use std::io::Write;
use std::path::Path;

use clap::Args;
use hotellyx_metrics::analytics::{CatalogReport, catalog_report};

use crate::cmd::Session;
use crate::output::{OutputMode, pretty_section, render_mode};

/// Arguments for `hx analytics`.
#[derive(Args, Debug, Default)]
pub struct AnalyticsArgs {
    /// Report services viewed fewer times than this as unused.
    #[arg(long)]
    pub unused_below: Option<u64>,
}

/// Execute `hx analytics`.
///
/// # Errors
///
/// Returns an error if the config is invalid, the store cannot be opened, or
/// output rendering fails.
pub fn run_analytics(
    args: &AnalyticsArgs,
    store_flag: Option<&Path>,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    let session = Session::open(project_root, store_flag, output)?;
    let catalog = session.catalog();
    let threshold = args
        .unused_below
        .unwrap_or(session.config.catalog.unused_view_threshold);

    let report = catalog_report(
        &session.requests().all(),
        &catalog.list(),
        &catalog.views(),
        threshold,
    );

    render_mode(
        output,
        &report,
        |report, w| render_analytics_text(report, w),
        |report, w| render_analytics_pretty(report, w),
    )
}

fn render_analytics_text(report: &CatalogReport, w: &mut dyn Write) -> std::io::Result<()> {
    for entry in &report.top_requested {
        writeln!(w, "top\t{}\t{}", entry.kind, entry.count)?;
    }
    for row in &report.conversion {
        writeln!(
            w,
            "conversion\t{}\t{}\t{}\t{}",
            row.id, row.views, row.requests, row.conversion
        )?;
    }
    for row in &report.unused {
        writeln!(w, "unused\t{}\t{}", row.id, row.views)?;
    }
    Ok(())
}

fn render_analytics_pretty(report: &CatalogReport, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, "Top requested")?;
    if report.top_requested.is_empty() {
        writeln!(w, "No requests yet.")?;
    }
    for (rank, entry) in report.top_requested.iter().enumerate() {
        writeln!(
            w,
            "{}. {:<28} {:>5}",
            rank + 1,
            hotellyx_core::model::request::format_request_type(&entry.kind),
            entry.count
        )?;
    }

    writeln!(w)?;
    pretty_section(w, "Service conversion")?;
    writeln!(w, "{:<24} {:>6} {:>9} {:>8}", "service", "views", "requests", "rate")?;
    for row in &report.conversion {
        writeln!(
            w,
            "{:<24} {:>6} {:>9} {:>8}",
            row.name, row.views, row.requests, row.conversion
        )?;
    }

    writeln!(w)?;
    pretty_section(
        w,
        &format!("Unused (fewer than {} views)", report.unused_view_threshold),
    )?;
    if report.unused.is_empty() {
        writeln!(w, "Every service is getting attention.")?;
    }
    for row in &report.unused {
        writeln!(w, "{:<24} {:>6}", row.name, row.views)?;
    }
    Ok(())
}

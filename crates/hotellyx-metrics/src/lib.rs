#![forbid(unsafe_code)]
//! hotellyx-metrics library.
//!
//! Every function here takes a request snapshot and a reference instant, so
//! each predicate and aggregate can be evaluated at any point in time.
//!
//! # Conventions
//!
//! - **Errors**: Nothing here fails. "No data" is `None`, never zero.
//! - **Logging**: Use `tracing` macros (`debug!`, `trace!`).

pub mod analytics;
pub mod dashboard;
pub mod format;
pub mod queue;
pub mod sla;
pub mod trend;
pub mod window;

pub use dashboard::{MetricCard, OverviewSettings, live_overview};
pub use sla::{is_active_at, is_sla_risk_at};
pub use trend::trend_percent;
pub use window::{Transition, Window, average_transition_minutes, requests_in_window};

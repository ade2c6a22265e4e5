//! Signed percentage change against a baseline.

use crate::format::round_half_up;

/// Percentage change from `previous` to `current`, rounded to a whole
/// percent: `+12%`, `-8%`, or `0%`.
///
/// `None` when either side has no data or the baseline is zero, so no trend
/// is invented from an empty baseline.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
pub fn trend_percent(current: Option<f64>, previous: Option<f64>) -> Option<String> {
    let (current, previous) = (current?, previous?);
    if previous == 0.0 || !current.is_finite() || !previous.is_finite() {
        return None;
    }

    let delta = round_half_up((current - previous) / previous * 100.0) as i64;
    Some(if delta > 0 {
        format!("+{delta}%")
    } else {
        format!("{delta}%")
    })
}

/// [`trend_percent`] for whole counts.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn trend_count(current: usize, previous: usize) -> Option<String> {
    trend_percent(Some(current as f64), Some(previous as f64))
}

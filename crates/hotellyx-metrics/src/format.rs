//! Display formatting for durations and ratios.

/// Round to the nearest integer, halves toward positive infinity.
///
/// Dashboard figures use this rather than [`f64::round`], which rounds
/// `-2.5` away from zero.
#[must_use]
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Render minutes as `-`, `Nm`, `Hh`, or `Hh Mm` after rounding to whole
/// minutes.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn format_duration(minutes: Option<f64>) -> String {
    let Some(minutes) = minutes.filter(|m| m.is_finite()) else {
        return "-".to_string();
    };

    let rounded = round_half_up(minutes) as i64;
    if rounded < 60 {
        return format!("{rounded}m");
    }

    let hours = rounded / 60;
    let mins = rounded % 60;
    if mins == 0 {
        format!("{hours}h")
    } else {
        format!("{hours}h {mins}m")
    }
}

/// `numerator / denominator` as a one-decimal percentage, `0%` when the
/// denominator is zero.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_percent(numerator: u64, denominator: u64) -> String {
    if denominator == 0 {
        return "0%".to_string();
    }
    let value = numerator as f64 / denominator as f64 * 100.0;
    format!("{value:.1}%")
}

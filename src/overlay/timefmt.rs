use crate::overlay::style::TimeFormat;

/// Format elapsed seconds as a clock string.
///
/// Fractional seconds are truncated. `mm:ss` keeps the hour field once the elapsed time reaches
/// one hour so that long acquisitions do not wrap.
pub fn format_elapsed(secs: f64, format: TimeFormat) -> String {
    let total = if secs.is_finite() && secs > 0.0 {
        secs.trunc() as u64
    } else {
        0
    };
    let hours = total / 3600;
    let mins = (total % 3600) / 60;
    let s = total % 60;
    match format {
        TimeFormat::HoursMinutesSeconds => format!("{hours:02}:{mins:02}:{s:02}"),
        TimeFormat::HoursMinutes => format!("{hours:02}:{mins:02}"),
        TimeFormat::MinutesSeconds if hours == 0 => format!("{mins:02}:{s:02}"),
        TimeFormat::MinutesSeconds => format!("{hours:02}:{mins:02}:{s:02}"),
    }
}

/// Elapsed seconds at `frame`.
///
/// `override_dt` wins over the acquisition table; frames past the end of the table reuse its last
/// value; an empty table falls back to `frame * dt`.
pub fn elapsed_secs(frame: u64, timestamps: &[f64], dt: f64, override_dt: Option<f64>) -> f64 {
    if let Some(dt) = override_dt {
        return frame as f64 * dt;
    }
    match timestamps.get(frame as usize).or(timestamps.last()) {
        Some(&t) => t,
        None => frame as f64 * dt,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/overlay/timefmt.rs"]
mod tests;

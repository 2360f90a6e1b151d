//! Viewport statistics.
//!
//! Pure functions: no I/O, no state between calls.

use crate::models::{instant_from_millis, AggregateStats, Instant};

/// Summarize the values pulled from the viewport queries.
///
/// Average times are the straight arithmetic mean of epoch milliseconds,
/// truncated to a whole millisecond. Cities whose eclipse window only clips the
/// viewport weigh as much as any other. Obscuration is given as a fraction in
/// `[0, 1]` and reported as a whole percent; duration is rounded to whole
/// seconds. Rounding is half away from zero.
pub fn aggregate(
    start_times: &[Instant],
    end_times: &[Instant],
    obscuration_fraction: Option<f64>,
    duration_seconds: Option<f64>,
) -> AggregateStats {
    AggregateStats {
        average_start_time: average_instant(start_times),
        average_end_time: average_instant(end_times),
        obscuration_percent: obscuration_fraction.and_then(obscuration_percent),
        duration_seconds: duration_seconds.and_then(whole_seconds),
    }
}

/// Mean of `times`; `None` for an empty slice.
pub fn average_instant(times: &[Instant]) -> Option<Instant> {
    if times.is_empty() {
        return None;
    }
    let sum: i128 = times.iter().map(|t| i128::from(t.timestamp_millis())).sum();
    let mean = sum / times.len() as i128;
    instant_from_millis(i64::try_from(mean).ok()?)
}

fn obscuration_percent(fraction: f64) -> Option<u8> {
    if !fraction.is_finite() {
        log::warn!("Ignoring non-finite obscuration value {}", fraction);
        return None;
    }
    Some((fraction * 100.0).round().clamp(0.0, 100.0) as u8)
}

fn whole_seconds(seconds: f64) -> Option<u64> {
    if !seconds.is_finite() {
        log::warn!("Ignoring non-finite duration value {}", seconds);
        return None;
    }
    Some(seconds.round().max(0.0) as u64)
}

//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

use crate::constants::PERCENT_MAX;

/// Round a f64 and clamp it to the percentage range, returning 0 for NaN values.
#[must_use]
pub fn round_f64_to_percent(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    let clamped = value.round().clamp(0.0, f64::from(PERCENT_MAX));
    cast::<f64, u8>(clamped).unwrap_or(0)
}

/// Clamp an arbitrary JSON-ish number into the percentage range.
///
/// Non-finite values collapse to `fallback`.
#[must_use]
pub fn clamp_percent(value: f64, fallback: u8) -> u8 {
    if !value.is_finite() {
        return fallback.min(PERCENT_MAX);
    }
    round_f64_to_percent(value)
}

/// Convert a point count to f64 for interpolation math.
#[must_use]
pub fn points_to_f64(points: u32) -> f64 {
    f64::from(points)
}

/// Mean of a slice of percentages, `0.0` for an empty slice.
#[must_use]
pub fn mean_percent(values: &[u8]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let total: u32 = values.iter().map(|&v| u32::from(v)).sum();
    let count = cast::<usize, f64>(values.len()).unwrap_or(1.0);
    f64::from(total) / count
}

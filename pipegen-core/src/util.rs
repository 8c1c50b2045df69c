//! Small numeric helpers shared across the generation pipeline.

/// Rounds to two decimal places, the fixed precision of every float written
/// to the parameter file.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

//! Numeric helpers shared by every scorer.
//!
//! All normalized scores in the workspace live in [-1, 1]; the composite lives in
//! [0, 100]. Missing or non-finite upstream values are treated alike, so callers
//! run raw inputs through [`finite`] before branching on them.

/// Clamp `value` into `[lo, hi]`. A NaN input collapses to the midpoint, which is
/// the neutral value for both the [-1, 1] and [0, 100] ranges.
pub fn clamp(value: f64, lo: f64, hi: f64) -> f64 {
    if value.is_nan() {
        return (lo + hi) / 2.0;
    }
    value.max(lo).min(hi)
}

/// Clamp into the normalized score range [-1, 1].
pub fn clamp_unit(value: f64) -> f64 {
    clamp(value, -1.0, 1.0)
}

/// Drop NaN and infinite values.
pub fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// Finite and strictly positive. Used for share counts and cash-flow anchors,
/// where zero is as unusable as a missing value.
pub fn positive(value: Option<f64>) -> Option<f64> {
    finite(value).filter(|v| *v > 0.0)
}

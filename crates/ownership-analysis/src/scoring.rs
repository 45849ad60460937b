use analysis_core::{clamp_unit, finite, OwnershipSnapshot};

/// Score ownership momentum and concentration into [-1, 1].
///
/// `qoq_change_pp` is the change in institutional % (percentage points) since the
/// prior snapshot:
/// - `> 0.5` → +0.5
/// - `(0, 0.5]` → +0.25
/// - `< -0.5` → -0.5
/// - `[-0.5, 0]` → -0.15
///
/// `top_concentration_pct` adds +0.15 inside [30, 60] and -0.15 above 80.
/// Each input is optional on its own.
pub fn ownership_score(qoq_change_pp: Option<f64>, top_concentration_pct: Option<f64>) -> f64 {
    let mut score = 0.0;

    if let Some(change) = finite(qoq_change_pp) {
        if change > 0.5 {
            score += 0.5;
        } else if change > 0.0 {
            score += 0.25;
        } else if change < -0.5 {
            score -= 0.5;
        } else {
            score -= 0.15;
        }
    }

    if let Some(conc) = finite(top_concentration_pct) {
        if (30.0..=60.0).contains(&conc) {
            score += 0.15;
        } else if conc > 80.0 {
            score -= 0.15;
        }
    }

    clamp_unit(score)
}

/// Change in institutional % between two snapshots, when both carry a value.
pub fn qoq_change(current: &OwnershipSnapshot, previous: Option<&OwnershipSnapshot>) -> Option<f64> {
    let previous = finite(previous?.inst_pct)?;
    let current = finite(current.inst_pct)?;
    Some(current - previous)
}

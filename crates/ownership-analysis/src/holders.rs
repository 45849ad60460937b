use analysis_core::{positive, HolderRecord};
use serde::{Deserialize, Serialize};

const UNAVAILABLE: &str = "Institutional data not available.";

/// Aggregate view of an institutional holder table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HolderSummary {
    pub ok: bool,
    pub message: String,
    pub total_inst_shares: f64,
    /// Institutional shares as % of shares outstanding
    pub inst_pct: Option<f64>,
    /// Top-5 holders as % of institutional shares
    pub top5_pct: Option<f64>,
    /// Top-10 holders as % of institutional shares
    pub top10_pct: Option<f64>,
    /// Holders sorted by shares, descending
    pub holders: Vec<HolderRecord>,
}

impl HolderSummary {
    fn unavailable(holders: Vec<HolderRecord>) -> Self {
        Self {
            ok: false,
            message: UNAVAILABLE.to_string(),
            total_inst_shares: 0.0,
            inst_pct: None,
            top5_pct: None,
            top10_pct: None,
            holders,
        }
    }
}

/// Compute institutional % and top-N concentration from a holder table.
///
/// Unusable share counts (negative, NaN, infinite) count as zero. An empty table or
/// missing shares outstanding yields `ok = false` with every percentage `None`.
pub fn summarize_holders(holders: &[HolderRecord], shares_outstanding: Option<f64>) -> HolderSummary {
    let mut sorted: Vec<HolderRecord> = holders
        .iter()
        .cloned()
        .map(|mut h| {
            if !h.shares.is_finite() || h.shares < 0.0 {
                h.shares = 0.0;
            }
            h
        })
        .collect();
    sorted.sort_by(|a, b| b.shares.partial_cmp(&a.shares).unwrap_or(std::cmp::Ordering::Equal));

    let shares_out = match positive(shares_outstanding) {
        Some(s) if !sorted.is_empty() => s,
        _ => return HolderSummary::unavailable(sorted),
    };

    let total: f64 = sorted.iter().map(|h| h.shares).sum();
    let top_n = |n: usize| -> Option<f64> {
        if total > 0.0 {
            let top: f64 = sorted.iter().take(n).map(|h| h.shares).sum();
            Some(top / total * 100.0)
        } else {
            None
        }
    };
    let top5_pct = top_n(5);
    let top10_pct = top_n(10);

    HolderSummary {
        ok: true,
        message: String::new(),
        total_inst_shares: total,
        inst_pct: Some(total / shares_out * 100.0),
        top5_pct,
        top10_pct,
        holders: sorted,
    }
}

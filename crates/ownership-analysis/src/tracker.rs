use crate::holders::summarize_holders;
use crate::scoring::{ownership_score, qoq_change};
use crate::store::{dedup_sorted, TrendStore};
use analysis_core::{HolderRecord, OwnershipSnapshot};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Everything the presentation layer needs about a ticker's institutional ownership.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnershipReport {
    pub ticker: String,
    pub ok: bool,
    pub message: String,
    pub inst_pct: Option<f64>,
    pub top5_pct: Option<f64>,
    pub top10_pct: Option<f64>,
    /// Change vs. the most recent prior snapshot, in percentage points.
    /// Approximate: the prior snapshot may be days or months old.
    pub qoq_change: Option<f64>,
    /// Normalized ownership score in [-1, 1]
    pub score: f64,
    pub holders: Vec<HolderRecord>,
    pub trend: Vec<OwnershipSnapshot>,
}

/// Runs the summarize → compare → persist cycle against a trend store.
pub struct OwnershipTracker {
    store: Arc<dyn TrendStore>,
}

impl OwnershipTracker {
    pub fn new(store: Arc<dyn TrendStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn TrendStore> {
        &self.store
    }

    /// Summarize a fresh holder table, compute the delta against the last persisted
    /// snapshot, and append a snapshot stamped `now`.
    ///
    /// Never fails: unavailable holder data skips the write, and a failed write is
    /// logged while the computed values are still returned.
    pub fn refresh(
        &self,
        ticker: &str,
        holders: &[HolderRecord],
        shares_outstanding: Option<f64>,
        now: NaiveDateTime,
    ) -> OwnershipReport {
        let summary = summarize_holders(holders, shares_outstanding);

        if !summary.ok {
            tracing::debug!(ticker, "No usable institutional data; trend left untouched");
            return OwnershipReport {
                ticker: ticker.to_string(),
                ok: false,
                message: summary.message,
                inst_pct: None,
                top5_pct: None,
                top10_pct: None,
                qoq_change: None,
                score: ownership_score(None, None),
                holders: summary.holders,
                trend: self.store.load_trend(ticker),
            };
        }

        let snapshot = OwnershipSnapshot {
            date: now,
            inst_pct: summary.inst_pct,
            top5_pct: summary.top5_pct,
            top10_pct: summary.top10_pct,
        };

        let (previous, trend) = match self.store.append_with_previous(ticker, snapshot.clone()) {
            Ok(outcome) => (outcome.previous, outcome.trend),
            Err(e) => {
                tracing::warn!(ticker, "Failed to persist ownership snapshot: {}", e);
                let existing = self.store.load_trend(ticker);
                let previous = existing.last().cloned();
                let trend = dedup_sorted(existing.into_iter().chain(std::iter::once(snapshot.clone())));
                (previous, trend)
            }
        };

        let change = qoq_change(&snapshot, previous.as_ref());
        let score = ownership_score(change, summary.top10_pct);

        OwnershipReport {
            ticker: ticker.to_string(),
            ok: true,
            message: summary.message,
            inst_pct: summary.inst_pct,
            top5_pct: summary.top5_pct,
            top10_pct: summary.top10_pct,
            qoq_change: change,
            score,
            holders: summary.holders,
            trend,
        }
    }
}

//! Institutional ownership: holder concentration, the ownership score, and the
//! per-ticker snapshot trend needed for quarter-over-quarter deltas.

pub mod holders;
pub mod scoring;
pub mod store;
pub mod tracker;

pub use holders::{summarize_holders, HolderSummary};
pub use scoring::{ownership_score, qoq_change};
pub use store::{
    normalize_timestamp, AppendOutcome, FileTrendStore, InMemoryTrendStore, TrendStore,
};
pub use tracker::{OwnershipReport, OwnershipTracker};

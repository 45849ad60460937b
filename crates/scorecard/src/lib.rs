//! Composite investment scorecard: blends margin of safety, sentiment, technical
//! and ownership scores into a single 0-100 number plus a buy-eligibility gate.

pub mod cache;
pub mod composite;
pub mod config;
pub mod engine;
pub mod signal;

pub use cache::{Clock, ManualClock, SystemClock, TtlCache};
pub use composite::{composite_score, score_breakdown, CompositeWeights, DEFAULT_WEIGHTS};
pub use config::{parse_tickers, ScorecardConfig};
pub use engine::{Scorecard, ScorecardEngine, TickerInputs};
pub use signal::{buy_signal, BuySignal, BuySignalInputs};

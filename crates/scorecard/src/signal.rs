use analysis_core::finite;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MOS_THRESHOLD: f64 = 0.25;
pub const DEFAULT_RSI_CEILING: f64 = 65.0;

/// Raw (non-normalized) values the buy gate looks at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BuySignalInputs {
    /// Margin of safety as a fraction, e.g. 0.3 for 30%
    pub mos: Option<f64>,
    pub price: Option<f64>,
    pub sma200: Option<f64>,
    pub rsi14: Option<f64>,
    /// Sentiment score in [-1, 1]
    pub sentiment: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuySignal {
    pub eligible: bool,
    /// One "+ ..." or "- ..." line per condition
    pub reasons: Vec<String>,
}

/// Buy eligibility: MOS at or above threshold, price at or above its 200-day SMA,
/// RSI at or below the ceiling, and non-negative sentiment. All four must hold;
/// a missing input fails its condition.
pub fn buy_signal(inputs: &BuySignalInputs, mos_threshold: f64, rsi_ceiling: f64) -> BuySignal {
    let mut reasons = Vec::with_capacity(4);
    let mut eligible = true;

    let mut check = |passed: bool, pass_msg: String, fail_msg: String| {
        if passed {
            reasons.push(format!("+ {}", pass_msg));
        } else {
            eligible = false;
            reasons.push(format!("- {}", fail_msg));
        }
    };

    match finite(inputs.mos) {
        Some(mos) => check(
            mos >= mos_threshold,
            format!("Margin of safety {:.1}% >= {:.1}%", mos * 100.0, mos_threshold * 100.0),
            format!("Margin of safety {:.1}% below {:.1}%", mos * 100.0, mos_threshold * 100.0),
        ),
        None => check(false, String::new(), "Margin of safety unavailable".to_string()),
    }

    match (finite(inputs.price), finite(inputs.sma200)) {
        (Some(price), Some(sma)) => check(
            price >= sma,
            format!("Price {:.2} at/above 200-day SMA {:.2}", price, sma),
            format!("Price {:.2} below 200-day SMA {:.2}", price, sma),
        ),
        _ => check(false, String::new(), "Trend data unavailable".to_string()),
    }

    match finite(inputs.rsi14) {
        Some(rsi) => check(
            rsi <= rsi_ceiling,
            format!("RSI {:.1} <= {:.0}", rsi, rsi_ceiling),
            format!("RSI {:.1} overbought (> {:.0})", rsi, rsi_ceiling),
        ),
        None => check(false, String::new(), "RSI unavailable".to_string()),
    }

    match finite(inputs.sentiment) {
        Some(s) => check(
            s >= 0.0,
            format!("Sentiment {:+.2} non-negative", s),
            format!("Sentiment {:+.2} negative", s),
        ),
        None => check(false, String::new(), "Sentiment unavailable".to_string()),
    }

    BuySignal { eligible, reasons }
}

use analysis_core::{clamp_unit, finite, QuoteSummary};
use serde::{Deserialize, Serialize};

/// Rule-table breakpoints. These are contract values, not tuning knobs: the
/// buy-signal gate and composite thresholds downstream assume them.
const TREND_ABOVE_SMA: f64 = 0.4;
const TREND_BELOW_SMA: f64 = -0.2;
const RSI_HEALTHY_LOW: f64 = 40.0;
const RSI_HEALTHY_HIGH: f64 = 60.0;
const RSI_HEALTHY_BONUS: f64 = 0.3;
const RSI_OVERSOLD: f64 = 30.0;
const RSI_OVERSOLD_BONUS: f64 = 0.15;
const RSI_OVERBOUGHT: f64 = 70.0;
const RSI_OVERBOUGHT_PENALTY: f64 = -0.2;

/// Technical score plus the rules that fired, formatted as `+ name` / `- name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalScore {
    pub score: f64,
    pub signals: Vec<String>,
}

pub struct TechnicalAnalysisEngine;

impl TechnicalAnalysisEngine {
    pub fn new() -> Self {
        Self
    }

    /// Score price vs. SMA200 and RSI14 into [-1, 1].
    ///
    /// Any missing (or non-finite) input yields exactly 0.0: thin data is neutral,
    /// not bearish.
    pub fn evaluate(&self, price: Option<f64>, sma200: Option<f64>, rsi14: Option<f64>) -> TechnicalScore {
        let (price, sma200, rsi14) = match (finite(price), finite(sma200), finite(rsi14)) {
            (Some(p), Some(s), Some(r)) => (p, s, r),
            _ => {
                return TechnicalScore {
                    score: 0.0,
                    signals: vec!["Insufficient technical data".to_string()],
                }
            }
        };

        let mut signals: Vec<(&str, bool)> = Vec::new();
        let mut score = 0.0;

        if price >= sma200 {
            score += TREND_ABOVE_SMA;
            signals.push(("Price at/above SMA200", true));
        } else {
            score += TREND_BELOW_SMA;
            signals.push(("Price below SMA200", false));
        }

        if (RSI_HEALTHY_LOW..=RSI_HEALTHY_HIGH).contains(&rsi14) {
            score += RSI_HEALTHY_BONUS;
            signals.push(("RSI in healthy band", true));
        } else if rsi14 < RSI_OVERSOLD {
            score += RSI_OVERSOLD_BONUS;
            signals.push(("RSI oversold", true));
        } else if rsi14 > RSI_OVERBOUGHT {
            score += RSI_OVERBOUGHT_PENALTY;
            signals.push(("RSI overbought", false));
        }

        TechnicalScore {
            score: clamp_unit(score),
            signals: signals
                .iter()
                .map(|(name, bullish)| format!("{} {}", if *bullish { "+" } else { "-" }, name))
                .collect(),
        }
    }

    pub fn score(&self, price: Option<f64>, sma200: Option<f64>, rsi14: Option<f64>) -> f64 {
        self.evaluate(price, sma200, rsi14).score
    }

    pub fn score_quote(&self, quote: &QuoteSummary) -> f64 {
        self.score(quote.price, quote.sma200, quote.rsi14)
    }
}

impl Default for TechnicalAnalysisEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Shorthand for [`TechnicalAnalysisEngine::score`].
pub fn technical_score(price: Option<f64>, sma200: Option<f64>, rsi14: Option<f64>) -> f64 {
    TechnicalAnalysisEngine::new().score(price, sma200, rsi14)
}

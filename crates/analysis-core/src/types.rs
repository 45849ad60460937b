use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One institutional-ownership observation for a ticker.
///
/// `date` is timezone-naive (UTC wall clock). At most one snapshot exists per
/// ticker per `date`; the trend store enforces this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnershipSnapshot {
    pub date: NaiveDateTime,
    /// % of shares outstanding held by institutions
    pub inst_pct: Option<f64>,
    /// % of institutional shares held by the five largest holders
    pub top5_pct: Option<f64>,
    /// % of institutional shares held by the ten largest holders
    pub top10_pct: Option<f64>,
}

/// A single institutional holder row. Fetched fresh on every refresh, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HolderRecord {
    pub holder: String,
    pub shares: f64,
    #[serde(default)]
    pub ticker: String,
}

impl HolderRecord {
    pub fn new(holder: impl Into<String>, shares: f64, ticker: impl Into<String>) -> Self {
        Self {
            holder: holder.into(),
            shares,
            ticker: ticker.into(),
        }
    }
}

/// Market snapshot supplied by the data-fetch side.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuoteSummary {
    pub price: Option<f64>,
    pub previous_close: Option<f64>,
    pub market_cap: Option<f64>,
    pub shares_outstanding: Option<f64>,
    /// 200-period simple moving average of close
    pub sma200: Option<f64>,
    /// 14-period RSI
    pub rsi14: Option<f64>,
    #[serde(default)]
    pub closes: Vec<f64>,
}

/// Outcome of a discounted-cash-flow valuation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DcfResult {
    pub ok: bool,
    pub message: String,
    pub iv_per_share: Option<f64>,
}

impl DcfResult {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
            iv_per_share: None,
        }
    }

    pub fn valued(iv_per_share: f64) -> Self {
        Self {
            ok: true,
            message: String::new(),
            iv_per_share: Some(iv_per_share),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Bullish,
    Bearish,
    Neutral,
}

impl SentimentLabel {
    /// Label thresholds are strict: exactly +/-0.2 stays neutral.
    pub fn from_score(norm: f64) -> Self {
        if norm > 0.2 {
            SentimentLabel::Bullish
        } else if norm < -0.2 {
            SentimentLabel::Bearish
        } else {
            SentimentLabel::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Bullish => "bullish",
            SentimentLabel::Bearish => "bearish",
            SentimentLabel::Neutral => "neutral",
        }
    }
}

/// Which weight table a sentiment pattern came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Polarity {
    #[serde(rename = "+")]
    Positive,
    #[serde(rename = "-")]
    Negative,
}

impl Polarity {
    pub fn sign(&self) -> char {
        match self {
            Polarity::Positive => '+',
            Polarity::Negative => '-',
        }
    }
}

/// One matched sentiment pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentHit {
    pub pattern: String,
    pub count: usize,
    pub weight: f64,
    pub contribution: f64,
    pub sign: Polarity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    /// Normalized score in [-1, 1]
    pub score: f64,
    pub label: SentimentLabel,
    /// Ranked by descending |contribution|, at most 20 entries
    pub hits: Vec<SentimentHit>,
}

impl SentimentResult {
    pub fn neutral() -> Self {
        Self {
            score: 0.0,
            label: SentimentLabel::Neutral,
            hits: Vec::new(),
        }
    }
}

/// The four normalized inputs and the blended 0-100 composite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub mos_norm: f64,
    pub sentiment_norm: f64,
    pub technical_norm: f64,
    pub ownership_norm: f64,
    pub composite: f64,
}

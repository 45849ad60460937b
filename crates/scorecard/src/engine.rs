use crate::cache::{Clock, SystemClock, TtlCache};
use crate::composite::score_breakdown;
use crate::config::ScorecardConfig;
use crate::signal::{buy_signal, BuySignal, BuySignalInputs};
use analysis_core::{finite, DcfResult, HolderRecord, QuoteSummary, ScoreBreakdown, SentimentResult};
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use fundamental_analysis::{raw_margin_of_safety, ttm_free_cash_flow, CashFlowQuarter, FundamentalAnalysisEngine};
use ownership_analysis::{FileTrendStore, OwnershipReport, OwnershipTracker, TrendStore};
use sentiment_analysis::KeywordSentimentScorer;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::convert::Infallible;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use technical_analysis::{quote_summary_from_closes, TechnicalAnalysisEngine, TechnicalScore};

fn series_fingerprint(closes: &[f64]) -> u64 {
    let mut hasher = DefaultHasher::new();
    closes.len().hash(&mut hasher);
    for c in closes {
        c.to_bits().hash(&mut hasher);
    }
    hasher.finish()
}

/// Raw per-ticker inputs gathered by the data-fetch side.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TickerInputs {
    pub ticker: String,
    #[serde(default)]
    pub quote: QuoteSummary,
    /// Trailing free cash flow; derived from `cash_flows` when absent
    #[serde(default)]
    pub fcf0: Option<f64>,
    /// Latest quarters first
    #[serde(default)]
    pub cash_flows: Vec<CashFlowQuarter>,
    #[serde(default)]
    pub holders: Vec<HolderRecord>,
    /// Concatenated headlines / filing text
    #[serde(default)]
    pub text: String,
}

/// Complete evaluation of one ticker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scorecard {
    pub ticker: String,
    pub evaluated_at: DateTime<Utc>,
    pub quote: QuoteSummary,
    pub fcf0: Option<f64>,
    pub dcf: DcfResult,
    /// Raw margin of safety, present only when the DCF succeeded and a price is known
    pub margin_of_safety: Option<f64>,
    pub sentiment: SentimentResult,
    pub technical: TechnicalScore,
    pub ownership: OwnershipReport,
    pub breakdown: ScoreBreakdown,
    pub buy_signal: BuySignal,
}

pub struct ScorecardEngine {
    config: ScorecardConfig,
    sentiment: KeywordSentimentScorer,
    technical: TechnicalAnalysisEngine,
    fundamental: FundamentalAnalysisEngine,
    ownership: OwnershipTracker,
    quotes: TtlCache<QuoteSummary>,
    clock: Arc<dyn Clock>,
}

impl ScorecardEngine {
    /// Engine backed by the file trend store under `config.ownership_cache_dir`.
    pub fn new(config: ScorecardConfig) -> Result<Self> {
        config.validate()?;
        let store = FileTrendStore::new(config.ownership_cache_dir.clone()).with_context(|| {
            format!(
                "Failed to open ownership cache at {}",
                config.ownership_cache_dir.display()
            )
        })?;
        Ok(Self::with_components(config, Arc::new(store), Arc::new(SystemClock)))
    }

    pub fn with_components(config: ScorecardConfig, store: Arc<dyn TrendStore>, clock: Arc<dyn Clock>) -> Self {
        let quotes = TtlCache::with_clock(Duration::seconds(config.quote_cache_ttl_secs), clock.clone());
        Self {
            fundamental: FundamentalAnalysisEngine::with_assumptions(config.dcf_assumptions()),
            sentiment: KeywordSentimentScorer::new(),
            technical: TechnicalAnalysisEngine::new(),
            ownership: OwnershipTracker::new(store),
            quotes,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &ScorecardConfig {
        &self.config
    }

    /// Fill in price / SMA200 / RSI14 from the close series where the caller left
    /// them empty. Only the series-derived indicators are cached, keyed by ticker and
    /// series fingerprint; explicit caller values always win.
    fn resolve_quote(&self, ticker: &str, quote: &QuoteSummary) -> QuoteSummary {
        if quote.closes.is_empty() {
            return quote.clone();
        }
        let key = format!("{}:{:016x}", ticker, series_fingerprint(&quote.closes));
        let derived: Result<QuoteSummary, Infallible> = self
            .quotes
            .get_or_insert_with(&key, || Ok(quote_summary_from_closes(&quote.closes, None, None, None)));
        let derived = match derived {
            Ok(q) => q,
            Err(never) => match never {},
        };

        QuoteSummary {
            price: finite(quote.price).or(derived.price),
            previous_close: finite(quote.previous_close).or(derived.previous_close),
            market_cap: finite(quote.market_cap),
            shares_outstanding: finite(quote.shares_outstanding),
            sma200: finite(quote.sma200).or(derived.sma200),
            rsi14: finite(quote.rsi14).or(derived.rsi14),
            closes: derived.closes,
        }
    }

    /// Score one ticker. Never fails: every component degrades to its neutral value
    /// when its inputs are missing.
    pub fn evaluate(&self, inputs: &TickerInputs) -> Scorecard {
        let ticker = inputs.ticker.trim().to_uppercase();
        let now = self.clock.now();
        let quote = self.resolve_quote(&ticker, &inputs.quote);

        let fcf0 = finite(inputs.fcf0).or_else(|| ttm_free_cash_flow(&inputs.cash_flows));
        let (dcf, mos_norm) = self
            .fundamental
            .value_with_mos(fcf0, quote.shares_outstanding, quote.price);
        let margin_of_safety = match (dcf.ok, finite(quote.price)) {
            (true, Some(_)) => Some(raw_margin_of_safety(dcf.iv_per_share, quote.price)),
            _ => None,
        };

        let sentiment = self.sentiment.score(&inputs.text);
        let technical = self.technical.evaluate(quote.price, quote.sma200, quote.rsi14);
        let ownership = self.ownership.refresh(
            &ticker,
            &inputs.holders,
            quote.shares_outstanding,
            now.naive_utc(),
        );

        let breakdown = score_breakdown(mos_norm, sentiment.score, technical.score, ownership.score);

        let gate = BuySignalInputs {
            mos: margin_of_safety,
            price: quote.price,
            sma200: quote.sma200,
            rsi14: quote.rsi14,
            sentiment: if inputs.text.trim().is_empty() {
                None
            } else {
                Some(sentiment.score)
            },
        };
        let buy_signal = buy_signal(&gate, self.config.mos_threshold, self.config.rsi_ceiling);

        tracing::debug!(
            ticker = %ticker,
            composite = breakdown.composite,
            eligible = buy_signal.eligible,
            "Scorecard evaluated"
        );

        Scorecard {
            ticker,
            evaluated_at: now,
            quote,
            fcf0,
            dcf,
            margin_of_safety,
            sentiment,
            technical,
            ownership,
            breakdown,
            buy_signal,
        }
    }

    pub fn evaluate_batch(&self, batch: &[TickerInputs]) -> Vec<Scorecard> {
        batch.iter().map(|inputs| self.evaluate(inputs)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use chrono::TimeZone;
    use ownership_analysis::InMemoryTrendStore;

    fn engine() -> (ScorecardEngine, ManualClock, Arc<InMemoryTrendStore>) {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 20, 0, 0).unwrap());
        let store = Arc::new(InMemoryTrendStore::new());
        let engine = ScorecardEngine::with_components(
            ScorecardConfig::default(),
            store.clone(),
            Arc::new(clock.clone()),
        );
        (engine, clock, store)
    }

    fn undervalued() -> TickerInputs {
        TickerInputs {
            ticker: "acme".to_string(),
            quote: QuoteSummary {
                price: Some(40.0),
                previous_close: Some(39.5),
                shares_outstanding: Some(1e9),
                sma200: Some(35.0),
                rsi14: Some(50.0),
                ..Default::default()
            },
            fcf0: Some(5e9),
            holders: vec![
                HolderRecord::new("Fund A", 3e8, "ACME"),
                HolderRecord::new("Fund B", 2e8, "ACME"),
            ],
            text: "The company beat estimates and raised its full-year outlook.".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_full_evaluation_is_buy_eligible() {
        let (engine, _clock, store) = engine();
        let card = engine.evaluate(&undervalued());

        assert_eq!(card.ticker, "ACME");
        assert!(card.dcf.ok);
        let mos = card.margin_of_safety.unwrap();
        assert!(mos > 0.5 && mos < 0.55);
        assert!((card.sentiment.score - 0.38).abs() < 1e-9);
        assert!((card.technical.score - 0.7).abs() < 1e-9);
        // Two holders: top10 = 100%, over-concentrated
        assert!((card.ownership.score + 0.15).abs() < 1e-9);

        let expected = ((0.40 * mos + 0.25 * 0.38 + 0.20 * 0.7 + 0.15 * -0.15) + 1.0) * 50.0;
        assert!((card.breakdown.composite - expected).abs() < 1e-9);
        assert!(card.buy_signal.eligible, "{:?}", card.buy_signal.reasons);
        assert_eq!(store.load_trend("ACME").len(), 1);
    }

    #[test]
    fn test_empty_inputs_are_neutral() {
        let (engine, _clock, store) = engine();
        let card = engine.evaluate(&TickerInputs {
            ticker: "VOID".to_string(),
            ..Default::default()
        });

        assert!(!card.dcf.ok);
        assert!(card.margin_of_safety.is_none());
        assert_eq!(card.breakdown.composite, 50.0);
        assert!(!card.buy_signal.eligible);
        assert!(card.buy_signal.reasons.iter().all(|r| r.starts_with("- ")));
        assert!(store.load_trend("VOID").is_empty());
    }

    #[test]
    fn test_overvalued_fails_gate() {
        let (engine, _clock, _store) = engine();
        let mut inputs = undervalued();
        inputs.quote.price = Some(150.0);
        inputs.quote.sma200 = Some(120.0);
        let card = engine.evaluate(&inputs);

        assert!(card.margin_of_safety.unwrap() < 0.0);
        assert!(!card.buy_signal.eligible);
        assert!(card.buy_signal.reasons[0].starts_with("- Margin of safety"));
    }

    #[test]
    fn test_fcf_falls_back_to_ttm() {
        let (engine, _clock, _store) = engine();
        let mut inputs = undervalued();
        inputs.fcf0 = None;
        inputs.cash_flows = vec![
            CashFlowQuarter {
                operating_cash_flow: Some(1.5e9),
                capital_expenditures: Some(-0.25e9),
            };
            4
        ];
        let card = engine.evaluate(&inputs);
        assert!((card.fcf0.unwrap() - 5e9).abs() < 1.0);
        assert!(card.dcf.ok);
    }

    #[test]
    fn test_indicators_derived_from_closes() {
        let (engine, _clock, _store) = engine();
        let closes: Vec<f64> = (0..220).map(|i| 100.0 + (i % 7) as f64).collect();
        let inputs = TickerInputs {
            ticker: "WAVE".to_string(),
            quote: QuoteSummary {
                closes,
                ..Default::default()
            },
            ..Default::default()
        };
        let card = engine.evaluate(&inputs);

        assert!(card.quote.price.is_some());
        assert!(card.quote.sma200.is_some());
        assert!(card.quote.rsi14.is_some());
        assert_ne!(card.technical.signals[0], "Insufficient technical data");
    }

    #[test]
    fn test_derived_indicators_cached_per_series() {
        let (engine, clock, _store) = engine();
        let inputs = |last: f64| TickerInputs {
            ticker: "WAVE".to_string(),
            quote: QuoteSummary {
                closes: vec![10.0, 11.0, last],
                ..Default::default()
            },
            ..Default::default()
        };

        assert_eq!(engine.evaluate(&inputs(12.0)).quote.price, Some(12.0));
        assert_eq!(engine.evaluate(&inputs(12.0)).quote.price, Some(12.0));
        assert_eq!(engine.quotes.len(), 1);

        // A new series is never answered from an older one
        assert_eq!(engine.evaluate(&inputs(13.0)).quote.price, Some(13.0));
        assert_eq!(engine.quotes.len(), 2);

        clock.advance(Duration::seconds(900));
        assert_eq!(engine.quotes.purge_expired(), 2);
    }

    #[test]
    fn test_caller_quote_fields_override_cached_indicators() {
        let (engine, _clock, _store) = engine();
        let closes: Vec<f64> = (0..220).map(|i| 30.0 + (i % 5) as f64).collect();
        let mut inputs = undervalued();
        inputs.quote.closes = closes;
        inputs.quote.sma200 = None;
        inputs.quote.rsi14 = None;

        let first = engine.evaluate(&inputs);
        assert_eq!(first.quote.price, Some(40.0));
        assert!(first.margin_of_safety.unwrap() > 0.5);

        inputs.quote.price = Some(400.0);
        inputs.quote.shares_outstanding = Some(2e9);
        let second = engine.evaluate(&inputs);

        assert_eq!(engine.quotes.len(), 1);
        assert_eq!(second.quote.price, Some(400.0));
        assert_eq!(second.quote.shares_outstanding, Some(2e9));
        assert_eq!(second.quote.sma200, first.quote.sma200);
        assert!(second.margin_of_safety.unwrap() < 0.0);
        assert!(!second.buy_signal.eligible);
    }

    #[test]
    fn test_second_evaluation_scores_ownership_delta() {
        let (engine, clock, _store) = engine();
        engine.evaluate(&undervalued());

        clock.advance(Duration::days(1));
        let mut inputs = undervalued();
        inputs.holders[0].shares = 3.1e8;
        let card = engine.evaluate(&inputs);

        assert!((card.ownership.qoq_change.unwrap() - 1.0).abs() < 1e-9);
        assert!((card.ownership.score - 0.35).abs() < 1e-9);
        assert_eq!(card.ownership.trend.len(), 2);
    }

    #[test]
    fn test_file_backed_engine_persists_trend() {
        let dir = tempfile::tempdir().unwrap();
        let config = ScorecardConfig {
            ownership_cache_dir: dir.path().join("ownership"),
            ..Default::default()
        };
        let engine = ScorecardEngine::new(config).unwrap();
        engine.evaluate(&undervalued());

        let store = FileTrendStore::new(dir.path().join("ownership")).unwrap();
        assert!(store.path_for("ACME").unwrap().exists());
        assert_eq!(store.load_trend("ACME").len(), 1);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ScorecardConfig {
            dcf_years: 0,
            ..Default::default()
        };
        assert!(ScorecardEngine::new(config).is_err());
    }

    #[test]
    fn test_scorecard_json_shape() {
        let (engine, _clock, _store) = engine();
        let card = engine.evaluate(&undervalued());
        let value = serde_json::to_value(&card).unwrap();

        assert_eq!(value["ticker"], "ACME");
        assert_eq!(value["sentiment"]["label"], "bullish");
        assert_eq!(value["buy_signal"]["eligible"], true);
        assert!(value["breakdown"]["composite"].as_f64().unwrap() > 50.0);
        assert_eq!(value["ownership"]["trend"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_inputs_deserialize_with_defaults() {
        let batch: Vec<TickerInputs> =
            serde_json::from_str(r#"[{"ticker": "msft", "quote": {"price": 410.5}}]"#).unwrap();
        assert_eq!(batch[0].quote.price, Some(410.5));
        assert!(batch[0].holders.is_empty());
        assert!(batch[0].fcf0.is_none());
    }

    #[test]
    fn test_blank_text_fails_sentiment_condition() {
        let (engine, _clock, _store) = engine();
        let mut inputs = undervalued();
        inputs.text = "  ".to_string();
        let card = engine.evaluate(&inputs);

        assert_eq!(card.sentiment.score, 0.0);
        assert!(!card.buy_signal.eligible);
        assert_eq!(card.buy_signal.reasons[3], "- Sentiment unavailable");
    }
}

use analysis_core::{clamp_unit, AnalysisError, Polarity, SentimentHit, SentimentLabel, SentimentResult};
use once_cell::sync::Lazy;
use regex::Regex;

pub mod patterns;
pub use patterns::{WeightedPattern, NEGATIVE_PATTERNS, PATTERN_TABLE_VERSION, POSITIVE_PATTERNS};

/// Raw scores are divided by this before clamping to [-1, 1].
const NORMALIZATION_DIVISOR: f64 = 10.0;

/// Hits kept in a result, ranked by |contribution|.
pub const MAX_HITS: usize = 20;

static DEFAULT_SCORER: Lazy<KeywordSentimentScorer> = Lazy::new(KeywordSentimentScorer::new);

/// Score text with the built-in pattern tables.
pub fn score_text(text: &str) -> SentimentResult {
    DEFAULT_SCORER.score(text)
}

struct CompiledPattern {
    source: String,
    regex: Regex,
    weight: f64,
    polarity: Polarity,
}

fn compile(pattern: &str, weight: f64, polarity: Polarity) -> Result<CompiledPattern, AnalysisError> {
    let regex = Regex::new(&format!("(?i){}", pattern))
        .map_err(|e| AnalysisError::InvalidData(format!("sentiment pattern {}: {}", pattern, e)))?;
    Ok(CompiledPattern {
        source: pattern.to_string(),
        regex,
        weight,
        polarity,
    })
}

/// Keyword-weighted sentiment scorer.
///
/// Each pattern contributes `matches * weight`; the summed raw score is divided by
/// 10 and clamped. Pure and deterministic: the same text always produces the same
/// result.
pub struct KeywordSentimentScorer {
    patterns: Vec<CompiledPattern>,
}

impl KeywordSentimentScorer {
    pub fn new() -> Self {
        let mut patterns = Vec::with_capacity(POSITIVE_PATTERNS.len() + NEGATIVE_PATTERNS.len());
        let tables = [
            (POSITIVE_PATTERNS, Polarity::Positive),
            (NEGATIVE_PATTERNS, Polarity::Negative),
        ];
        for (table, polarity) in tables {
            for p in table {
                match compile(p.pattern, p.weight, polarity) {
                    Ok(compiled) => patterns.push(compiled),
                    Err(e) => tracing::warn!("Skipping built-in sentiment pattern: {}", e),
                }
            }
        }
        Self { patterns }
    }

    /// Build a scorer from custom tables. Fails on the first pattern that does not compile.
    pub fn with_patterns(
        positive: &[(&str, f64)],
        negative: &[(&str, f64)],
    ) -> Result<Self, AnalysisError> {
        let mut patterns = Vec::with_capacity(positive.len() + negative.len());
        for (pattern, weight) in positive {
            patterns.push(compile(pattern, *weight, Polarity::Positive)?);
        }
        for (pattern, weight) in negative {
            patterns.push(compile(pattern, *weight, Polarity::Negative)?);
        }
        Ok(Self { patterns })
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    pub fn score(&self, text: &str) -> SentimentResult {
        if text.trim().is_empty() {
            return SentimentResult::neutral();
        }

        let text_lower = text.to_lowercase();
        let mut raw = 0.0;
        let mut hits = Vec::new();

        for p in &self.patterns {
            let count = p.regex.find_iter(&text_lower).count();
            if count == 0 {
                continue;
            }
            let contribution = p.weight * count as f64;
            raw += contribution;
            hits.push(SentimentHit {
                pattern: p.source.clone(),
                count,
                weight: p.weight,
                contribution,
                sign: p.polarity,
            });
        }

        let score = clamp_unit(raw / NORMALIZATION_DIVISOR);

        // Stable sort: equal contributions keep table order (positive table first).
        hits.sort_by(|a, b| {
            b.contribution
                .abs()
                .partial_cmp(&a.contribution.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(MAX_HITS);

        tracing::debug!(raw, score, hits = hits.len(), "Scored sentiment text");

        SentimentResult {
            score,
            label: SentimentLabel::from_score(score),
            hits,
        }
    }
}

impl Default for KeywordSentimentScorer {
    fn default() -> Self {
        Self::new()
    }
}

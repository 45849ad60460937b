use analysis_core::{clamp, clamp_unit, ScoreBreakdown};
use serde::{Deserialize, Serialize};

/// Blend weights for the four normalized inputs. Fixed contract values; must sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompositeWeights {
    pub mos: f64,
    pub sentiment: f64,
    pub technical: f64,
    pub ownership: f64,
}

pub const DEFAULT_WEIGHTS: CompositeWeights = CompositeWeights {
    mos: 0.40,
    sentiment: 0.25,
    technical: 0.20,
    ownership: 0.15,
};

const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

impl CompositeWeights {
    pub fn sum(&self) -> f64 {
        self.mos + self.sentiment + self.technical + self.ownership
    }

    pub fn is_normalized(&self) -> bool {
        (self.sum() - 1.0).abs() < WEIGHT_SUM_TOLERANCE
    }

    /// Weighted blend in [-1, 1], mapped to [0, 100].
    pub fn composite(&self, mos_norm: f64, sentiment_norm: f64, technical_norm: f64, ownership_norm: f64) -> f64 {
        debug_assert!(self.is_normalized(), "composite weights must sum to 1.0");
        let blended = self.mos * clamp_unit(mos_norm)
            + self.sentiment * clamp_unit(sentiment_norm)
            + self.technical * clamp_unit(technical_norm)
            + self.ownership * clamp_unit(ownership_norm);
        clamp((blended + 1.0) * 50.0, 0.0, 100.0)
    }
}

impl Default for CompositeWeights {
    fn default() -> Self {
        DEFAULT_WEIGHTS
    }
}

/// Composite 0-100 score with the default weights.
pub fn composite_score(mos_norm: f64, sentiment_norm: f64, technical_norm: f64, ownership_norm: f64) -> f64 {
    DEFAULT_WEIGHTS.composite(mos_norm, sentiment_norm, technical_norm, ownership_norm)
}

/// Package the four normalized inputs with their composite.
pub fn score_breakdown(mos_norm: f64, sentiment_norm: f64, technical_norm: f64, ownership_norm: f64) -> ScoreBreakdown {
    let (mos_norm, sentiment_norm, technical_norm, ownership_norm) = (
        clamp_unit(mos_norm),
        clamp_unit(sentiment_norm),
        clamp_unit(technical_norm),
        clamp_unit(ownership_norm),
    );
    ScoreBreakdown {
        mos_norm,
        sentiment_norm,
        technical_norm,
        ownership_norm,
        composite: composite_score(mos_norm, sentiment_norm, technical_norm, ownership_norm),
    }
}

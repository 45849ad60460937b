use anyhow::{bail, Context, Result};
use fundamental_analysis::{DcfAssumptions, MAX_DCF_YEARS};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScorecardConfig {
    // Buy gate
    pub mos_threshold: f64, // 0.25
    pub rsi_ceiling: f64,   // 65

    // DCF assumptions
    pub dcf_years: u32,           // 5
    pub dcf_growth_rate: f64,     // 0.08
    pub dcf_discount_rate: f64,   // 0.10
    pub dcf_terminal_growth: f64, // 0.025

    // Storage and caching
    pub ownership_cache_dir: PathBuf, // ownership_cache/
    pub quote_cache_ttl_secs: i64,    // 900 (15 minutes)
}

impl ScorecardConfig {
    pub fn from_env() -> Result<Self> {
        let config = Self {
            mos_threshold: env::var("SCORECARD_MOS_THRESHOLD")
                .unwrap_or_else(|_| "0.25".to_string())
                .parse()
                .context("SCORECARD_MOS_THRESHOLD must be a number")?,
            rsi_ceiling: env::var("SCORECARD_RSI_CEILING")
                .unwrap_or_else(|_| "65".to_string())
                .parse()
                .context("SCORECARD_RSI_CEILING must be a number")?,
            dcf_years: env::var("DCF_YEARS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .context("DCF_YEARS must be a positive integer")?,
            dcf_growth_rate: env::var("DCF_GROWTH_RATE")
                .unwrap_or_else(|_| "0.08".to_string())
                .parse()
                .context("DCF_GROWTH_RATE must be a number")?,
            dcf_discount_rate: env::var("DCF_DISCOUNT_RATE")
                .unwrap_or_else(|_| "0.10".to_string())
                .parse()
                .context("DCF_DISCOUNT_RATE must be a number")?,
            dcf_terminal_growth: env::var("DCF_TERMINAL_GROWTH")
                .unwrap_or_else(|_| "0.025".to_string())
                .parse()
                .context("DCF_TERMINAL_GROWTH must be a number")?,
            ownership_cache_dir: env::var("OWNERSHIP_CACHE_DIR")
                .unwrap_or_else(|_| "ownership_cache".to_string())
                .into(),
            quote_cache_ttl_secs: env::var("QUOTE_CACHE_TTL_SECS")
                .unwrap_or_else(|_| "900".to_string())
                .parse()
                .context("QUOTE_CACHE_TTL_SECS must be an integer")?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let rates = [
            ("mos_threshold", self.mos_threshold),
            ("rsi_ceiling", self.rsi_ceiling),
            ("dcf_growth_rate", self.dcf_growth_rate),
            ("dcf_discount_rate", self.dcf_discount_rate),
            ("dcf_terminal_growth", self.dcf_terminal_growth),
        ];
        for (name, value) in rates {
            if !value.is_finite() {
                bail!("{} must be finite, got {}", name, value);
            }
        }
        if self.dcf_years == 0 || self.dcf_years > MAX_DCF_YEARS {
            bail!("dcf_years must be between 1 and {}", MAX_DCF_YEARS);
        }
        if self.dcf_discount_rate <= self.dcf_terminal_growth {
            bail!(
                "dcf_discount_rate ({}) must exceed dcf_terminal_growth ({})",
                self.dcf_discount_rate,
                self.dcf_terminal_growth
            );
        }
        if self.quote_cache_ttl_secs < 0 {
            bail!("quote_cache_ttl_secs must not be negative");
        }
        Ok(())
    }

    pub fn dcf_assumptions(&self) -> DcfAssumptions {
        DcfAssumptions {
            years: self.dcf_years,
            growth_rate: self.dcf_growth_rate,
            discount_rate: self.dcf_discount_rate,
            terminal_growth: self.dcf_terminal_growth,
        }
    }
}

impl Default for ScorecardConfig {
    fn default() -> Self {
        let dcf = DcfAssumptions::default();
        Self {
            mos_threshold: 0.25,
            rsi_ceiling: 65.0,
            dcf_years: dcf.years,
            dcf_growth_rate: dcf.growth_rate,
            dcf_discount_rate: dcf.discount_rate,
            dcf_terminal_growth: dcf.terminal_growth,
            ownership_cache_dir: PathBuf::from("ownership_cache"),
            quote_cache_ttl_secs: 900,
        }
    }
}

/// Split a comma-separated ticker list: trimmed, upper-cased, empties dropped,
/// order preserved.
pub fn parse_tickers(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|t| t.trim().to_uppercase())
        .filter(|t| !t.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ScorecardConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.dcf_years, 5);
        assert_eq!(config.dcf_assumptions(), DcfAssumptions::default());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = ScorecardConfig { dcf_years: 0, ..Default::default() };
        assert!(config.validate().is_err());

        let config = ScorecardConfig { dcf_years: MAX_DCF_YEARS + 1, ..Default::default() };
        assert!(config.validate().is_err());

        let config = ScorecardConfig { dcf_discount_rate: 0.02, ..Default::default() };
        assert!(config.validate().is_err());

        let config = ScorecardConfig { mos_threshold: f64::NAN, ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_tickers() {
        assert_eq!(parse_tickers("aapl, msft,,"), vec!["AAPL", "MSFT"]);
        assert_eq!(parse_tickers(" brk.b ,GOOGL"), vec!["BRK.B", "GOOGL"]);
        assert!(parse_tickers(" , ").is_empty());
    }
}

use analysis_core::{clamp_unit, finite, positive, DcfResult};
use serde::{Deserialize, Serialize};

const INSUFFICIENT_DATA: &str =
    "Insufficient data for DCF: need free cash flow, shares outstanding, and discount rate above terminal growth.";

/// Longest projection horizon accepted by [`intrinsic_value`].
pub const MAX_DCF_YEARS: u32 = 100;

/// Single-stage DCF assumptions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DcfAssumptions {
    pub years: u32,
    pub growth_rate: f64,
    pub discount_rate: f64,
    pub terminal_growth: f64,
}

impl Default for DcfAssumptions {
    fn default() -> Self {
        Self {
            years: 5,
            growth_rate: 0.08,
            discount_rate: 0.10,
            terminal_growth: 0.025,
        }
    }
}

/// One reporting period of cash-flow data, latest first when passed as a slice.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CashFlowQuarter {
    pub operating_cash_flow: Option<f64>,
    /// Sign-agnostic: providers report capex as either a positive spend or a negative flow
    pub capital_expenditures: Option<f64>,
}

/// Trailing-twelve-month free cash flow from the latest four quarters.
///
/// Quarters missing either field are skipped; returns `None` when no quarter is usable.
pub fn ttm_free_cash_flow(quarters: &[CashFlowQuarter]) -> Option<f64> {
    let values: Vec<f64> = quarters
        .iter()
        .take(4)
        .filter_map(|q| match (finite(q.operating_cash_flow), finite(q.capital_expenditures)) {
            (Some(ocf), Some(capex)) => Some(ocf - capex.abs()),
            _ => None,
        })
        .collect();
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum())
    }
}

pub struct FundamentalAnalysisEngine {
    assumptions: DcfAssumptions,
}

impl FundamentalAnalysisEngine {
    pub fn new() -> Self {
        Self {
            assumptions: DcfAssumptions::default(),
        }
    }

    pub fn with_assumptions(assumptions: DcfAssumptions) -> Self {
        Self { assumptions }
    }

    pub fn assumptions(&self) -> &DcfAssumptions {
        &self.assumptions
    }

    pub fn value(&self, fcf0: Option<f64>, shares_outstanding: Option<f64>) -> DcfResult {
        let a = &self.assumptions;
        intrinsic_value(
            fcf0,
            shares_outstanding,
            a.years,
            a.growth_rate,
            a.discount_rate,
            a.terminal_growth,
        )
    }

    /// Value the company and derive the normalized margin of safety against `price`.
    pub fn value_with_mos(
        &self,
        fcf0: Option<f64>,
        shares_outstanding: Option<f64>,
        price: Option<f64>,
    ) -> (DcfResult, f64) {
        let dcf = self.value(fcf0, shares_outstanding);
        let mos = margin_of_safety(dcf.iv_per_share, price);
        (dcf, mos)
    }
}

impl Default for FundamentalAnalysisEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Intrinsic value per share from a constant-growth FCF projection plus a Gordon
/// growth terminal value.
///
/// `fcf_t = fcf0 * (1 + g)^t` for `t = 1..=years`, each discounted at `discount_rate`;
/// the terminal value `fcf_years * (1 + tg) / (r - tg)` is discounted back `years`
/// periods. Never panics: missing or degenerate inputs return `ok = false`.
pub fn intrinsic_value(
    fcf0: Option<f64>,
    shares_outstanding: Option<f64>,
    years: u32,
    growth_rate: f64,
    discount_rate: f64,
    terminal_growth: f64,
) -> DcfResult {
    let fcf0 = match finite(fcf0) {
        Some(v) if v != 0.0 => v,
        _ => return DcfResult::failed(INSUFFICIENT_DATA),
    };
    let shares = match positive(shares_outstanding) {
        Some(v) => v,
        None => return DcfResult::failed(INSUFFICIENT_DATA),
    };
    if !growth_rate.is_finite() || !discount_rate.is_finite() || !terminal_growth.is_finite() {
        return DcfResult::failed("Invalid DCF inputs: rates must be finite.");
    }
    if discount_rate <= terminal_growth {
        return DcfResult::failed(INSUFFICIENT_DATA);
    }
    if discount_rate <= -1.0 {
        return DcfResult::failed("Invalid DCF inputs: discount rate must exceed -100%.");
    }
    if years > MAX_DCF_YEARS {
        return DcfResult::failed(format!(
            "Invalid DCF inputs: horizon of {} years exceeds {}.",
            years, MAX_DCF_YEARS
        ));
    }

    let mut pv_sum = 0.0;
    let mut fcf_t = fcf0;
    for t in 1..=years {
        fcf_t *= 1.0 + growth_rate;
        pv_sum += fcf_t / (1.0 + discount_rate).powi(t as i32);
    }

    let terminal_value = fcf_t * (1.0 + terminal_growth) / (discount_rate - terminal_growth);
    let terminal_pv = terminal_value / (1.0 + discount_rate).powi(years as i32);
    let enterprise_value = pv_sum + terminal_pv;
    let iv_per_share = enterprise_value / shares;

    if !iv_per_share.is_finite() {
        return DcfResult::failed("DCF produced a non-finite value.");
    }

    tracing::debug!(enterprise_value, iv_per_share, "DCF valuation complete");
    DcfResult::valued(iv_per_share)
}

/// Raw margin of safety `(iv - price) / iv`; 0.0 when intrinsic value is not
/// positive or price is missing.
pub fn raw_margin_of_safety(iv_per_share: Option<f64>, price: Option<f64>) -> f64 {
    match (positive(iv_per_share), finite(price)) {
        (Some(iv), Some(price)) => (iv - price) / iv,
        _ => 0.0,
    }
}

/// Margin of safety clamped to [-1, 1].
pub fn margin_of_safety(iv_per_share: Option<f64>, price: Option<f64>) -> f64 {
    clamp_unit(raw_margin_of_safety(iv_per_share, price))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_valuation_is_positive() {
        let result = intrinsic_value(Some(100.0), Some(10.0), 5, 0.08, 0.11, 0.025);
        assert!(result.ok);
        assert!(result.message.is_empty());
        assert!(result.iv_per_share.unwrap() > 0.0);
    }

    #[test]
    fn test_matches_hand_computation() {
        // years = 1: fcf1 = 110, pv = 100; tv = 110 * 1.0 / 0.1 = 1100, pv = 1000
        let result = intrinsic_value(Some(100.0), Some(10.0), 1, 0.10, 0.10, 0.0);
        assert!((result.iv_per_share.unwrap() - 110.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_years_is_pure_terminal_value() {
        let result = intrinsic_value(Some(100.0), Some(1.0), 0, 0.5, 0.10, 0.0);
        assert!((result.iv_per_share.unwrap() - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_horizon_is_bounded() {
        assert!(intrinsic_value(Some(100.0), Some(10.0), MAX_DCF_YEARS, 0.02, 0.10, 0.02).ok);

        let too_long = intrinsic_value(Some(100.0), Some(10.0), MAX_DCF_YEARS + 1, 0.02, 0.10, 0.02);
        assert!(!too_long.ok);
        assert!(too_long.iv_per_share.is_none());

        let absurd = intrinsic_value(Some(100.0), Some(10.0), u32::MAX, 0.02, 0.10, 0.02);
        assert!(!absurd.ok);
    }

    #[test]
    fn test_discount_not_above_terminal_growth_fails() {
        let result = intrinsic_value(Some(100.0), Some(10.0), 5, 0.08, 0.02, 0.03);
        assert!(!result.ok);
        assert!(result.iv_per_share.is_none());
        assert!(result.message.starts_with("Insufficient data"));

        let equal = intrinsic_value(Some(100.0), Some(10.0), 5, 0.08, 0.03, 0.03);
        assert!(!equal.ok);
    }

    #[test]
    fn test_missing_or_degenerate_inputs_fail() {
        assert!(!intrinsic_value(None, Some(10.0), 5, 0.08, 0.10, 0.025).ok);
        assert!(!intrinsic_value(Some(0.0), Some(10.0), 5, 0.08, 0.10, 0.025).ok);
        assert!(!intrinsic_value(Some(100.0), None, 5, 0.08, 0.10, 0.025).ok);
        assert!(!intrinsic_value(Some(100.0), Some(0.0), 5, 0.08, 0.10, 0.025).ok);
        assert!(!intrinsic_value(Some(100.0), Some(-5.0), 5, 0.08, 0.10, 0.025).ok);
        assert!(!intrinsic_value(Some(f64::NAN), Some(10.0), 5, 0.08, 0.10, 0.025).ok);
        assert!(!intrinsic_value(Some(100.0), Some(10.0), 5, f64::INFINITY, 0.10, 0.025).ok);
    }

    #[test]
    fn test_negative_fcf_values_negative() {
        let result = intrinsic_value(Some(-100.0), Some(10.0), 5, 0.08, 0.10, 0.025);
        assert!(result.ok);
        assert!(result.iv_per_share.unwrap() < 0.0);
    }

    #[test]
    fn test_margin_of_safety() {
        assert!((margin_of_safety(Some(100.0), Some(75.0)) - 0.25).abs() < 1e-9);
        assert!((margin_of_safety(Some(100.0), Some(150.0)) + 0.5).abs() < 1e-9);
        // deeply overvalued clamps to -1
        assert_eq!(margin_of_safety(Some(10.0), Some(100.0)), -1.0);
        assert!((raw_margin_of_safety(Some(10.0), Some(100.0)) + 9.0).abs() < 1e-9);
        // conventions
        assert_eq!(margin_of_safety(None, Some(50.0)), 0.0);
        assert_eq!(margin_of_safety(Some(-20.0), Some(50.0)), 0.0);
        assert_eq!(margin_of_safety(Some(100.0), None), 0.0);
    }

    #[test]
    fn test_engine_uses_assumptions() {
        let engine = FundamentalAnalysisEngine::with_assumptions(DcfAssumptions {
            years: 1,
            growth_rate: 0.10,
            discount_rate: 0.10,
            terminal_growth: 0.0,
        });
        let (dcf, mos) = engine.value_with_mos(Some(100.0), Some(10.0), Some(55.0));
        assert!(dcf.ok);
        assert!((mos - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_ttm_free_cash_flow() {
        let quarters = vec![
            CashFlowQuarter { operating_cash_flow: Some(50.0), capital_expenditures: Some(-10.0) },
            CashFlowQuarter { operating_cash_flow: Some(40.0), capital_expenditures: Some(10.0) },
            CashFlowQuarter { operating_cash_flow: None, capital_expenditures: Some(5.0) },
            CashFlowQuarter { operating_cash_flow: Some(30.0), capital_expenditures: Some(0.0) },
            CashFlowQuarter { operating_cash_flow: Some(1000.0), capital_expenditures: Some(0.0) },
        ];
        assert_eq!(ttm_free_cash_flow(&quarters), Some(100.0));
        assert_eq!(ttm_free_cash_flow(&[]), None);
        assert_eq!(ttm_free_cash_flow(&[CashFlowQuarter::default()]), None);
    }
}

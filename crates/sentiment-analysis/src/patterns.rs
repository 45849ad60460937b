//! Weighted keyword tables for earnings-style text.
//!
//! Tables are plain data so they can be reviewed, versioned and extended without
//! touching the scorer. Patterns are matched against lower-cased text with
//! case-insensitive regexes; every pattern is word-bounded.

/// Bump whenever a pattern or weight changes; scores are only comparable within a version.
pub const PATTERN_TABLE_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedPattern {
    pub pattern: &'static str,
    pub weight: f64,
}

const fn wp(pattern: &'static str, weight: f64) -> WeightedPattern {
    WeightedPattern { pattern, weight }
}

/// Positive-leaning phrases, weights in [1.2, 2.2].
pub const POSITIVE_PATTERNS: &[WeightedPattern] = &[
    wp(r"\b(beat|beats|beating)\b", 2.0),
    wp(r"\b(raise[d]?|increas(e|ed|es)|above guidance)\b", 1.8),
    wp(r"\b(profit(able)?|positive EBITDA|free cash flow positive)\b", 2.2),
    wp(r"\b(margin(s)? (expand(ed|ing)?|improv(ed|ing)?))\b", 1.8),
    wp(r"\b(revenue growth|top[- ]?line growth|record revenue)\b", 1.6),
    wp(r"\b(guidance (raised|maintained)|strong outlook|upgraded)\b", 1.8),
    wp(r"\b(loss(es)? narrowing|reduced losses)\b", 1.4),
    wp(r"\b(cost discipline|efficien(cy|cies)|operating leverage)\b", 1.4),
    wp(r"\b(buyback|share repurchase|dividend increase)\b", 1.2),
];

/// Negative-leaning phrases, weights in [-2.2, -1.2].
pub const NEGATIVE_PATTERNS: &[WeightedPattern] = &[
    wp(r"\b(miss|missed|below expectations)\b", -2.2),
    wp(r"\b(lower(ed)? guidance|cut guidance|downside)\b", -2.0),
    wp(r"\b(loss widened|widening losses)\b", -1.8),
    wp(r"\b(margin(s)? (compress(ed|ion)|decline|down))\b", -1.6),
    wp(r"\b(revenue decline|top[- ]?line decline|falling sales)\b", -1.6),
    wp(r"\b(headwind(s)?|macro headwinds|foreign exchange headwinds)\b", -1.2),
    wp(r"\b(one[- ]?time charge|impairment|restructuring)\b", -1.2),
    wp(r"\b(cash burn|liquidity risk|going concern)\b", -2.0),
    wp(r"\b(dilution|secondary offering)\b", -1.2),
];

#[cfg(test)]
mod tests {
    use super::super::indicators::*;

    // Wilder's classic worked example
    fn sample_prices() -> Vec<f64> {
        vec![
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08,
            45.89, 46.03, 45.61, 46.28, 46.28, 46.00, 46.03, 46.41, 46.22, 45.64,
        ]
    }

    #[test]
    fn test_sma_basic() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let result = sma(&data, 3);

        assert_eq!(result.len(), 3);
        assert!((result[0] - 2.0).abs() < 0.001);
        assert!((result[1] - 3.0).abs() < 0.001);
        assert!((result[2] - 4.0).abs() < 0.001);
    }

    #[test]
    fn test_sma_insufficient_data() {
        assert!(sma(&[1.0, 2.0], 3).is_empty());
        assert!(sma(&[1.0, 2.0], 0).is_empty());
        assert_eq!(latest_sma(&[1.0, 2.0], 3), None);
    }

    #[test]
    fn test_rsi_length_and_range() {
        let prices = sample_prices();
        let values = rsi(&prices, 14);

        assert_eq!(values.len(), prices.len() - 14);
        assert!(values.iter().all(|v| (0.0..=100.0).contains(v)));
        // First value of Wilder's example is ~70.46
        assert!((values[0] - 70.46).abs() < 0.1);
    }

    #[test]
    fn test_rsi_insufficient_data() {
        assert!(rsi(&[1.0; 14], 14).is_empty());
        assert_eq!(latest_rsi(&[1.0; 10], 14), None);
    }

    #[test]
    fn test_rsi_extremes() {
        let rising: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        assert_eq!(latest_rsi(&rising, 14), Some(100.0));

        let flat = vec![50.0; 30];
        assert_eq!(latest_rsi(&flat, 14), Some(50.0));

        let falling: Vec<f64> = (0..30).map(|i| 100.0 - i as f64).collect();
        assert!(latest_rsi(&falling, 14).unwrap() < 1.0);
    }

    #[test]
    fn test_quote_summary_short_history() {
        let quote = quote_summary_from_closes(&sample_prices(), None, Some(1.0e9), Some(1.0e7));

        assert_eq!(quote.price, Some(45.64));
        assert_eq!(quote.previous_close, Some(46.22));
        assert_eq!(quote.sma200, None);
        assert!(quote.rsi14.is_some());
        assert_eq!(quote.shares_outstanding, Some(1.0e7));
    }

    #[test]
    fn test_quote_summary_long_history() {
        let closes: Vec<f64> = (0..250).map(|i| 100.0 + (i % 10) as f64).collect();
        let quote = quote_summary_from_closes(&closes, Some(99.0), None, None);

        assert_eq!(quote.previous_close, Some(99.0));
        let expected_sma = closes[50..].iter().sum::<f64>() / 200.0;
        assert!((quote.sma200.unwrap() - expected_sma).abs() < 1e-9);
        assert_eq!(quote.closes.len(), 250);
    }

    #[test]
    fn test_quote_summary_drops_non_finite_closes() {
        let quote = quote_summary_from_closes(&[10.0, f64::NAN, 11.0], None, None, None);

        assert_eq!(quote.price, Some(11.0));
        assert_eq!(quote.previous_close, Some(10.0));
        assert_eq!(quote.closes, vec![10.0, 11.0]);
    }

    #[test]
    fn test_empty_history() {
        let quote = quote_summary_from_closes(&[], None, None, None);
        assert!(quote.price.is_none());
        assert!(quote.rsi14.is_none());
        assert!(quote.sma200.is_none());
    }
}

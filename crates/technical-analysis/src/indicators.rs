use analysis_core::{finite, QuoteSummary};

/// Lookback for the long-term trend filter.
pub const SMA_TREND_PERIOD: usize = 200;
/// Lookback for the momentum oscillator.
pub const RSI_PERIOD: usize = 14;

/// Simple Moving Average
pub fn sma(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period {
        return vec![];
    }

    let mut result = Vec::with_capacity(data.len() - period + 1);
    let mut window_sum: f64 = data[..period].iter().sum();
    result.push(window_sum / period as f64);
    for i in period..data.len() {
        window_sum += data[i] - data[i - period];
        result.push(window_sum / period as f64);
    }
    result
}

/// Relative Strength Index with Wilder smoothing.
///
/// The first value is seeded from the plain average of the first `period` changes,
/// so `data.len() - period` values are returned.
pub fn rsi(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period + 1 {
        return vec![];
    }

    let (gains, losses): (Vec<f64>, Vec<f64>) = data
        .windows(2)
        .map(|w| {
            let change = w[1] - w[0];
            if change > 0.0 {
                (change, 0.0)
            } else {
                (0.0, -change)
            }
        })
        .unzip();

    let mut avg_gain = gains[..period].iter().sum::<f64>() / period as f64;
    let mut avg_loss = losses[..period].iter().sum::<f64>() / period as f64;

    let mut rsi_values = Vec::with_capacity(gains.len() - period + 1);
    rsi_values.push(rsi_from_averages(avg_gain, avg_loss));

    for i in period..gains.len() {
        avg_gain = (avg_gain * (period - 1) as f64 + gains[i]) / period as f64;
        avg_loss = (avg_loss * (period - 1) as f64 + losses[i]) / period as f64;
        rsi_values.push(rsi_from_averages(avg_gain, avg_loss));
    }

    rsi_values
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        // Flat series reads as neutral, a series with only gains as fully overbought
        return if avg_gain == 0.0 { 50.0 } else { 100.0 };
    }
    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}

/// Most recent SMA value, if the series is long enough.
pub fn latest_sma(data: &[f64], period: usize) -> Option<f64> {
    sma(data, period).last().copied()
}

/// Most recent RSI value, if the series is long enough.
pub fn latest_rsi(data: &[f64], period: usize) -> Option<f64> {
    rsi(data, period).last().copied()
}

/// Build a [`QuoteSummary`] from a close series (oldest first).
///
/// Non-finite closes are dropped before computing indicators. Price is the last
/// close; SMA200 and RSI14 stay `None` until the history is long enough.
pub fn quote_summary_from_closes(
    closes: &[f64],
    previous_close: Option<f64>,
    market_cap: Option<f64>,
    shares_outstanding: Option<f64>,
) -> QuoteSummary {
    let clean: Vec<f64> = closes.iter().copied().filter(|c| c.is_finite()).collect();

    let previous_close = finite(previous_close).or_else(|| {
        if clean.len() >= 2 {
            Some(clean[clean.len() - 2])
        } else {
            None
        }
    });

    QuoteSummary {
        price: clean.last().copied(),
        previous_close,
        market_cap: finite(market_cap),
        shares_outstanding: finite(shares_outstanding),
        sma200: latest_sma(&clean, SMA_TREND_PERIOD),
        rsi14: latest_rsi(&clean, RSI_PERIOD),
        closes: clean,
    }
}

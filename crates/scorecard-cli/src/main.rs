//! scorecard-cli: Evaluate a batch of tickers and print their scorecards as JSON.
//!
//! Input is a JSON array of per-ticker inputs (quote, FCF or cash-flow quarters,
//! institutional holders, news text). Ownership snapshots are appended to the
//! trend cache on every run, so repeated runs build up the QoQ history.
//!
//! Usage:
//!   cargo run -p scorecard-cli -- --input batch.json
//!   cargo run -p scorecard-cli -- --input batch.json --tickers AAPL,MSFT --pretty
//!   cat batch.json | cargo run -p scorecard-cli -- --input -

use anyhow::{bail, Context, Result};
use scorecard::{parse_tickers, ScorecardConfig, ScorecardEngine, TickerInputs};
use std::io::Read;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    // Logs go to stderr; stdout carries the scorecards.
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_writer(std::io::stderr)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "scorecard_cli=info,scorecard=info,ownership_analysis=warn".into()),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "scorecard_cli=info,scorecard=info,ownership_analysis=warn".into()),
            )
            .init();
    }

    let args: Vec<String> = std::env::args().collect();
    let pretty = args.iter().any(|a| a == "--pretty");

    let input = match args
        .iter()
        .position(|a| a == "--input")
        .and_then(|i| args.get(i + 1))
    {
        Some(path) => path.clone(),
        None => {
            eprintln!("Usage:");
            eprintln!("  scorecard-cli --input FILE             JSON array of ticker inputs (- for stdin)");
            eprintln!();
            eprintln!("Options:");
            eprintln!("  --tickers AAPL,MSFT   Only evaluate these tickers");
            eprintln!("  --cache-dir PATH      Ownership trend directory (default: $OWNERSHIP_CACHE_DIR)");
            eprintln!("  --pretty              Pretty-print the output");
            bail!("missing --input");
        }
    };

    let filter: Option<Vec<String>> = args
        .iter()
        .position(|a| a == "--tickers")
        .and_then(|i| args.get(i + 1))
        .map(|v| parse_tickers(v));

    let mut config = ScorecardConfig::from_env().context("Invalid scorecard configuration")?;
    if let Some(dir) = args
        .iter()
        .position(|a| a == "--cache-dir")
        .and_then(|i| args.get(i + 1))
    {
        config.ownership_cache_dir = dir.into();
    }

    let raw = if input == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        buf
    } else {
        std::fs::read_to_string(&input).with_context(|| format!("Failed to read {}", input))?
    };
    let mut batch: Vec<TickerInputs> =
        serde_json::from_str(&raw).with_context(|| format!("Failed to parse ticker inputs from {}", input))?;

    if let Some(wanted) = &filter {
        batch.retain(|t| wanted.contains(&t.ticker.trim().to_uppercase()));
    }
    if batch.is_empty() {
        tracing::warn!("No tickers to evaluate");
    }

    tracing::info!(
        "Evaluating {} tickers (ownership cache: {})",
        batch.len(),
        config.ownership_cache_dir.display()
    );
    let engine = ScorecardEngine::new(config)?;
    let scorecards = engine.evaluate_batch(&batch);

    let eligible = scorecards.iter().filter(|s| s.buy_signal.eligible).count();
    for card in &scorecards {
        tracing::info!(
            "{:<6} composite {:>5.1}  {}",
            card.ticker,
            card.breakdown.composite,
            if card.buy_signal.eligible { "BUY-ELIGIBLE" } else { "-" }
        );
    }
    tracing::info!("{} of {} tickers buy-eligible", eligible, scorecards.len());

    let out = if pretty {
        serde_json::to_string_pretty(&scorecards)?
    } else {
        serde_json::to_string(&scorecards)?
    };
    println!("{}", out);

    Ok(())
}

//! Ownership Trend Store
//!
//! One ordered snapshot series per ticker. Appends are read-modify-write: load,
//! push, collapse duplicate dates (last write wins), sort ascending, persist.
//! Writes for the same ticker are serialized; different tickers never contend.
//! Reads are self-healing: an unreadable series is logged and treated as empty.

use analysis_core::{AnalysisError, OwnershipSnapshot};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use dashmap::DashMap;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Canonical on-disk date format: timezone-naive, fractional seconds only when present.
const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Result of an append: the tail before the write and the persisted series after it.
#[derive(Debug, Clone, PartialEq)]
pub struct AppendOutcome {
    pub previous: Option<OwnershipSnapshot>,
    pub trend: Vec<OwnershipSnapshot>,
}

pub trait TrendStore: Send + Sync {
    /// Ordered (ascending) snapshots for `ticker`. Unknown or unreadable tickers yield
    /// an empty series, never an error.
    fn load_trend(&self, ticker: &str) -> Vec<OwnershipSnapshot>;

    /// Append a snapshot and return the prior tail alongside the new series.
    /// Both are read under the same per-ticker lock as the write.
    fn append_with_previous(
        &self,
        ticker: &str,
        snapshot: OwnershipSnapshot,
    ) -> Result<AppendOutcome, AnalysisError>;

    fn append_snapshot(
        &self,
        ticker: &str,
        snapshot: OwnershipSnapshot,
    ) -> Result<Vec<OwnershipSnapshot>, AnalysisError> {
        self.append_with_previous(ticker, snapshot).map(|o| o.trend)
    }
}

/// Parse any accepted date representation into naive UTC.
///
/// Accepts RFC 3339 with an offset (converted to UTC), naive `T`- or space-separated
/// timestamps with optional fractional seconds, and bare `YYYY-MM-DD` (midnight).
pub fn normalize_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    for fmt in [DATE_FORMAT, "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Collapse duplicate dates keeping the last occurrence, ascending by date.
pub(crate) fn dedup_sorted(rows: impl IntoIterator<Item = OwnershipSnapshot>) -> Vec<OwnershipSnapshot> {
    let mut by_date: BTreeMap<NaiveDateTime, OwnershipSnapshot> = BTreeMap::new();
    for row in rows {
        by_date.insert(row.date, row);
    }
    by_date.into_values().collect()
}

/// Persisted row. Dates stay strings until normalized; numeric columns accept
/// numbers, numeric strings, or anything else as missing.
#[derive(Debug, Serialize, Deserialize)]
struct SnapshotRow {
    #[serde(default, deserialize_with = "lenient_string")]
    date: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    inst_pct: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    top5_pct: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    top10_pct: Option<f64>,
}

impl SnapshotRow {
    fn into_snapshot(self) -> Option<OwnershipSnapshot> {
        let date = normalize_timestamp(self.date.as_deref()?)?;
        Some(OwnershipSnapshot {
            date,
            inst_pct: self.inst_pct,
            top5_pct: self.top5_pct,
            top10_pct: self.top10_pct,
        })
    }
}

impl From<&OwnershipSnapshot> for SnapshotRow {
    fn from(s: &OwnershipSnapshot) -> Self {
        SnapshotRow {
            date: Some(s.date.format(DATE_FORMAT).to_string()),
            inst_pct: s.inst_pct.filter(|v| v.is_finite()),
            top5_pct: s.top5_pct.filter(|v| v.is_finite()),
            top10_pct: s.top10_pct.filter(|v| v.is_finite()),
        }
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Some(s),
        _ => None,
    })
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite()))
}

/// Per-ticker write locks.
#[derive(Default)]
struct TickerLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl TickerLocks {
    fn handle(&self, key: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

fn acquire(lock: &Mutex<()>) -> MutexGuard<'_, ()> {
    // A panicked writer never leaves a half-written file (writes go through rename),
    // so a poisoned lock is safe to reuse.
    lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Canonical store key for a ticker: upper-cased, path separators replaced.
fn ticker_key(ticker: &str) -> Result<String, AnalysisError> {
    let key = ticker.trim().to_uppercase().replace(['/', '\\'], "_");
    if key.is_empty() || key.chars().all(|c| c == '.') {
        return Err(AnalysisError::InvalidData(format!("invalid ticker {:?}", ticker)));
    }
    Ok(key)
}

/// File-backed store: one JSON array of rows per ticker under `root`.
pub struct FileTrendStore {
    root: PathBuf,
    locks: TickerLocks,
}

impl FileTrendStore {
    /// Open (and create if needed) a store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, AnalysisError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            locks: TickerLocks::default(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the trend file for `ticker`.
    pub fn path_for(&self, ticker: &str) -> Result<PathBuf, AnalysisError> {
        Ok(self.root.join(format!("{}.json", ticker_key(ticker)?)))
    }

    fn read_rows(path: &Path) -> Result<Vec<OwnershipSnapshot>, AnalysisError> {
        if !path.exists() {
            return Ok(Vec::new());
        }
        let text = fs::read_to_string(path)?;
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        // Rows are decoded one at a time so a single bad row cannot take the series down.
        let rows: Vec<serde_json::Value> = serde_json::from_str(&text)?;
        let total = rows.len();
        let snapshots: Vec<OwnershipSnapshot> = rows
            .into_iter()
            .filter_map(|row| serde_json::from_value::<SnapshotRow>(row).ok())
            .filter_map(SnapshotRow::into_snapshot)
            .collect();
        if snapshots.len() < total {
            tracing::warn!(
                "Dropped {} malformed trend rows from {}",
                total - snapshots.len(),
                path.display()
            );
        }
        Ok(dedup_sorted(snapshots))
    }

    fn load_path(path: &Path) -> Vec<OwnershipSnapshot> {
        match Self::read_rows(path) {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!("Ownership trend at {} unreadable, starting empty: {}", path.display(), e);
                Vec::new()
            }
        }
    }

    fn write_rows(path: &Path, rows: &[OwnershipSnapshot]) -> Result<(), AnalysisError> {
        let rows: Vec<SnapshotRow> = rows.iter().map(SnapshotRow::from).collect();
        let body = serde_json::to_string_pretty(&rows)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, body)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

impl TrendStore for FileTrendStore {
    fn load_trend(&self, ticker: &str) -> Vec<OwnershipSnapshot> {
        match self.path_for(ticker) {
            Ok(path) => Self::load_path(&path),
            Err(e) => {
                tracing::warn!("Cannot load ownership trend: {}", e);
                Vec::new()
            }
        }
    }

    fn append_with_previous(
        &self,
        ticker: &str,
        snapshot: OwnershipSnapshot,
    ) -> Result<AppendOutcome, AnalysisError> {
        let key = ticker_key(ticker)?;
        let path = self.root.join(format!("{}.json", key));
        let lock = self.locks.handle(&key);
        let _guard = acquire(&lock);

        let existing = Self::load_path(&path);
        let previous = existing.last().cloned();
        let trend = dedup_sorted(existing.into_iter().chain(std::iter::once(snapshot)));
        Self::write_rows(&path, &trend)?;

        tracing::debug!(ticker = %key, rows = trend.len(), "Persisted ownership snapshot");
        Ok(AppendOutcome { previous, trend })
    }
}

/// Volatile store with the same semantics, for callers that do not need durability.
#[derive(Default)]
pub struct InMemoryTrendStore {
    series: DashMap<String, Vec<OwnershipSnapshot>>,
}

impl InMemoryTrendStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TrendStore for InMemoryTrendStore {
    fn load_trend(&self, ticker: &str) -> Vec<OwnershipSnapshot> {
        ticker_key(ticker)
            .ok()
            .and_then(|key| self.series.get(&key).map(|s| s.value().clone()))
            .unwrap_or_default()
    }

    fn append_with_previous(
        &self,
        ticker: &str,
        snapshot: OwnershipSnapshot,
    ) -> Result<AppendOutcome, AnalysisError> {
        let key = ticker_key(ticker)?;
        // The entry guard holds the shard lock for the whole read-modify-write.
        let mut entry = self.series.entry(key).or_default();
        let previous = entry.last().cloned();
        let trend = dedup_sorted(entry.drain(..).chain(std::iter::once(snapshot)));
        *entry = trend.clone();
        Ok(AppendOutcome { previous, trend })
    }
}

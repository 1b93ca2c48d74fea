//! CSV price history adapter.
//!
//! One file per asset at `<base>/<asset_id>.csv` with the header
//! `timestamp,open,high,low,close,volume`. Timestamps are either `YYYY-MM-DD`
//! (midnight UTC) or RFC 3339.

use crate::domain::error::TrackerError;
use crate::domain::price::{PriceHistory, PricePoint, Timeframe};
use crate::ports::price_history_port::PriceHistoryPort;
use chrono::{DateTime, NaiveDate, Utc};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, asset_id: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", asset_id))
    }

    /// Parses every row of a price file, in file order.
    pub fn read_points(path: &Path) -> Result<Vec<PricePoint>, TrackerError> {
        let content = fs::read_to_string(path)?;
        parse_points(&content, path)
    }
}

fn parse_error(path: &Path, line: usize, reason: impl std::fmt::Display) -> TrackerError {
    TrackerError::persistence(format!("{}:{}: {}", path.display(), line, reason))
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn parse_points(content: &str, path: &Path) -> Result<Vec<PricePoint>, TrackerError> {
    let mut rdr = csv::Reader::from_reader(content.as_bytes());
    let mut points = Vec::new();

    for (idx, result) in rdr.records().enumerate() {
        // Header is line 1.
        let line = idx + 2;
        let record = result.map_err(|e| parse_error(path, line, e))?;

        let column = |i: usize, name: &str| -> Result<f64, TrackerError> {
            let raw = record
                .get(i)
                .ok_or_else(|| parse_error(path, line, format!("missing {name} column")))?;
            raw.trim()
                .parse::<f64>()
                .map_err(|e| parse_error(path, line, format!("invalid {name} value '{raw}': {e}")))
        };

        let raw_ts = record
            .get(0)
            .ok_or_else(|| parse_error(path, line, "missing timestamp column"))?;
        let timestamp = parse_timestamp(raw_ts)
            .ok_or_else(|| parse_error(path, line, format!("invalid timestamp '{raw_ts}'")))?;

        points.push(PricePoint {
            timestamp,
            open: column(1, "open")?,
            high: column(2, "high")?,
            low: column(3, "low")?,
            close: column(4, "close")?,
            volume: column(5, "volume")?,
        });
    }

    Ok(points)
}

impl PriceHistoryPort for CsvAdapter {
    fn get_price_history(
        &self,
        asset_id: &str,
        timeframe: Timeframe,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<PriceHistory, TrackerError> {
        let symbol = asset_id
            .split_once('-')
            .map(|(_, s)| s)
            .unwrap_or(asset_id);
        let path = self.csv_path(asset_id);

        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!("no price file at {}", path.display());
                return Ok(PriceHistory::new(asset_id, symbol, timeframe, Vec::new()));
            }
            Err(e) => {
                return Err(TrackerError::persistence(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        let points: Vec<PricePoint> = parse_points(&content, &path)?
            .into_iter()
            .filter(|p| start.is_none_or(|s| p.timestamp >= s))
            .filter(|p| end.is_none_or(|e| p.timestamp <= e))
            .collect();

        Ok(PriceHistory::new(asset_id, symbol, timeframe, points))
    }
}

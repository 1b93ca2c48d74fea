//! Price points and price history.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::error::TrackerError;

/// Sampling interval of a price history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Timeframe {
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::Daily => "daily",
            Timeframe::Weekly => "weekly",
            Timeframe::Monthly => "monthly",
            Timeframe::Yearly => "yearly",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(Timeframe::Daily),
            "weekly" => Ok(Timeframe::Weekly),
            "monthly" => Ok(Timeframe::Monthly),
            "yearly" => Ok(Timeframe::Yearly),
            other => Err(format!("unknown timeframe: {other}")),
        }
    }
}

/// One OHLCV sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Ordered price samples of one asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceHistory {
    pub asset_id: String,
    pub symbol: String,
    pub timeframe: Timeframe,
    points: Vec<PricePoint>,
}

impl PriceHistory {
    /// Builds a history, sorting the points ascending by timestamp.
    pub fn new(
        asset_id: impl Into<String>,
        symbol: impl Into<String>,
        timeframe: Timeframe,
        mut points: Vec<PricePoint>,
    ) -> Self {
        points.sort_by_key(|p| p.timestamp);
        Self {
            asset_id: asset_id.into(),
            symbol: symbol.into(),
            timeframe,
            points,
        }
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Prefix `[0..=end]`: everything known as of bar `end`.
    pub fn window(&self, end: usize) -> &[PricePoint] {
        let stop = (end + 1).min(self.points.len());
        &self.points[..stop]
    }
}

/// Start of a look-back window of `days` days ending at `end`.
pub fn window_start(end: DateTime<Utc>, days: i64) -> Result<DateTime<Utc>, TrackerError> {
    Duration::try_days(days)
        .and_then(|span| end.checked_sub_signed(span))
        .ok_or_else(|| TrackerError::InvalidInput {
            reason: format!("a window of {days} days before {end} is out of range"),
        })
}

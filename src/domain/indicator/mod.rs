//! Technical indicators over ordered price points.
//!
//! Every function takes a slice of [`PricePoint`]s ordered oldest first, so the
//! same code serves a full [`PriceHistory`](crate::domain::price::PriceHistory)
//! and the look-ahead-free prefixes the backtester hands to strategies.
//!
//! - [`sma`]: simple moving average
//! - [`ema`]: exponential moving average
//! - [`roc`]: percentage performance over a trailing window
//! - [`stddev`]: population standard deviation and daily-change volatility
//! - [`volume`]: rising-volume detection
//! - [`extremes`]: proximity to the all-time high

pub mod ema;
pub mod extremes;
pub mod roc;
pub mod sma;
pub mod stddev;
pub mod volume;

pub use ema::exponential_moving_average;
pub use extremes::near_all_time_high;
pub use roc::recent_performance;
pub use sma::simple_moving_average;
pub use stddev::{population_std_dev, volatility};
pub use volume::rising_volume;

#[cfg(test)]
use crate::domain::price::PricePoint;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IndicatorError {
    #[error("insufficient data: have {have} points, need {need}")]
    InsufficientData { have: usize, need: usize },
}

/// Builds one bar per close, one day apart, with constant volume.
#[cfg(test)]
pub(crate) fn bars_from_closes(closes: &[f64]) -> Vec<PricePoint> {
    use chrono::{Duration, TimeZone, Utc};

    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PricePoint {
            timestamp: start + Duration::days(i as i64),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1000.0,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_data_message() {
        let err = IndicatorError::InsufficientData { have: 3, need: 14 };
        assert_eq!(err.to_string(), "insufficient data: have 3 points, need 14");
    }

    #[test]
    fn flat_series_is_quiet() {
        let bars = bars_from_closes(&[50.0; 40]);
        assert_eq!(recent_performance(&bars, 14), 0.0);
        assert_eq!(volatility(&bars, 30), 0.0);
        assert!(!rising_volume(&bars, 14));
        // A flat close sits at its own high.
        assert!(near_all_time_high(&bars));
    }
}

//! Configuration validation.
//!
//! Every key is optional; present keys must hold sensible values. Run once at
//! start-up so bad settings fail before any data is touched.

use crate::domain::error::TrackerError;
use crate::ports::config_port::ConfigPort;
use chrono::{DateTime, Utc};

pub const DEFAULT_INITIAL_INVESTMENT: f64 = 1000.0;
const MAX_WORKERS: i64 = 64;
/// One century of daily history.
const MAX_LOOKBACK_DAYS: i64 = 36_500;

/// Backtest defaults read from `[backtest]`.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestSettings {
    pub initial_investment: f64,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), TrackerError> {
    validate_pool_size(config)?;
    validate_analysis(config)?;
    backtest_settings(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> TrackerError {
    TrackerError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn validate_pool_size(config: &dyn ConfigPort) -> Result<(), TrackerError> {
    let value = config.get_int("sqlite", "pool_size", 4);
    if value < 1 {
        return Err(invalid("sqlite", "pool_size", "pool_size must be at least 1"));
    }
    Ok(())
}

fn validate_analysis(config: &dyn ConfigPort) -> Result<(), TrackerError> {
    let lookback_days = config.get_int("analysis", "lookback_days", 90);
    if !(1..=MAX_LOOKBACK_DAYS).contains(&lookback_days) {
        return Err(invalid(
            "analysis",
            "lookback_days",
            &format!("lookback_days must be between 1 and {MAX_LOOKBACK_DAYS}"),
        ));
    }
    if config.get_int("analysis", "min_points", 10) < 2 {
        return Err(invalid("analysis", "min_points", "min_points must be at least 2"));
    }
    let workers = config.get_int("analysis", "workers", 4);
    if !(1..=MAX_WORKERS).contains(&workers) {
        return Err(invalid(
            "analysis",
            "workers",
            &format!("workers must be between 1 and {MAX_WORKERS}"),
        ));
    }
    Ok(())
}

pub fn backtest_settings(config: &dyn ConfigPort) -> Result<BacktestSettings, TrackerError> {
    let initial_investment =
        config.get_double("backtest", "initial_investment", DEFAULT_INITIAL_INVESTMENT);
    if initial_investment <= 0.0 || !initial_investment.is_finite() {
        return Err(invalid(
            "backtest",
            "initial_investment",
            "initial_investment must be positive",
        ));
    }

    let start_date = config.get_date("backtest", "start_date")?;
    let end_date = config.get_date("backtest", "end_date")?;
    if matches!((start_date, end_date), (Some(start), Some(end)) if start >= end) {
        return Err(invalid(
            "backtest",
            "start_date",
            "start_date must be before end_date",
        ));
    }

    Ok(BacktestSettings {
        initial_investment,
        start_date,
        end_date,
    })
}

//! Configuration access port.

use chrono::{DateTime, NaiveDate, Utc};

use crate::domain::error::TrackerError;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;
    fn get_double(&self, section: &str, key: &str, default: f64) -> f64;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool;

    fn require_string(&self, section: &str, key: &str) -> Result<String, TrackerError> {
        self.get_string(section, key)
            .ok_or_else(|| TrackerError::ConfigMissing {
                section: section.to_string(),
                key: key.to_string(),
            })
    }

    /// Counts and sizes; negative values fall back to `default`.
    fn get_usize(&self, section: &str, key: &str, default: usize) -> usize {
        let value = self.get_int(section, key, default as i64);
        usize::try_from(value).unwrap_or(default)
    }

    /// Optional `YYYY-MM-DD` value as midnight UTC.
    fn get_date(&self, section: &str, key: &str) -> Result<Option<DateTime<Utc>>, TrackerError> {
        let Some(raw) = self.get_string(section, key) else {
            return Ok(None);
        };
        let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|e| {
            TrackerError::ConfigInvalid {
                section: section.to_string(),
                key: key.to_string(),
                reason: format!("expected YYYY-MM-DD, got '{raw}': {e}"),
            }
        })?;
        Ok(date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc()))
    }
}

//! Price history access port.

use chrono::{DateTime, Utc};

use crate::domain::error::TrackerError;
use crate::domain::price::{PriceHistory, Timeframe};

pub trait PriceHistoryPort: Send + Sync {
    /// Points of `asset_id` at `timeframe` inside the optional inclusive window,
    /// sorted ascending. An unknown asset yields an empty history.
    fn get_price_history(
        &self,
        asset_id: &str,
        timeframe: Timeframe,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<PriceHistory, TrackerError>;
}

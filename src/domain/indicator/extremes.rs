//! Proximity to the all-time high.
//!
//! Near when C[last] >= 0.9 * max(H) over the whole series.

use crate::domain::price::PricePoint;

const NEAR_HIGH_RATIO: f64 = 0.9;

pub fn near_all_time_high(points: &[PricePoint]) -> bool {
    let Some(latest) = points.last() else {
        return false;
    };

    let max_high = points.iter().map(|p| p.high).fold(f64::MIN, f64::max);
    if max_high <= 0.0 {
        return false;
    }

    latest.close >= max_high * NEAR_HIGH_RATIO
}

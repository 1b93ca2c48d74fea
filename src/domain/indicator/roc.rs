//! Recent performance (rate of change over a trailing window).
//!
//! PERF(n) = (C[last] - C[len-n]) / C[len-n] * 100
//! The window counts the latest bar, so n points are needed. Returns 0 when
//! fewer than n points exist or the reference close is not positive.

use crate::domain::price::PricePoint;

pub fn recent_performance(points: &[PricePoint], days: usize) -> f64 {
    if days == 0 || points.len() < days {
        return 0.0;
    }

    let current = points[points.len() - 1].close;
    let past = points[points.len() - days].close;

    if past <= 0.0 {
        return 0.0;
    }

    (current - past) / past * 100.0
}

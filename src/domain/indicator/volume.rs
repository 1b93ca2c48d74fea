//! Volume trend.
//!
//! Rising when mean(volume of the last n bars) > 1.2 * mean(volume of the n bars
//! before them). Needs 2n bars; a zero prior mean never counts as rising.

use crate::domain::price::PricePoint;

const RISING_VOLUME_FACTOR: f64 = 1.2;

pub fn rising_volume(points: &[PricePoint], days: usize) -> bool {
    if days == 0 || points.len() < days * 2 {
        return false;
    }

    let len = points.len();
    let recent = mean_volume(&points[len - days..]);
    let prior = mean_volume(&points[len - 2 * days..len - days]);

    if prior <= 0.0 {
        return false;
    }

    recent > prior * RISING_VOLUME_FACTOR
}

fn mean_volume(points: &[PricePoint]) -> f64 {
    points.iter().map(|p| p.volume).sum::<f64>() / points.len() as f64
}

//! Standard deviation and volatility.
//!
//! Population standard deviation: sqrt(sum((x - mean)^2) / n).
//! VOL(n) is the population standard deviation of the daily percentage changes
//! between consecutive closes inside the trailing n points.

use crate::domain::price::PricePoint;

pub fn population_std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values
        .iter()
        .map(|v| {
            let diff = v - mean;
            diff * diff
        })
        .sum::<f64>()
        / n;

    variance.sqrt()
}

pub fn volatility(points: &[PricePoint], days: usize) -> f64 {
    if days < 2 || points.len() < days {
        return 0.0;
    }

    let window = &points[points.len() - days..];
    let changes: Vec<f64> = window
        .windows(2)
        .filter(|w| w[0].close > 0.0)
        .map(|w| (w[1].close - w[0].close) / w[0].close * 100.0)
        .collect();

    population_std_dev(&changes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::bars_from_closes;

    #[test]
    fn std_dev_known_values() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((population_std_dev(&values) - 2.0).abs() < 1e-10);
    }

    #[test]
    fn std_dev_constant_values() {
        assert_eq!(population_std_dev(&[3.0, 3.0, 3.0]), 0.0);
        assert_eq!(population_std_dev(&[]), 0.0);
    }

    #[test]
    fn volatility_alternating_changes() {
        // 100 -> 110 is +10%, 110 -> 99 is -10%.
        let bars = bars_from_closes(&[100.0, 110.0, 99.0]);
        let expected = population_std_dev(&[10.0, -10.0]);
        assert!((volatility(&bars, 3) - expected).abs() < 1e-9);
        assert!((expected - 10.0).abs() < 1e-9);
    }

    #[test]
    fn volatility_uses_trailing_window_only() {
        let mut closes = vec![100.0, 150.0, 80.0, 200.0];
        closes.extend([100.0; 30]);
        let bars = bars_from_closes(&closes);
        assert_eq!(volatility(&bars, 30), 0.0);
    }

    #[test]
    fn volatility_too_few_points() {
        let bars = bars_from_closes(&[100.0, 120.0]);
        assert_eq!(volatility(&bars, 30), 0.0);
    }

    #[test]
    fn volatility_skips_zero_close() {
        let bars = bars_from_closes(&[0.0, 10.0, 11.0]);
        // Only the 10 -> 11 change counts.
        assert_eq!(volatility(&bars, 3), 0.0);
    }
}

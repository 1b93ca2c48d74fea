//! Exponential Moving Average.
//!
//! k = 2/(n+1), seed with the SMA of the first n closes, then
//! EMA[j] = (C - EMA[j-1]) * k + EMA[j-1].
//! Output aligns with the SMA: `len - n + 1` values.

use crate::domain::indicator::IndicatorError;
use crate::domain::price::PricePoint;

pub fn exponential_moving_average(
    points: &[PricePoint],
    period: usize,
) -> Result<Vec<f64>, IndicatorError> {
    if period == 0 || points.len() < period {
        return Err(IndicatorError::InsufficientData {
            have: points.len(),
            need: period.max(1),
        });
    }

    let k = 2.0 / (period as f64 + 1.0);
    let seed = points[..period].iter().map(|p| p.close).sum::<f64>() / period as f64;

    let mut values = Vec::with_capacity(points.len() - period + 1);
    values.push(seed);

    let mut ema = seed;
    for point in &points[period..] {
        ema = (point.close - ema) * k + ema;
        values.push(ema);
    }

    Ok(values)
}

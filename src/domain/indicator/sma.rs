//! Simple Moving Average.
//!
//! SMA(n)[k] = mean(C[k..k+n]) for every full trailing window, so the output
//! holds `len - n + 1` values, the last one being the most recent average.

use crate::domain::indicator::IndicatorError;
use crate::domain::price::PricePoint;

pub fn simple_moving_average(
    points: &[PricePoint],
    period: usize,
) -> Result<Vec<f64>, IndicatorError> {
    if period == 0 || points.len() < period {
        return Err(IndicatorError::InsufficientData {
            have: points.len(),
            need: period.max(1),
        });
    }

    let mut values = Vec::with_capacity(points.len() - period + 1);
    let mut sum: f64 = points[..period].iter().map(|p| p.close).sum();
    values.push(sum / period as f64);

    for i in period..points.len() {
        sum += points[i].close - points[i - period].close;
        values.push(sum / period as f64);
    }

    Ok(values)
}

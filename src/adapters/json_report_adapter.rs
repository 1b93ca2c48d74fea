//! JSON report adapter: pretty-printed backtest and comparison documents.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::domain::backtest::BacktestResult;
use crate::domain::error::TrackerError;
use crate::domain::strategy::StrategyType;
use crate::ports::report_port::ReportPort;

#[derive(Serialize)]
struct ComparisonReport<'a> {
    asset_id: &'a str,
    symbol: &'a str,
    /// Highest total return; ties go to the earlier strategy.
    best_strategy: Option<StrategyType>,
    results: &'a BTreeMap<StrategyType, BacktestResult>,
}

fn best_strategy(results: &BTreeMap<StrategyType, BacktestResult>) -> Option<StrategyType> {
    results
        .iter()
        .fold(None::<(&StrategyType, f64)>, |best, (t, r)| {
            let pct = r.statistics.profit_loss_pct;
            match best {
                Some((_, best_pct)) if best_pct >= pct => best,
                _ => Some((t, pct)),
            }
        })
        .map(|(t, _)| *t)
}

fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<(), TrackerError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| TrackerError::Io(std::io::Error::other(e.to_string())))?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, json)?;
    Ok(())
}

pub struct JsonReportAdapter;

impl JsonReportAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JsonReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportPort for JsonReportAdapter {
    fn write_backtest(&self, result: &BacktestResult, output_path: &Path) -> Result<(), TrackerError> {
        write_json(result, output_path)?;
        log::info!("backtest report written to {}", output_path.display());
        Ok(())
    }

    fn write_comparison(
        &self,
        results: &BTreeMap<StrategyType, BacktestResult>,
        output_path: &Path,
    ) -> Result<(), TrackerError> {
        let first = results.values().next();
        let report = ComparisonReport {
            asset_id: first.map_or("", |r| r.asset_id.as_str()),
            symbol: first.map_or("", |r| r.symbol.as_str()),
            best_strategy: best_strategy(results),
            results,
        };
        write_json(&report, output_path)?;
        log::info!("comparison report written to {}", output_path.display());
        Ok(())
    }
}

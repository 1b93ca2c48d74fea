//! Report output port.

use std::collections::BTreeMap;
use std::path::Path;

use crate::domain::backtest::BacktestResult;
use crate::domain::error::TrackerError;
use crate::domain::strategy::StrategyType;

pub trait ReportPort {
    fn write_backtest(&self, result: &BacktestResult, output_path: &Path) -> Result<(), TrackerError>;

    fn write_comparison(
        &self,
        results: &BTreeMap<StrategyType, BacktestResult>,
        output_path: &Path,
    ) -> Result<(), TrackerError>;
}

//! Strategy simulation service: forward scenarios, backtests and comparisons
//! for a single asset, wired to the asset and price history ports.

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use std::collections::BTreeMap;

use crate::domain::asset::Asset;
use crate::domain::backtest::{run_backtest, BacktestResult};
use crate::domain::error::TrackerError;
use crate::domain::price::{window_start, Timeframe};
use crate::domain::simulation::Simulation;
use crate::domain::strategy::{
    ensure_suitable, InvestmentStrategy, SimulationParameters, StrategyRegistry, StrategyType,
};
use crate::ports::asset_port::AssetPort;
use crate::ports::price_history_port::PriceHistoryPort;

/// Points a forward simulation needs in its horizon window.
const MIN_SIMULATION_POINTS: usize = 2;

pub struct StrategySimulator<'a> {
    assets: &'a dyn AssetPort,
    prices: &'a dyn PriceHistoryPort,
    registry: &'a StrategyRegistry,
}

impl<'a> StrategySimulator<'a> {
    pub fn new(
        assets: &'a dyn AssetPort,
        prices: &'a dyn PriceHistoryPort,
        registry: &'a StrategyRegistry,
    ) -> Self {
        Self {
            assets,
            prices,
            registry,
        }
    }

    fn load(
        &self,
        strategy_type: StrategyType,
        asset_id: &str,
    ) -> Result<(&'a dyn InvestmentStrategy, Asset), TrackerError> {
        let strategy = self.registry.get(strategy_type)?;
        let asset = self
            .assets
            .get_asset_by_id(asset_id)?
            .ok_or_else(|| TrackerError::not_found("asset", asset_id))?;
        ensure_suitable(strategy, &asset)?;
        Ok((strategy, asset))
    }

    /// Projects `initial_amount` through the strategy's scenarios, entering at
    /// the asset's current price. `horizon_days` of `None` or 0 uses the
    /// strategy's own horizon.
    pub fn simulate_forward(
        &self,
        strategy_type: StrategyType,
        asset_id: &str,
        initial_amount: f64,
        horizon_days: Option<u32>,
    ) -> Result<Simulation, TrackerError> {
        let (strategy, asset) = self.load(strategy_type, asset_id)?;
        let params = strategy.simulation_parameters(&asset);
        let horizon = horizon_days
            .filter(|&h| h > 0)
            .unwrap_or(params.time_horizon_days);

        let end = Utc::now();
        let start = window_start(end, i64::from(horizon))?;
        let history = self
            .prices
            .get_price_history(&asset.id, Timeframe::Daily, Some(start), Some(end))?;
        if history.len() < MIN_SIMULATION_POINTS {
            return Err(TrackerError::too_few_points(
                &asset.symbol,
                history.len(),
                MIN_SIMULATION_POINTS,
            ));
        }

        let mut simulation = Simulation::new(
            format!("{} simulation for {}", strategy.name(), asset.symbol),
            &asset,
            strategy_type,
            initial_amount,
            SimulationParameters {
                scenarios: params.scenarios,
                time_horizon_days: horizon,
            },
        );

        simulation.start()?;
        if let Err(e) = simulation.run() {
            log::warn!("simulation {} failed: {}", simulation.id, e);
            simulation.fail(e.to_string())?;
            return Err(e);
        }

        log::info!(
            "simulated {} on {}: {} scenarios over {} days",
            strategy.name(),
            asset.symbol,
            simulation.results.len(),
            horizon
        );
        Ok(simulation)
    }

    pub fn backtest(
        &self,
        strategy_type: StrategyType,
        asset_id: &str,
        initial_investment: f64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<BacktestResult, TrackerError> {
        if start > end {
            return Err(TrackerError::InvalidInput {
                reason: format!("backtest start {start} is after end {end}"),
            });
        }

        let (strategy, asset) = self.load(strategy_type, asset_id)?;
        let history = self
            .prices
            .get_price_history(&asset.id, Timeframe::Daily, Some(start), Some(end))?;

        log::debug!(
            "backtesting {} on {} over {} points",
            strategy.name(),
            asset.symbol,
            history.len()
        );
        let run = run_backtest(strategy, &asset, &history, initial_investment)?;
        log::info!(
            "{} on {}: {} trades, {:.2}% return",
            strategy.name(),
            asset.symbol,
            run.statistics.total_trades,
            run.statistics.profit_loss_pct
        );

        Ok(BacktestResult::from_run(
            &asset,
            strategy,
            initial_investment,
            start,
            end,
            run,
        ))
    }

    /// Backtests each strategy independently over the same window. Failing
    /// strategies are logged and left out; only a total failure is an error.
    pub fn compare_strategies(
        &self,
        strategy_types: &[StrategyType],
        asset_id: &str,
        initial_investment: f64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<BTreeMap<StrategyType, BacktestResult>, TrackerError> {
        let outcomes: Vec<(StrategyType, Result<BacktestResult, TrackerError>)> = strategy_types
            .par_iter()
            .map(|&t| (t, self.backtest(t, asset_id, initial_investment, start, end)))
            .collect();

        let mut results = BTreeMap::new();
        for (strategy_type, outcome) in outcomes {
            match outcome {
                Ok(result) => {
                    results.insert(strategy_type, result);
                }
                Err(e) => log::warn!("{strategy_type} backtest on {asset_id} failed: {e}"),
            }
        }

        if results.is_empty() {
            return Err(TrackerError::AllStrategiesFailed {
                asset: asset_id.to_string(),
            });
        }
        Ok(results)
    }
}

//! Historical backtester.
//!
//! Replays one strategy over one asset's price history, bar by bar. The walk
//! is a fold over the bar indices carrying a [`PositionState`], the trade
//! ledger and a [`TradeTally`]. At bar `i` the strategy only sees the prefix
//! `[0..=i]` of the history, so no decision can look ahead.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::asset::Asset;
use crate::domain::error::TrackerError;
use crate::domain::metrics::{BacktestStatistics, TradeTally};
use crate::domain::opportunity::SignalType;
use crate::domain::position::{OpenPosition, Trade};
use crate::domain::price::{PriceHistory, PricePoint};
use crate::domain::strategy::{InvestmentStrategy, StrategyType};

/// Bars skipped before the strategy is first consulted.
pub const WARM_UP_BARS: usize = 30;

pub const END_OF_PERIOD_REASON: &str = "end of period";

#[derive(Debug, Clone, PartialEq)]
pub enum PositionState {
    Flat { cash: f64 },
    Long(OpenPosition),
}

/// Ledger and statistics of a single walk.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestRun {
    pub trades: Vec<Trade>,
    pub statistics: BacktestStatistics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    pub asset_id: String,
    pub symbol: String,
    pub strategy: StrategyType,
    pub strategy_name: String,
    pub initial_investment: f64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub trades: Vec<Trade>,
    pub statistics: BacktestStatistics,
}

impl BacktestResult {
    pub fn from_run(
        asset: &Asset,
        strategy: &dyn InvestmentStrategy,
        initial_investment: f64,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
        run: BacktestRun,
    ) -> Self {
        BacktestResult {
            asset_id: asset.id.clone(),
            symbol: asset.symbol.clone(),
            strategy: strategy.strategy_type(),
            strategy_name: strategy.name().to_string(),
            initial_investment,
            start_date,
            end_date,
            trades: run.trades,
            statistics: run.statistics,
        }
    }
}

struct Walk {
    state: PositionState,
    trades: Vec<Trade>,
    tally: TradeTally,
}

impl Walk {
    fn close(mut self, position: &OpenPosition, bar: &PricePoint, reason: &str) -> Self {
        let trade = position.sell_trade(bar.close, bar.timestamp, reason);
        self.tally = self.tally.record(trade.profit_loss);
        self.state = PositionState::Flat { cash: trade.value };
        self.trades.push(trade);
        self
    }
}

fn validate(history: &PriceHistory, initial_investment: f64) -> Result<(), TrackerError> {
    if initial_investment <= 0.0 || !initial_investment.is_finite() {
        return Err(TrackerError::InvalidInput {
            reason: format!("initial investment must be positive, got {initial_investment}"),
        });
    }
    if history.len() < WARM_UP_BARS {
        return Err(TrackerError::too_few_points(
            &history.symbol,
            history.len(),
            WARM_UP_BARS,
        ));
    }
    if let Some(bad) = history.points().iter().find(|p| p.close <= 0.0 || p.close.is_nan()) {
        return Err(TrackerError::InsufficientData {
            subject: history.symbol.clone(),
            reason: format!("non-positive close {} at {}", bad.close, bad.timestamp),
        });
    }
    Ok(())
}

/// Walks `history` with `strategy`, holding at most one long position.
///
/// Any position still open after the last bar is sold at the final close.
/// A strategy error on a bar counts as no signal for that bar.
pub fn run_backtest(
    strategy: &dyn InvestmentStrategy,
    asset: &Asset,
    history: &PriceHistory,
    initial_investment: f64,
) -> Result<BacktestRun, TrackerError> {
    validate(history, initial_investment)?;

    let mut asset = asset.clone();
    let points = history.points();

    let start = Walk {
        state: PositionState::Flat {
            cash: initial_investment,
        },
        trades: Vec::new(),
        tally: TradeTally::default(),
    };

    let walk = (WARM_UP_BARS..points.len()).fold(start, |mut walk, i| {
        let bar = &points[i];
        let visible = history.window(i);
        asset.set_current_price(bar.close, bar.timestamp);

        match walk.state.clone() {
            PositionState::Flat { cash } => {
                match strategy.analyze_asset(&asset, visible) {
                    Ok(Some(opp)) if opp.signal == SignalType::Buy => {
                        let position = OpenPosition::open(cash, bar.close, bar.timestamp);
                        walk.trades.push(position.buy_trade(&opp.reason));
                        walk.state = PositionState::Long(position);
                    }
                    Ok(_) => {}
                    Err(e) => log::debug!("{} bar {}: analysis failed: {}", history.symbol, i, e),
                }
                walk
            }
            PositionState::Long(position) => {
                match strategy.should_sell(&asset, position.entry_price, visible) {
                    Ok(decision) if decision.sell => walk.close(&position, bar, &decision.reason),
                    Ok(_) => walk,
                    Err(e) => {
                        log::debug!("{} bar {}: sell check failed: {}", history.symbol, i, e);
                        walk
                    }
                }
            }
        }
    });

    let walk = match (walk.state.clone(), points.last()) {
        (PositionState::Long(position), Some(last)) => {
            walk.close(&position, last, END_OF_PERIOD_REASON)
        }
        _ => walk,
    };

    let final_value = match &walk.state {
        PositionState::Flat { cash } => *cash,
        PositionState::Long(position) => position.cost(),
    };

    let statistics =
        BacktestStatistics::compute(&walk.tally, initial_investment, final_value, &walk.trades);

    Ok(BacktestRun {
        trades: walk.trades,
        statistics,
    })
}

//! Backtest statistics derived from the trade ledger.

use serde::{Deserialize, Serialize};

use crate::domain::position::{Trade, TradeType};

/// Running counters updated on every closing trade.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TradeTally {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub total_profit: f64,
    pub biggest_win: f64,
    pub biggest_loss: f64,
}

impl TradeTally {
    /// Folds one closed trade's profit in. Break-even trades count as losses.
    pub fn record(mut self, profit_loss: f64) -> Self {
        self.total_trades += 1;
        if profit_loss > 0.0 {
            self.winning_trades += 1;
        } else {
            self.losing_trades += 1;
        }
        self.total_profit += profit_loss;
        self.biggest_win = self.biggest_win.max(profit_loss);
        self.biggest_loss = self.biggest_loss.min(profit_loss);
        self
    }

    pub fn win_rate(&self) -> f64 {
        if self.total_trades > 0 {
            self.winning_trades as f64 / self.total_trades as f64 * 100.0
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestStatistics {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    /// Percent, 0 to 100.
    pub win_rate: f64,
    pub total_profit: f64,
    pub biggest_win: f64,
    /// Signed, never positive.
    pub biggest_loss: f64,
    /// Percent, never negative.
    pub max_drawdown: f64,
    pub final_value: f64,
    pub profit_loss_pct: f64,
}

impl BacktestStatistics {
    pub fn compute(tally: &TradeTally, initial: f64, final_value: f64, trades: &[Trade]) -> Self {
        let profit_loss_pct = if initial > 0.0 {
            (final_value - initial) / initial * 100.0
        } else {
            0.0
        };

        BacktestStatistics {
            total_trades: tally.total_trades,
            winning_trades: tally.winning_trades,
            losing_trades: tally.losing_trades,
            win_rate: tally.win_rate(),
            total_profit: tally.total_profit,
            biggest_win: tally.biggest_win,
            biggest_loss: tally.biggest_loss,
            max_drawdown: max_drawdown(initial, trades),
            final_value,
            profit_loss_pct,
        }
    }
}

/// Equity after each ledger entry, starting with `initial`.
///
/// A buy subtracts its value and a sell adds its proceeds back, so equity
/// sits at the uninvested cash while a position is open.
pub fn equity_curve(initial: f64, trades: &[Trade]) -> Vec<f64> {
    let mut curve = Vec::with_capacity(trades.len() + 1);
    curve.push(initial);

    trades.iter().fold(initial, |equity, trade| {
        let next = match trade.trade_type {
            TradeType::Buy => equity - trade.value,
            TradeType::Sell => equity + trade.value,
        };
        curve.push(next);
        next
    });

    curve
}

/// Largest peak-to-trough decline of the ledger's equity curve, in percent.
pub fn max_drawdown(initial: f64, trades: &[Trade]) -> f64 {
    let curve = equity_curve(initial, trades);
    let mut peak = initial;
    let mut max_dd = 0.0_f64;

    for equity in curve {
        if equity > peak {
            peak = equity;
        } else if peak > 0.0 {
            let dd = (peak - equity) / peak * 100.0;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }

    max_dd
}

//! Open positions and the trade ledger entries they produce.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeType {
    Buy,
    Sell,
}

impl fmt::Display for TradeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeType::Buy => f.write_str("buy"),
            TradeType::Sell => f.write_str("sell"),
        }
    }
}

/// One ledger entry. Buys carry zero profit fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub trade_type: TradeType,
    pub price: f64,
    pub units: f64,
    pub value: f64,
    pub date: DateTime<Utc>,
    pub profit_loss: f64,
    pub profit_loss_pct: f64,
    pub days_held: i64,
    pub reason: String,
}

/// A long position held by the backtester. Fractional units are allowed.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenPosition {
    pub units: f64,
    pub entry_price: f64,
    pub entry_date: DateTime<Utc>,
}

impl OpenPosition {
    /// Spends `cash` entirely at `price`.
    pub fn open(cash: f64, price: f64, at: DateTime<Utc>) -> Self {
        OpenPosition {
            units: cash / price,
            entry_price: price,
            entry_date: at,
        }
    }

    pub fn cost(&self) -> f64 {
        self.units * self.entry_price
    }

    pub fn market_value(&self, price: f64) -> f64 {
        self.units * price
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.market_value(price) - self.cost()
    }

    /// Whole days between entry and `at`, truncated toward zero.
    pub fn days_held(&self, at: DateTime<Utc>) -> i64 {
        (at - self.entry_date).num_days()
    }

    pub fn buy_trade(&self, reason: &str) -> Trade {
        Trade {
            trade_type: TradeType::Buy,
            price: self.entry_price,
            units: self.units,
            value: self.cost(),
            date: self.entry_date,
            profit_loss: 0.0,
            profit_loss_pct: 0.0,
            days_held: 0,
            reason: reason.to_string(),
        }
    }

    /// Closes the whole position at `price`.
    pub fn sell_trade(&self, price: f64, at: DateTime<Utc>, reason: &str) -> Trade {
        let cost = self.cost();
        let profit_loss = self.unrealized_pnl(price);
        Trade {
            trade_type: TradeType::Sell,
            price,
            units: self.units,
            value: self.market_value(price),
            date: at,
            profit_loss,
            profit_loss_pct: if cost > 0.0 {
                profit_loss / cost * 100.0
            } else {
                0.0
            },
            days_held: self.days_held(at),
            reason: reason.to_string(),
        }
    }
}

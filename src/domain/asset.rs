//! Tracked assets: stocks, REITs and cryptocurrencies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    Stock,
    Reit,
    Crypto,
}

impl AssetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetType::Stock => "stock",
            AssetType::Reit => "reit",
            AssetType::Crypto => "crypto",
        }
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stock" => Ok(AssetType::Stock),
            "reit" => Ok(AssetType::Reit),
            "crypto" | "cryptocurrency" => Ok(AssetType::Crypto),
            other => Err(format!("unknown asset type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StockFundamentals {
    pub company: String,
    pub sector: String,
    /// Percent, e.g. 5.5 for 5.5 %.
    pub dividend_yield: f64,
    pub price_to_earnings: f64,
    pub market_cap: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReitFundamentals {
    pub segment: String,
    pub dividend_yield: f64,
    pub property_count: u32,
    /// Price over book value (P/VP).
    pub price_to_book: f64,
    pub last_dividend: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoFundamentals {
    pub market_cap: f64,
    pub circulating_supply: f64,
    pub max_supply: Option<f64>,
    pub all_time_high: Option<f64>,
}

/// Variant-specific attributes of an asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AssetKind {
    Stock(StockFundamentals),
    Reit(ReitFundamentals),
    Crypto(CryptoFundamentals),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub current_price: f64,
    pub previous_close: f64,
    pub change_percentage: f64,
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub favorite: bool,
    #[serde(flatten)]
    pub kind: AssetKind,
}

impl Asset {
    /// New asset whose id is `<type>-<symbol>`, previous close equal to the current price.
    pub fn new(symbol: &str, name: &str, current_price: f64, kind: AssetKind) -> Self {
        let asset_type = match &kind {
            AssetKind::Stock(_) => AssetType::Stock,
            AssetKind::Reit(_) => AssetType::Reit,
            AssetKind::Crypto(_) => AssetType::Crypto,
        };
        Asset {
            id: format!("{}-{}", asset_type, symbol),
            symbol: symbol.to_string(),
            name: name.to_string(),
            current_price,
            previous_close: current_price,
            change_percentage: 0.0,
            last_updated: Utc::now(),
            favorite: false,
            kind,
        }
    }

    pub fn asset_type(&self) -> AssetType {
        match self.kind {
            AssetKind::Stock(_) => AssetType::Stock,
            AssetKind::Reit(_) => AssetType::Reit,
            AssetKind::Crypto(_) => AssetType::Crypto,
        }
    }

    pub fn is_crypto(&self) -> bool {
        self.asset_type() == AssetType::Crypto
    }

    pub fn dividend_yield(&self) -> f64 {
        match &self.kind {
            AssetKind::Stock(s) => s.dividend_yield,
            AssetKind::Reit(r) => r.dividend_yield,
            AssetKind::Crypto(_) => 0.0,
        }
    }

    /// Moves the current price into `previous_close` and records `price` as of `at`.
    pub fn set_current_price(&mut self, price: f64, at: DateTime<Utc>) {
        self.previous_close = self.current_price;
        self.current_price = price;
        self.change_percentage = if self.previous_close > 0.0 {
            (price - self.previous_close) / self.previous_close * 100.0
        } else {
            0.0
        };
        self.last_updated = at;
    }
}

#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use invest_tracker::domain::asset::{
    Asset, AssetKind, AssetType, CryptoFundamentals, ReitFundamentals, StockFundamentals,
};
use invest_tracker::domain::error::TrackerError;
use invest_tracker::domain::opportunity::InvestmentOpportunity;
use invest_tracker::domain::price::{PriceHistory, PricePoint, Timeframe};
use invest_tracker::ports::asset_port::AssetPort;
use invest_tracker::ports::opportunity_port::{OpportunityFilter, OpportunityPort};
use invest_tracker::ports::price_history_port::PriceHistoryPort;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// In-memory implementation of every storage port, with failure switches.
#[derive(Default)]
pub struct MemoryStore {
    pub assets: Mutex<BTreeMap<String, Asset>>,
    pub prices: Mutex<HashMap<String, Vec<PricePoint>>>,
    pub opportunities: Mutex<Vec<InvestmentOpportunity>>,
    /// Asset ids whose price history read fails.
    pub failing_prices: Mutex<HashSet<String>>,
    pub fail_saves: AtomicBool,
    /// Price history reads per asset id.
    pub price_reads: Mutex<HashMap<String, usize>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_asset(self, asset: Asset, points: Vec<PricePoint>) -> Self {
        self.prices.lock().unwrap().insert(asset.id.clone(), points);
        self.assets.lock().unwrap().insert(asset.id.clone(), asset);
        self
    }

    pub fn with_failing_prices(self, asset_id: &str) -> Self {
        self.failing_prices
            .lock()
            .unwrap()
            .insert(asset_id.to_string());
        self
    }

    pub fn failing_saves(self) -> Self {
        self.fail_saves.store(true, Ordering::SeqCst);
        self
    }

    pub fn reads_of(&self, asset_id: &str) -> usize {
        self.price_reads
            .lock()
            .unwrap()
            .get(asset_id)
            .copied()
            .unwrap_or(0)
    }

    pub fn saved(&self) -> Vec<InvestmentOpportunity> {
        self.opportunities.lock().unwrap().clone()
    }
}

impl AssetPort for MemoryStore {
    fn get_asset_by_id(&self, id: &str) -> Result<Option<Asset>, TrackerError> {
        Ok(self.assets.lock().unwrap().get(id).cloned())
    }

    fn get_assets_by_type(&self, asset_type: AssetType) -> Result<Vec<Asset>, TrackerError> {
        Ok(self
            .assets
            .lock()
            .unwrap()
            .values()
            .filter(|a| a.asset_type() == asset_type)
            .cloned()
            .collect())
    }

    fn save_asset(&self, asset: &Asset) -> Result<(), TrackerError> {
        self.assets
            .lock()
            .unwrap()
            .insert(asset.id.clone(), asset.clone());
        Ok(())
    }
}

impl PriceHistoryPort for MemoryStore {
    fn get_price_history(
        &self,
        asset_id: &str,
        timeframe: Timeframe,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<PriceHistory, TrackerError> {
        *self
            .price_reads
            .lock()
            .unwrap()
            .entry(asset_id.to_string())
            .or_insert(0) += 1;

        if self.failing_prices.lock().unwrap().contains(asset_id) {
            return Err(TrackerError::persistence(format!(
                "price store unavailable for {asset_id}"
            )));
        }

        let points: Vec<PricePoint> = self
            .prices
            .lock()
            .unwrap()
            .get(asset_id)
            .map(|points| {
                points
                    .iter()
                    .filter(|p| start.is_none_or(|s| p.timestamp >= s))
                    .filter(|p| end.is_none_or(|e| p.timestamp <= e))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        let symbol = asset_id.split_once('-').map_or(asset_id, |(_, s)| s);
        Ok(PriceHistory::new(asset_id, symbol, timeframe, points))
    }
}

impl OpportunityPort for MemoryStore {
    fn save_opportunity(&self, opp: &InvestmentOpportunity) -> Result<(), TrackerError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(TrackerError::persistence("opportunity store is read-only"));
        }
        self.opportunities.lock().unwrap().push(opp.clone());
        Ok(())
    }

    fn update_opportunity(&self, opp: &InvestmentOpportunity) -> Result<(), TrackerError> {
        let mut stored = self.opportunities.lock().unwrap();
        match stored.iter_mut().find(|o| o.id == opp.id) {
            Some(existing) => {
                *existing = opp.clone();
                Ok(())
            }
            None => Err(TrackerError::not_found("opportunity", &opp.id)),
        }
    }

    fn get_opportunity(&self, id: &str) -> Result<Option<InvestmentOpportunity>, TrackerError> {
        Ok(self
            .opportunities
            .lock()
            .unwrap()
            .iter()
            .find(|o| o.id == id)
            .cloned())
    }

    fn list_opportunities(
        &self,
        filter: &OpportunityFilter,
    ) -> Result<Vec<InvestmentOpportunity>, TrackerError> {
        let mut found: Vec<_> = self
            .opportunities
            .lock()
            .unwrap()
            .iter()
            .filter(|o| filter.matches(o))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }
}

pub fn stock(symbol: &str, price: f64, price_to_earnings: f64, dividend_yield: f64) -> Asset {
    Asset::new(
        symbol,
        symbol,
        price,
        AssetKind::Stock(StockFundamentals {
            price_to_earnings,
            dividend_yield,
            ..Default::default()
        }),
    )
}

pub fn reit(symbol: &str, price: f64, price_to_book: f64, dividend_yield: f64) -> Asset {
    Asset::new(
        symbol,
        symbol,
        price,
        AssetKind::Reit(ReitFundamentals {
            price_to_book,
            dividend_yield,
            ..Default::default()
        }),
    )
}

pub fn crypto(symbol: &str, price: f64) -> Asset {
    Asset::new(
        symbol,
        symbol,
        price,
        AssetKind::Crypto(CryptoFundamentals::default()),
    )
}

/// One daily bar per close, the last one a day before `end`.
pub fn daily_bars_ending(closes: &[f64], end: DateTime<Utc>) -> Vec<PricePoint> {
    let n = closes.len() as i64;
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PricePoint {
            timestamp: end - Duration::days(n - i as i64),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1000.0,
        })
        .collect()
}

/// Daily bars ending yesterday, so they fall inside any look-back window.
pub fn recent_bars(closes: &[f64]) -> Vec<PricePoint> {
    daily_bars_ending(closes, Utc::now())
}

/// `count` closes growing by `pct` percent per bar.
pub fn compounding(start: f64, pct: f64, count: usize) -> Vec<f64> {
    (0..count)
        .map(|i| start * (1.0 + pct / 100.0).powi(i as i32))
        .collect()
}

/// Rises for `up` bars, then falls for `down` bars.
pub fn rise_then_fall(start: f64, up: usize, down: usize) -> Vec<f64> {
    let mut closes = compounding(start, 1.5, up);
    let peak = closes.last().copied().unwrap_or(start);
    closes.extend(compounding(peak, -2.0, down + 1).into_iter().skip(1));
    closes
}

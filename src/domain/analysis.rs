//! Market analysis: runs every applicable strategy over a set of assets.
//!
//! Each asset is analyzed independently on a bounded rayon pool. A failure on
//! one asset is logged and recorded as skipped; it never stops the others.
//! Opportunities are persisted as they are found, and a failed write is only
//! a warning.

use chrono::Utc;
use rayon::prelude::*;

use crate::domain::asset::{Asset, AssetType};
use crate::domain::error::TrackerError;
use crate::domain::opportunity::InvestmentOpportunity;
use crate::domain::price::{window_start, Timeframe};
use crate::domain::strategy::StrategyRegistry;
use crate::ports::asset_port::AssetPort;
use crate::ports::config_port::ConfigPort;
use crate::ports::opportunity_port::OpportunityPort;
use crate::ports::price_history_port::PriceHistoryPort;

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    /// Days of daily history fetched per asset.
    pub lookback_days: i64,
    /// Fewer points than this and the asset is skipped.
    pub min_points: usize,
    pub workers: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            lookback_days: 90,
            min_points: 10,
            workers: 4,
        }
    }
}

impl AnalysisConfig {
    /// Reads `[analysis]`, falling back to the defaults per key.
    pub fn from_config(config: &dyn ConfigPort) -> Self {
        let defaults = Self::default();
        AnalysisConfig {
            lookback_days: config.get_int("analysis", "lookback_days", defaults.lookback_days),
            min_points: config.get_usize("analysis", "min_points", defaults.min_points),
            workers: config.get_usize("analysis", "workers", defaults.workers),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedAsset {
    pub asset_id: String,
    pub symbol: String,
    pub reason: String,
}

/// Outcome of a market-wide scan. Opportunity order is not significant.
#[derive(Debug, Clone, Default)]
pub struct MarketScan {
    pub opportunities: Vec<InvestmentOpportunity>,
    pub analyzed: usize,
    pub skipped: Vec<SkippedAsset>,
}

pub struct MarketAnalyzer<'a> {
    assets: &'a dyn AssetPort,
    prices: &'a dyn PriceHistoryPort,
    opportunities: &'a dyn OpportunityPort,
    registry: &'a StrategyRegistry,
    config: AnalysisConfig,
}

impl<'a> MarketAnalyzer<'a> {
    pub fn new(
        assets: &'a dyn AssetPort,
        prices: &'a dyn PriceHistoryPort,
        opportunities: &'a dyn OpportunityPort,
        registry: &'a StrategyRegistry,
        config: AnalysisConfig,
    ) -> Self {
        Self {
            assets,
            prices,
            opportunities,
            registry,
            config,
        }
    }

    pub fn analyze_asset(&self, asset_id: &str) -> Result<Vec<InvestmentOpportunity>, TrackerError> {
        let asset = self
            .assets
            .get_asset_by_id(asset_id)?
            .ok_or_else(|| TrackerError::not_found("asset", asset_id))?;
        self.analyze_loaded(&asset)
    }

    fn analyze_loaded(&self, asset: &Asset) -> Result<Vec<InvestmentOpportunity>, TrackerError> {
        let end = Utc::now();
        let start = window_start(end, self.config.lookback_days)?;
        let history = self
            .prices
            .get_price_history(&asset.id, Timeframe::Daily, Some(start), Some(end))?;

        if history.len() < self.config.min_points {
            return Err(TrackerError::too_few_points(
                &asset.symbol,
                history.len(),
                self.config.min_points,
            ));
        }

        let mut found = Vec::new();
        for strategy in self.registry.applicable_to(asset) {
            match strategy.analyze_asset(asset, history.points()) {
                Ok(Some(opp)) => {
                    log::debug!(
                        "{} found {} opportunity on {}: {}",
                        strategy.name(),
                        opp.signal,
                        asset.symbol,
                        opp.reason
                    );
                    found.push(opp);
                }
                Ok(None) => {}
                Err(e) => log::warn!("{} failed on {}: {}", strategy.name(), asset.symbol, e),
            }
        }

        for opp in &found {
            if let Err(e) = self.opportunities.save_opportunity(opp) {
                log::warn!("failed to save opportunity {} for {}: {}", opp.id, asset.symbol, e);
            }
        }

        Ok(found)
    }

    /// Analyzes every asset of `asset_type`, each exactly once.
    pub fn analyze_market(&self, asset_type: AssetType) -> Result<MarketScan, TrackerError> {
        let assets = self.assets.get_assets_by_type(asset_type)?;
        if assets.is_empty() {
            return Err(TrackerError::not_found("assets of type", asset_type.as_str()));
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.workers.max(1))
            .build()
            .map_err(|e| TrackerError::InvalidInput {
                reason: format!("cannot start {} analysis workers: {}", self.config.workers, e),
            })?;

        log::info!(
            "analyzing {} {} assets on {} workers",
            assets.len(),
            asset_type,
            self.config.workers.max(1)
        );

        let outcomes: Vec<(&Asset, Result<Vec<InvestmentOpportunity>, TrackerError>)> =
            pool.install(|| {
                assets
                    .par_iter()
                    .map(|asset| (asset, self.analyze_loaded(asset)))
                    .collect()
            });

        let mut scan = MarketScan::default();
        for (asset, outcome) in outcomes {
            match outcome {
                Ok(found) => {
                    scan.analyzed += 1;
                    scan.opportunities.extend(found);
                }
                Err(e) => {
                    if e.is_recoverable() {
                        log::info!("skipping {}: {}", asset.symbol, e);
                    } else {
                        log::warn!("skipping {}: {}", asset.symbol, e);
                    }
                    scan.skipped.push(SkippedAsset {
                        asset_id: asset.id.clone(),
                        symbol: asset.symbol.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        log::info!(
            "{} assets analyzed, {} skipped, {} opportunities",
            scan.analyzed,
            scan.skipped.len(),
            scan.opportunities.len()
        );
        Ok(scan)
    }

    pub fn analyze_market_opportunities(
        &self,
        asset_type: AssetType,
    ) -> Result<Vec<InvestmentOpportunity>, TrackerError> {
        Ok(self.analyze_market(asset_type)?.opportunities)
    }
}

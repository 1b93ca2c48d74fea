//! Investment strategies.
//!
//! A strategy scores an asset's price history, emits buy signals as
//! [`InvestmentOpportunity`] records, decides when an open position should be
//! sold, and supplies the scenario set used for forward simulation. Which
//! strategies apply to an asset is answered by [`InvestmentStrategy::is_asset_suitable`]
//! alone; callers never inspect asset types themselves.

pub mod momentum;
pub mod value;

pub use momentum::MomentumStrategy;
pub use value::ValueStrategy;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::domain::asset::Asset;
use crate::domain::error::TrackerError;
use crate::domain::opportunity::{InvestmentOpportunity, SignalType};
use crate::domain::price::PricePoint;

/// Minimum number of price points a strategy needs to analyze an asset.
pub const MIN_ANALYSIS_POINTS: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyType {
    Momentum,
    Value,
}

impl StrategyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyType::Momentum => "momentum",
            StrategyType::Value => "value",
        }
    }
}

impl fmt::Display for StrategyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyType {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "momentum" => Ok(StrategyType::Momentum),
            "value" => Ok(StrategyType::Value),
            other => Err(TrackerError::UnknownStrategy(other.to_string())),
        }
    }
}

/// Parses a comma separated strategy list, e.g. `momentum,value`.
pub fn parse_strategy_list(input: &str) -> Result<Vec<StrategyType>, TrackerError> {
    let mut types = Vec::new();
    for token in input.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let t: StrategyType = token.parse()?;
        if !types.contains(&t) {
            types.push(t);
        }
    }
    Ok(types)
}

/// Outcome of a sell check on an open position.
#[derive(Debug, Clone, PartialEq)]
pub struct SellDecision {
    pub sell: bool,
    pub signal: SignalType,
    pub reason: String,
}

impl SellDecision {
    pub fn sell(reason: &str) -> Self {
        SellDecision {
            sell: true,
            signal: SignalType::Sell,
            reason: reason.to_string(),
        }
    }

    pub fn hold(reason: &str) -> Self {
        SellDecision {
            sell: false,
            signal: SignalType::Hold,
            reason: reason.to_string(),
        }
    }
}

/// Scenario percentages and horizon used by the forward simulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationParameters {
    pub scenarios: Vec<f64>,
    pub time_horizon_days: u32,
}

pub trait InvestmentStrategy: Send + Sync {
    fn strategy_type(&self) -> StrategyType;

    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn is_asset_suitable(&self, asset: &Asset) -> bool;

    /// Returns `Ok(None)` when there is nothing to act on, including when the
    /// history is shorter than [`MIN_ANALYSIS_POINTS`].
    fn analyze_asset(
        &self,
        asset: &Asset,
        points: &[PricePoint],
    ) -> Result<Option<InvestmentOpportunity>, TrackerError>;

    /// Uses `asset.current_price` as the price the position would be sold at.
    fn should_sell(
        &self,
        asset: &Asset,
        entry_price: f64,
        points: &[PricePoint],
    ) -> Result<SellDecision, TrackerError>;

    fn simulation_parameters(&self, asset: &Asset) -> SimulationParameters;
}

pub(crate) fn ensure_suitable(
    strategy: &dyn InvestmentStrategy,
    asset: &Asset,
) -> Result<(), TrackerError> {
    if strategy.is_asset_suitable(asset) {
        Ok(())
    } else {
        Err(TrackerError::UnsuitableAsset {
            strategy: strategy.strategy_type().to_string(),
            asset: asset.symbol.clone(),
        })
    }
}

pub(crate) fn ensure_entry_price(asset: &Asset, entry_price: f64) -> Result<(), TrackerError> {
    if entry_price > 0.0 && entry_price.is_finite() {
        Ok(())
    } else {
        Err(TrackerError::InsufficientData {
            subject: asset.symbol.clone(),
            reason: format!("entry price must be positive, got {entry_price}"),
        })
    }
}

pub fn create_strategy(strategy_type: StrategyType) -> Box<dyn InvestmentStrategy> {
    match strategy_type {
        StrategyType::Momentum => Box::new(MomentumStrategy::new()),
        StrategyType::Value => Box::new(ValueStrategy::new()),
    }
}

/// The set of strategies available to the analyzer and simulator.
pub struct StrategyRegistry {
    strategies: BTreeMap<StrategyType, Box<dyn InvestmentStrategy>>,
}

impl StrategyRegistry {
    pub fn empty() -> Self {
        Self {
            strategies: BTreeMap::new(),
        }
    }

    /// Registry holding every built-in strategy.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(create_strategy(StrategyType::Value));
        registry.register(create_strategy(StrategyType::Momentum));
        registry
    }

    pub fn register(&mut self, strategy: Box<dyn InvestmentStrategy>) {
        log::debug!(
            "registered strategy {} ({})",
            strategy.strategy_type(),
            strategy.name()
        );
        self.strategies.insert(strategy.strategy_type(), strategy);
    }

    pub fn get(&self, strategy_type: StrategyType) -> Result<&dyn InvestmentStrategy, TrackerError> {
        self.strategies
            .get(&strategy_type)
            .map(|s| s.as_ref())
            .ok_or_else(|| TrackerError::UnknownStrategy(strategy_type.to_string()))
    }

    /// Strategies whose suitability check accepts `asset`, in type order.
    pub fn applicable_to<'a>(
        &'a self,
        asset: &'a Asset,
    ) -> impl Iterator<Item = &'a dyn InvestmentStrategy> + 'a {
        self.strategies
            .values()
            .map(|s| s.as_ref())
            .filter(move |s| s.is_asset_suitable(asset))
    }

    pub fn types(&self) -> Vec<StrategyType> {
        self.strategies.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

//! Momentum strategy: buys assets whose price and volume are accelerating.
//!
//! Four boolean signals are summed into a score:
//! - 14-point performance above 5%
//! - 90-point performance above 15%
//! - volume of the last 14 bars rising against the 14 before them
//! - latest close within 10% of the all-time high
//!
//! A score of 2 or more is a buy.

use crate::domain::asset::Asset;
use crate::domain::error::TrackerError;
use crate::domain::indicator::{
    near_all_time_high, recent_performance, rising_volume, simple_moving_average, volatility,
};
use crate::domain::opportunity::{InvestmentOpportunity, RiskLevel, SignalType};
use crate::domain::price::PricePoint;
use crate::domain::strategy::{
    ensure_entry_price, ensure_suitable, InvestmentStrategy, SellDecision, SimulationParameters,
    StrategyType, MIN_ANALYSIS_POINTS,
};

const SHORT_TERM_DAYS: usize = 14;
const LONG_TERM_DAYS: usize = 90;
const VOLATILITY_DAYS: usize = 30;
const VOLUME_DAYS: usize = 14;

const SHORT_TERM_THRESHOLD: f64 = 5.0;
const LONG_TERM_THRESHOLD: f64 = 15.0;
const HIGH_VOLATILITY: f64 = 3.0;
const BUY_SCORE: u8 = 2;
const MIN_POTENTIAL_RETURN: f64 = 10.0;

const SELL_MIN_POINTS: usize = 14;
const TARGET_GAIN: f64 = 20.0;
const REVERSAL_DAYS: usize = 7;
const REVERSAL_DROP: f64 = -5.0;
const SELL_SMA_PERIOD: usize = 14;

const SCENARIOS: [f64; 7] = [-25.0, -15.0, -5.0, 5.0, 15.0, 25.0, 35.0];
const CRYPTO_HORIZON_DAYS: u32 = 30;
const DEFAULT_HORIZON_DAYS: u32 = 90;

/// Indicator readings behind a momentum decision.
#[derive(Debug, Clone, PartialEq)]
pub struct MomentumScore {
    pub short_term: f64,
    pub long_term: f64,
    pub volatility: f64,
    pub rising_volume: bool,
    pub near_high: bool,
}

impl MomentumScore {
    pub fn from_points(points: &[PricePoint]) -> Self {
        MomentumScore {
            short_term: recent_performance(points, SHORT_TERM_DAYS),
            long_term: recent_performance(points, LONG_TERM_DAYS),
            volatility: volatility(points, VOLATILITY_DAYS),
            rising_volume: rising_volume(points, VOLUME_DAYS),
            near_high: near_all_time_high(points),
        }
    }

    pub fn score(&self) -> u8 {
        u8::from(self.short_term > SHORT_TERM_THRESHOLD)
            + u8::from(self.long_term > LONG_TERM_THRESHOLD)
            + u8::from(self.rising_volume)
            + u8::from(self.near_high)
    }

    /// Human readable description of every signal that scored.
    pub fn signals(&self) -> Vec<String> {
        let mut signals = Vec::new();
        if self.short_term > SHORT_TERM_THRESHOLD {
            signals.push(format!("short-term gain of {:.1}%", self.short_term));
        }
        if self.long_term > LONG_TERM_THRESHOLD {
            signals.push(format!("long-term gain of {:.1}%", self.long_term));
        }
        if self.rising_volume {
            signals.push("rising volume".to_string());
        }
        if self.near_high {
            signals.push("near all-time high".to_string());
        }
        signals
    }

    pub fn potential_return(&self) -> f64 {
        (self.short_term * 1.5).max(MIN_POTENTIAL_RETURN)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MomentumStrategy;

impl MomentumStrategy {
    pub fn new() -> Self {
        MomentumStrategy
    }
}

impl InvestmentStrategy for MomentumStrategy {
    fn strategy_type(&self) -> StrategyType {
        StrategyType::Momentum
    }

    fn name(&self) -> &'static str {
        "Momentum"
    }

    fn description(&self) -> &'static str {
        "Buys assets with strong recent performance, rising volume and prices near their highs"
    }

    fn is_asset_suitable(&self, _asset: &Asset) -> bool {
        true
    }

    fn analyze_asset(
        &self,
        asset: &Asset,
        points: &[PricePoint],
    ) -> Result<Option<InvestmentOpportunity>, TrackerError> {
        ensure_suitable(self, asset)?;
        if points.len() < MIN_ANALYSIS_POINTS {
            return Ok(None);
        }

        let reading = MomentumScore::from_points(points);
        if reading.score() < BUY_SCORE {
            return Ok(None);
        }

        let risk = if asset.is_crypto() || reading.volatility > HIGH_VOLATILITY {
            RiskLevel::High
        } else {
            RiskLevel::Medium
        };

        Ok(Some(InvestmentOpportunity::new(
            asset,
            SignalType::Buy,
            format!("Momentum opportunity: {}", reading.signals().join(", ")),
            reading.potential_return(),
            risk,
            StrategyType::Momentum,
        )))
    }

    fn should_sell(
        &self,
        asset: &Asset,
        entry_price: f64,
        points: &[PricePoint],
    ) -> Result<SellDecision, TrackerError> {
        ensure_entry_price(asset, entry_price)?;
        if points.len() < SELL_MIN_POINTS {
            return Ok(SellDecision::hold("insufficient data"));
        }

        let current = asset.current_price;
        let gain = (current - entry_price) / entry_price * 100.0;
        if gain > TARGET_GAIN {
            return Ok(SellDecision::sell("target reached"));
        }

        if recent_performance(points, REVERSAL_DAYS) < REVERSAL_DROP {
            return Ok(SellDecision::sell("momentum reversing"));
        }

        let sma = simple_moving_average(points, SELL_SMA_PERIOD)?;
        if sma.last().is_some_and(|&avg| current < avg) {
            return Ok(SellDecision::sell("below moving average"));
        }

        Ok(SellDecision::hold("momentum intact"))
    }

    fn simulation_parameters(&self, asset: &Asset) -> SimulationParameters {
        SimulationParameters {
            scenarios: SCENARIOS.to_vec(),
            time_horizon_days: if asset.is_crypto() {
                CRYPTO_HORIZON_DAYS
            } else {
                DEFAULT_HORIZON_DAYS
            },
        }
    }
}

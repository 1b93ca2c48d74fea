//! Value strategy for stocks and REITs.
//!
//! Scores an asset on its fundamentals plus one price check:
//! - stocks: P/E in (0, 15], dividend yield of at least 4%
//! - REITs: P/VP below 1.0, dividend yield of at least 6%
//! - any: latest close under the 30-bar exponential moving average
//!
//! Two points or more is a buy.

use crate::domain::asset::{Asset, AssetKind};
use crate::domain::error::TrackerError;
use crate::domain::indicator::exponential_moving_average;
use crate::domain::opportunity::{InvestmentOpportunity, RiskLevel, SignalType};
use crate::domain::price::PricePoint;
use crate::domain::strategy::{
    ensure_entry_price, ensure_suitable, InvestmentStrategy, SellDecision, SimulationParameters,
    StrategyType, MIN_ANALYSIS_POINTS,
};

const AVERAGE_PERIOD: usize = 30;
const BUY_SCORE: u8 = 2;
const MIN_POTENTIAL_RETURN: f64 = 8.0;

const MAX_CHEAP_PE: f64 = 15.0;
const STOCK_MIN_YIELD: f64 = 4.0;
const MAX_CHEAP_PVP: f64 = 1.0;
const REIT_MIN_YIELD: f64 = 6.0;
const LOW_RISK_YIELD: f64 = 6.0;

const TARGET_GAIN: f64 = 30.0;
const STOP_LOSS: f64 = -15.0;
const OVERVALUED_PE: f64 = 25.0;
const OVERVALUED_PVP: f64 = 1.3;

const SCENARIOS: [f64; 9] = [-20.0, -10.0, -5.0, 0.0, 5.0, 10.0, 15.0, 20.0, 30.0];
const HORIZON_DAYS: u32 = 1080;

#[derive(Debug, Clone, Copy, Default)]
pub struct ValueStrategy;

impl ValueStrategy {
    pub fn new() -> Self {
        ValueStrategy
    }

    fn fundamental_signals(asset: &Asset) -> Vec<String> {
        let mut signals = Vec::new();
        match &asset.kind {
            AssetKind::Stock(s) => {
                if s.price_to_earnings > 0.0 && s.price_to_earnings <= MAX_CHEAP_PE {
                    signals.push(format!("low P/E of {:.1}", s.price_to_earnings));
                }
                if s.dividend_yield >= STOCK_MIN_YIELD {
                    signals.push(format!("dividend yield of {:.1}%", s.dividend_yield));
                }
            }
            AssetKind::Reit(r) => {
                if r.price_to_book > 0.0 && r.price_to_book < MAX_CHEAP_PVP {
                    signals.push(format!("trading below book value (P/VP {:.2})", r.price_to_book));
                }
                if r.dividend_yield >= REIT_MIN_YIELD {
                    signals.push(format!("dividend yield of {:.1}%", r.dividend_yield));
                }
            }
            AssetKind::Crypto(_) => {}
        }
        signals
    }

    fn overvalued(asset: &Asset) -> bool {
        match &asset.kind {
            AssetKind::Stock(s) => s.price_to_earnings > OVERVALUED_PE,
            AssetKind::Reit(r) => r.price_to_book > OVERVALUED_PVP,
            AssetKind::Crypto(_) => false,
        }
    }
}

impl InvestmentStrategy for ValueStrategy {
    fn strategy_type(&self) -> StrategyType {
        StrategyType::Value
    }

    fn name(&self) -> &'static str {
        "Value"
    }

    fn description(&self) -> &'static str {
        "Buys undervalued stocks and REITs with solid dividends and holds them for the long term"
    }

    fn is_asset_suitable(&self, asset: &Asset) -> bool {
        matches!(asset.kind, AssetKind::Stock(_) | AssetKind::Reit(_))
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

        let mut signals = Self::fundamental_signals(asset);

        let ema = exponential_moving_average(points, AVERAGE_PERIOD)?;
        let average = ema.last().copied().unwrap_or_default();
        let close = points[points.len() - 1].close;
        let discount = if average > 0.0 {
            (average - close) / average * 100.0
        } else {
            0.0
        };
        if discount > 0.0 {
            signals.push("price below 30-day average".to_string());
        }

        if signals.len() < usize::from(BUY_SCORE) {
            return Ok(None);
        }

        let dividend_yield = asset.dividend_yield();
        let risk = if matches!(asset.kind, AssetKind::Reit(_)) || dividend_yield >= LOW_RISK_YIELD {
            RiskLevel::Low
        } else {
            RiskLevel::Medium
        };

        Ok(Some(InvestmentOpportunity::new(
            asset,
            SignalType::Buy,
            format!("Value opportunity: {}", signals.join(", ")),
            (discount + dividend_yield).max(MIN_POTENTIAL_RETURN),
            risk,
            StrategyType::Value,
        )))
    }

    fn should_sell(
        &self,
        asset: &Asset,
        entry_price: f64,
        _points: &[PricePoint],
    ) -> Result<SellDecision, TrackerError> {
        ensure_entry_price(asset, entry_price)?;

        let change = (asset.current_price - entry_price) / entry_price * 100.0;
        if change > TARGET_GAIN {
            return Ok(SellDecision::sell("target reached"));
        }
        if Self::overvalued(asset) {
            return Ok(SellDecision::sell("fundamentals overvalued"));
        }
        if change < STOP_LOSS {
            return Ok(SellDecision::sell("stop loss"));
        }

        Ok(SellDecision::hold("still reasonably valued"))
    }

    fn simulation_parameters(&self, _asset: &Asset) -> SimulationParameters {
        SimulationParameters {
            scenarios: SCENARIOS.to_vec(),
            time_horizon_days: HORIZON_DAYS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::asset::{CryptoFundamentals, ReitFundamentals, StockFundamentals};
    use crate::domain::indicator::bars_from_closes;

    fn stock(price: f64, pe: f64, dividend_yield: f64) -> Asset {
        Asset::new(
            "ITSA4",
            "Itausa",
            price,
            AssetKind::Stock(StockFundamentals {
                price_to_earnings: pe,
                dividend_yield,
                ..Default::default()
            }),
        )
    }

    fn reit(price: f64, pvp: f64, dividend_yield: f64) -> Asset {
        Asset::new(
            "HGLG11",
            "CSHG Logistica",
            price,
            AssetKind::Reit(ReitFundamentals {
                price_to_book: pvp,
                dividend_yield,
                ..Default::default()
            }),
        )
    }

    fn dipping_bars() -> Vec<PricePoint> {
        let mut closes = vec![100.0; 39];
        closes.push(90.0);
        bars_from_closes(&closes)
    }

    #[test]
    fn only_stocks_and_reits_are_suitable() {
        assert!(ValueStrategy.is_asset_suitable(&stock(10.0, 8.0, 5.0)));
        assert!(ValueStrategy.is_asset_suitable(&reit(10.0, 0.9, 8.0)));
        let btc = Asset::new("BTC", "Bitcoin", 1.0, AssetKind::Crypto(CryptoFundamentals::default()));
        assert!(!ValueStrategy.is_asset_suitable(&btc));
        let err = ValueStrategy
            .analyze_asset(&btc, &bars_from_closes(&[1.0; 40]))
            .unwrap_err();
        assert!(matches!(err, TrackerError::UnsuitableAsset { .. }));
    }

    #[test]
    fn cheap_stock_with_dividends_is_a_buy() {
        let asset = stock(100.0, 8.0, 5.0);
        let opp = ValueStrategy
            .analyze_asset(&asset, &bars_from_closes(&[100.0; 40]))
            .unwrap()
            .expect("two fundamental points");
        assert_eq!(opp.signal, SignalType::Buy);
        assert_eq!(opp.risk_level, RiskLevel::Medium);
        // No discount: 0 + 5 yield, floored at 8.
        assert_eq!(opp.potential_return, 8.0);
        assert!(opp.reason.contains("low P/E"));
    }

    #[test]
    fn discount_adds_to_return() {
        let asset = reit(90.0, 0.85, 9.0);
        let bars = dipping_bars();
        let opp = ValueStrategy.analyze_asset(&asset, &bars).unwrap().unwrap();
        // Seeded at 100, one step towards 90.
        let average = 100.0 - 10.0 * 2.0 / 31.0;
        let discount = (average - 90.0) / average * 100.0;
        assert!((opp.potential_return - (discount + 9.0)).abs() < 1e-9);
        assert_eq!(opp.risk_level, RiskLevel::Low);
        assert!(opp.reason.contains("below book value"));
        assert!(opp.reason.contains("price below 30-day average"));
    }

    #[test]
    fn single_point_is_not_enough() {
        let asset = stock(100.0, 30.0, 5.0);
        let result = ValueStrategy
            .analyze_asset(&asset, &bars_from_closes(&[100.0; 40]))
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn price_dip_counts_as_a_point() {
        let asset = stock(90.0, 40.0, 4.5);
        assert!(ValueStrategy.analyze_asset(&asset, &dipping_bars()).unwrap().is_some());
    }

    #[test]
    fn short_history_is_no_opportunity() {
        let asset = stock(100.0, 8.0, 5.0);
        let result = ValueStrategy
            .analyze_asset(&asset, &bars_from_closes(&[100.0; 29]))
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn high_yield_stock_is_low_risk() {
        let asset = stock(100.0, 8.0, 7.0);
        let opp = ValueStrategy
            .analyze_asset(&asset, &bars_from_closes(&[100.0; 40]))
            .unwrap()
            .unwrap();
        assert_eq!(opp.risk_level, RiskLevel::Low);
    }

    #[test]
    fn sell_rules_in_order() {
        let bars = bars_from_closes(&[100.0; 40]);

        // Target wins over overvaluation.
        let d = ValueStrategy.should_sell(&stock(140.0, 30.0, 0.0), 100.0, &bars).unwrap();
        assert_eq!(d.reason, "target reached");

        let d = ValueStrategy.should_sell(&stock(110.0, 30.0, 0.0), 100.0, &bars).unwrap();
        assert_eq!(d.reason, "fundamentals overvalued");

        let d = ValueStrategy.should_sell(&reit(80.0, 1.0, 8.0), 100.0, &bars).unwrap();
        assert!(d.sell);
        assert_eq!(d.reason, "stop loss");

        let d = ValueStrategy.should_sell(&reit(105.0, 1.0, 8.0), 100.0, &bars).unwrap();
        assert!(!d.sell);
        assert_eq!(d.reason, "still reasonably valued");
    }

    #[test]
    fn overvalued_reit() {
        let d = ValueStrategy
            .should_sell(&reit(100.0, 1.5, 8.0), 100.0, &[])
            .unwrap();
        assert!(d.sell);
        assert_eq!(d.reason, "fundamentals overvalued");
    }

    #[test]
    fn negative_entry_is_rejected() {
        assert!(ValueStrategy.should_sell(&stock(1.0, 1.0, 1.0), -1.0, &[]).is_err());
    }

    #[test]
    fn long_horizon_parameters() {
        let params = ValueStrategy.simulation_parameters(&stock(1.0, 1.0, 1.0));
        assert_eq!(params.time_horizon_days, 1080);
        assert_eq!(params.scenarios.len(), 9);
        assert_eq!(params.scenarios[3], 0.0);
    }
}

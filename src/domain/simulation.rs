//! Forward scenario simulation.
//!
//! Projects an investment through a list of percentage price moves:
//!
//! ```text
//! final_price    = entry * (1 + p / 100)
//! final_amount   = initial / entry * final_price
//! years          = max(horizon / 365, 1 / 365)
//! annualized_roi = (final_amount / initial) ^ (1 / years) - 1
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::asset::Asset;
use crate::domain::error::TrackerError;
use crate::domain::strategy::{SimulationParameters, StrategyType};

const DAYS_PER_YEAR: f64 = 365.0;
const TARGET_FACTOR: f64 = 1.2;
const STOP_LOSS_FACTOR: f64 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimulationStatus {
    Pending,
    Running,
    Complete,
    Failed,
}

impl fmt::Display for SimulationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SimulationStatus::Pending => "pending",
            SimulationStatus::Running => "running",
            SimulationStatus::Complete => "complete",
            SimulationStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub scenario_change: f64,
    pub final_amount: f64,
    pub final_price: f64,
    pub profit_loss: f64,
    pub profit_loss_pct: f64,
    /// Fraction, e.g. 0.15 for 15% a year.
    pub annualized_roi: f64,
}

/// One result per scenario, in input order.
pub fn project_scenarios(
    initial_amount: f64,
    entry_price: f64,
    scenarios: &[f64],
    horizon_days: u32,
) -> Result<Vec<SimulationResult>, TrackerError> {
    if entry_price <= 0.0 || !entry_price.is_finite() {
        return Err(TrackerError::InsufficientData {
            subject: "simulation".to_string(),
            reason: format!("entry price must be positive, got {entry_price}"),
        });
    }
    if initial_amount <= 0.0 || !initial_amount.is_finite() {
        return Err(TrackerError::InvalidInput {
            reason: format!("initial amount must be positive, got {initial_amount}"),
        });
    }
    if let Some(bad) = scenarios.iter().find(|&&p| p < -100.0 || !p.is_finite()) {
        return Err(TrackerError::InvalidInput {
            reason: format!("scenario {bad}% would leave a negative price"),
        });
    }

    let years = (f64::from(horizon_days) / DAYS_PER_YEAR).max(1.0 / DAYS_PER_YEAR);
    let units = initial_amount / entry_price;

    Ok(scenarios
        .iter()
        .map(|&change| {
            let final_price = entry_price * (1.0 + change / 100.0);
            let final_amount = units * final_price;
            let profit_loss = final_amount - initial_amount;
            SimulationResult {
                scenario_change: change,
                final_amount,
                final_price,
                profit_loss,
                profit_loss_pct: profit_loss / initial_amount * 100.0,
                annualized_roi: (final_amount / initial_amount).powf(1.0 / years) - 1.0,
            }
        })
        .collect())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Simulation {
    pub id: String,
    pub name: String,
    pub asset_id: String,
    pub symbol: String,
    pub strategy: StrategyType,
    pub initial_amount: f64,
    pub entry_price: f64,
    pub target_price: f64,
    pub stop_loss: Option<f64>,
    pub time_horizon_days: u32,
    pub scenarios: Vec<f64>,
    pub results: Vec<SimulationResult>,
    pub status: SimulationStatus,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Simulation {
    /// Pending simulation entered at the asset's current price, with a 20%
    /// target and a 10% stop loss.
    pub fn new(
        name: String,
        asset: &Asset,
        strategy: StrategyType,
        initial_amount: f64,
        params: SimulationParameters,
    ) -> Self {
        let entry_price = asset.current_price;
        Simulation {
            id: format!("sim-{}", uuid::Uuid::new_v4()),
            name,
            asset_id: asset.id.clone(),
            symbol: asset.symbol.clone(),
            strategy,
            initial_amount,
            entry_price,
            target_price: entry_price * TARGET_FACTOR,
            stop_loss: Some(entry_price * STOP_LOSS_FACTOR),
            time_horizon_days: params.time_horizon_days,
            scenarios: params.scenarios,
            results: Vec::new(),
            status: SimulationStatus::Pending,
            error_message: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    fn transition(&mut self, from: SimulationStatus, to: SimulationStatus) -> Result<(), TrackerError> {
        if self.status != from {
            return Err(TrackerError::InvalidTransition {
                entity: format!("simulation {}", self.id),
                from: self.status.to_string(),
                to: to.to_string(),
            });
        }
        self.status = to;
        Ok(())
    }

    pub fn start(&mut self) -> Result<(), TrackerError> {
        self.transition(SimulationStatus::Pending, SimulationStatus::Running)
    }

    /// Projects every scenario and completes. A projection error leaves the
    /// simulation running for the caller to fail.
    pub fn run(&mut self) -> Result<(), TrackerError> {
        let results = project_scenarios(
            self.initial_amount,
            self.entry_price,
            &self.scenarios,
            self.time_horizon_days,
        )?;
        self.complete(results)
    }

    pub fn complete(&mut self, results: Vec<SimulationResult>) -> Result<(), TrackerError> {
        self.transition(SimulationStatus::Running, SimulationStatus::Complete)?;
        self.results = results;
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), TrackerError> {
        self.transition(SimulationStatus::Running, SimulationStatus::Failed)?;
        self.error_message = Some(message.into());
        self.completed_at = Some(Utc::now());
        Ok(())
    }
}

//! Core domain types and logic.

pub mod asset;
pub mod price;
pub mod indicator;
pub mod strategy;
pub mod opportunity;
pub mod opportunities;
pub mod analysis;
pub mod position;
pub mod metrics;
pub mod backtest;
pub mod simulation;
pub mod simulator;
pub mod config_validation;
pub mod error;

//! Investment opportunities and their expiry lifecycle.
//!
//! An opportunity starts `Active` and ends either `Expired` (its deadline
//! passed) or `Closed` (explicitly withdrawn). Both end states are terminal.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::asset::Asset;
use crate::domain::error::TrackerError;
use crate::domain::strategy::StrategyType;

pub const DEFAULT_LIFETIME_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalType {
    Buy,
    Sell,
    Hold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpportunityStatus {
    Active,
    Expired,
    Closed,
}

macro_rules! text_enum {
    ($ty:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($text => Ok($ty::$variant),)+
                    other => Err(format!("unknown {}: {}", stringify!($ty), other)),
                }
            }
        }
    };
}

text_enum!(SignalType { Buy => "buy", Sell => "sell", Hold => "hold" });
text_enum!(RiskLevel { Low => "low", Medium => "medium", High => "high" });
text_enum!(OpportunityStatus { Active => "active", Expired => "expired", Closed => "closed" });

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentOpportunity {
    pub id: String,
    pub asset_id: String,
    pub symbol: String,
    pub signal: SignalType,
    pub reason: String,
    /// Percent.
    pub potential_return: f64,
    pub risk_level: RiskLevel,
    pub strategy: StrategyType,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub status: OpportunityStatus,
}

impl InvestmentOpportunity {
    /// New active opportunity created now, expiring after [`DEFAULT_LIFETIME_DAYS`].
    pub fn new(
        asset: &Asset,
        signal: SignalType,
        reason: String,
        potential_return: f64,
        risk_level: RiskLevel,
        strategy: StrategyType,
    ) -> Self {
        let created_at = Utc::now();
        InvestmentOpportunity {
            id: format!("opp-{}", uuid::Uuid::new_v4()),
            asset_id: asset.id.clone(),
            symbol: asset.symbol.clone(),
            signal,
            reason,
            potential_return,
            risk_level,
            strategy,
            created_at,
            expires_at: created_at + Duration::days(DEFAULT_LIFETIME_DAYS),
            status: OpportunityStatus::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == OpportunityStatus::Active
    }

    /// Pure check: already marked, or active with a lapsed deadline.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.status {
            OpportunityStatus::Expired => true,
            OpportunityStatus::Active => now > self.expires_at,
            OpportunityStatus::Closed => false,
        }
    }

    /// Marks a lapsed active opportunity as expired. Returns true when the
    /// status changed and the record needs writing back.
    pub fn refresh_expiry(&mut self, now: DateTime<Utc>) -> bool {
        if self.is_active() && self.is_expired_at(now) {
            self.status = OpportunityStatus::Expired;
            return true;
        }
        false
    }

    pub fn close(&mut self, now: DateTime<Utc>) -> Result<(), TrackerError> {
        self.refresh_expiry(now);
        if self.status != OpportunityStatus::Active {
            return Err(TrackerError::InvalidTransition {
                entity: format!("opportunity {}", self.id),
                from: self.status.to_string(),
                to: OpportunityStatus::Closed.to_string(),
            });
        }
        self.status = OpportunityStatus::Closed;
        Ok(())
    }
}

//! Opportunity storage port.

use crate::domain::error::TrackerError;
use crate::domain::opportunity::{InvestmentOpportunity, OpportunityStatus};
use crate::domain::strategy::StrategyType;

/// Selection applied by [`OpportunityPort::list_opportunities`].
///
/// `active_only` is matched against the stored status; lapsed records are
/// expired by the caller afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OpportunityFilter {
    pub active_only: bool,
    pub asset_id: Option<String>,
    pub strategy: Option<StrategyType>,
}

impl OpportunityFilter {
    pub fn active() -> Self {
        OpportunityFilter {
            active_only: true,
            ..Default::default()
        }
    }

    pub fn matches(&self, opp: &InvestmentOpportunity) -> bool {
        (!self.active_only || opp.status == OpportunityStatus::Active)
            && self.asset_id.as_deref().is_none_or(|id| opp.asset_id == id)
            && self.strategy.is_none_or(|s| opp.strategy == s)
    }
}

pub trait OpportunityPort: Send + Sync {
    fn save_opportunity(&self, opp: &InvestmentOpportunity) -> Result<(), TrackerError>;

    /// Fails with `NotFound` when the id was never saved.
    fn update_opportunity(&self, opp: &InvestmentOpportunity) -> Result<(), TrackerError>;

    fn get_opportunity(&self, id: &str) -> Result<Option<InvestmentOpportunity>, TrackerError>;

    /// Newest first.
    fn list_opportunities(
        &self,
        filter: &OpportunityFilter,
    ) -> Result<Vec<InvestmentOpportunity>, TrackerError>;
}

//! Reading and closing stored opportunities.
//!
//! Expiry is computed from timestamps on every read. A lapsed record is
//! returned already marked expired; writing that mark back is best effort and
//! a failed write is only logged.

use chrono::{DateTime, Utc};

use crate::domain::error::TrackerError;
use crate::domain::opportunity::InvestmentOpportunity;
use crate::ports::opportunity_port::{OpportunityFilter, OpportunityPort};

fn expire_lazily(port: &dyn OpportunityPort, opp: &mut InvestmentOpportunity, now: DateTime<Utc>) {
    if opp.refresh_expiry(now) {
        log::debug!("opportunity {} expired at {}", opp.id, opp.expires_at);
        if let Err(e) = port.update_opportunity(opp) {
            log::warn!("failed to persist expiry of opportunity {}: {}", opp.id, e);
        }
    }
}

pub fn get_opportunity(
    port: &dyn OpportunityPort,
    id: &str,
    now: DateTime<Utc>,
) -> Result<InvestmentOpportunity, TrackerError> {
    let mut opp = port
        .get_opportunity(id)?
        .ok_or_else(|| TrackerError::not_found("opportunity", id))?;
    expire_lazily(port, &mut opp, now);
    Ok(opp)
}

/// Stored records matching `filter`. With `active_only`, records that lapse
/// during this read are dropped from the result.
pub fn list_opportunities(
    port: &dyn OpportunityPort,
    filter: &OpportunityFilter,
    now: DateTime<Utc>,
) -> Result<Vec<InvestmentOpportunity>, TrackerError> {
    let mut opps = port.list_opportunities(filter)?;
    for opp in &mut opps {
        expire_lazily(port, opp, now);
    }
    if filter.active_only {
        opps.retain(InvestmentOpportunity::is_active);
    }
    Ok(opps)
}

/// Closes an active opportunity and persists it. Unlike the expiry mark, this
/// write is required.
pub fn close_opportunity(
    port: &dyn OpportunityPort,
    id: &str,
    now: DateTime<Utc>,
) -> Result<InvestmentOpportunity, TrackerError> {
    let mut opp = get_opportunity(port, id, now)?;
    opp.close(now)?;
    port.update_opportunity(&opp)?;
    log::info!("closed opportunity {} ({})", opp.id, opp.symbol);
    Ok(opp)
}

//! Downstream consumers of accepted plans.

use parking_lot::Mutex;
use tracing::info;

use crate::error::Result;
use crate::service::AcceptedPlan;

/// Receives accepted plans, e.g. to place or queue the bets.
pub trait PlanSink: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Handles one accepted plan.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CorrelationError::Sink`] if the plan cannot be handed on.
    fn accept(&self, plan: &AcceptedPlan) -> Result<()>;
}

/// Logs every plan leg by leg.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl PlanSink for TracingSink {
    fn name(&self) -> &'static str {
        "tracing"
    }

    fn accept(&self, accepted: &AcceptedPlan) -> Result<()> {
        let plan = &accepted.plan;
        info!(
            fixture = %accepted.cluster.fixture(),
            total_stake = %plan.total_stake(),
            worst_payout = %plan.worst_case_payout(),
            profit = %accepted.profit(),
            "Bet plan"
        );
        for leg in plan.legs() {
            info!(
                outcome = %leg.outcome,
                source = %leg.source,
                odds = %leg.quote_value,
                stake = %leg.stake,
                payout = %leg.payout(),
                "Bet leg"
            );
        }
        Ok(())
    }
}

/// Keeps every plan in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    plans: Mutex<Vec<AcceptedPlan>>,
}

impl CollectingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the plans received so far.
    #[must_use]
    pub fn plans(&self) -> Vec<AcceptedPlan> {
        self.plans.lock().clone()
    }

    /// Removes and returns all received plans.
    pub fn take(&self) -> Vec<AcceptedPlan> {
        std::mem::take(&mut *self.plans.lock())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.plans.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plans.lock().is_empty()
    }
}

impl PlanSink for CollectingSink {
    fn name(&self) -> &'static str {
        "collecting"
    }

    fn accept(&self, plan: &AcceptedPlan) -> Result<()> {
        self.plans.lock().push(plan.clone());
        Ok(())
    }
}

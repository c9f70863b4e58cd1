use std::sync::Arc;

use common::{Clock, MerchantId};

use crate::merchant::{RulesError, WorkflowRulesProvider};

use super::{Order, OrderError, OrderStateMachine};

/// Binds order state machines to the current rules and clock.
#[derive(Clone)]
pub struct OrderWorkflow {
    rules: Arc<WorkflowRulesProvider>,
    clock: Arc<dyn Clock>,
}

impl OrderWorkflow {
    pub fn new(rules: Arc<WorkflowRulesProvider>, clock: Arc<dyn Clock>) -> Self {
        Self { rules, clock }
    }

    pub fn rules_provider(&self) -> &WorkflowRulesProvider {
        &self.rules
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub async fn state_machine_for(
        &self,
        merchant_id: MerchantId,
    ) -> Result<OrderStateMachine, RulesError> {
        let rules = self.rules.get_rules(merchant_id).await?;
        Ok(OrderStateMachine::new(rules, self.clock.now()))
    }

    /// State machine under the rules of the order's merchant.
    pub async fn state_machine(&self, order: &Order) -> Result<OrderStateMachine, crate::DomainError> {
        let merchant_id = order.merchant_id().ok_or(OrderError::NotPlaced)?;
        Ok(self.state_machine_for(merchant_id).await?)
    }
}

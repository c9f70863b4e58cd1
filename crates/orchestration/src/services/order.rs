//! Order lifecycle operations bound to the event store.

use chrono::Duration;
use common::{MerchantId, OrderId};
use domain::order::{RecordPayment, RefundOrder, TransitionOrder};
use domain::{
    CancelOrder, Command, CommandHandler, CommandResult, DomainError, Order, OrderError,
    OrderEvent, OrderStateMachine, OrderStatus, OrderWorkflow, PlaceOrder,
};
use event_store::EventStore;

use crate::error::Result;
use crate::retry::retry_on_conflict;

/// Runs order commands through the merchant's state machine.
///
/// Every command binds a fresh state machine, reloads the order and commits
/// with the loaded version, so a transition is always judged against the
/// state it is applied to. Conflicts are retried.
#[derive(Clone)]
pub struct OrderService<S: EventStore> {
    orders: CommandHandler<S, Order>,
    workflow: OrderWorkflow,
    max_retries: u32,
}

impl<S: EventStore> OrderService<S> {
    pub fn new(store: S, workflow: OrderWorkflow, max_retries: u32) -> Self {
        Self {
            orders: CommandHandler::new(store),
            workflow,
            max_retries,
        }
    }

    pub fn workflow(&self) -> &OrderWorkflow {
        &self.workflow
    }

    /// Places an order. The merchant must be known so its rules resolve.
    #[tracing::instrument(skip(self, cmd), fields(order_id = %cmd.order_id, merchant_id = %cmd.merchant_id))]
    pub async fn place_order(&self, cmd: PlaceOrder) -> Result<CommandResult<Order>> {
        self.workflow
            .rules_provider()
            .get_rules(cmd.merchant_id)
            .await
            .map_err(DomainError::from)?;

        let now = self.workflow.clock().now();
        let result = self
            .orders
            .execute(cmd.aggregate_id(), |order| order.place(&cmd, now))
            .await?;

        tracing::info!(total = %result.aggregate.total(), "order placed");
        Ok(result)
    }

    /// Replays the order from its stream; `None` for an unknown id.
    pub async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>> {
        Ok(self.orders.load_existing(order_id.into()).await?)
    }

    /// Whether `target` is reachable in one step under the merchant's rules,
    /// including the payment and refund preconditions.
    #[tracing::instrument(skip(self))]
    pub async fn can_transition(&self, order_id: OrderId, target: OrderStatus) -> Result<bool> {
        let (order, machine) = self.machine(order_id).await?;
        Ok(machine.can_transition(&order, target))
    }

    /// Statuses the order may move to now; empty for a finished order.
    #[tracing::instrument(skip(self))]
    pub async fn valid_next_statuses(&self, order_id: OrderId) -> Result<Vec<OrderStatus>> {
        let (order, machine) = self.machine(order_id).await?;
        Ok(machine.valid_next_statuses(&order))
    }

    /// Moves the order to `cmd.target`.
    ///
    /// `CANCELLED` and `REFUNDED` follow the same policy as
    /// [`Self::cancel_order`] and [`Self::process_refund`].
    #[tracing::instrument(skip(self), fields(order_id = %cmd.order_id, target = %cmd.target))]
    pub async fn execute_transition(&self, cmd: TransitionOrder) -> Result<CommandResult<Order>> {
        let TransitionOrder {
            order_id,
            target,
            reason,
        } = cmd;

        self.run("execute_transition", order_id, |machine, order| {
            machine.execute_transition(order, target, reason.clone())
        })
        .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn can_auto_progress(&self, order_id: OrderId) -> Result<bool> {
        let (order, machine) = self.machine(order_id).await?;
        Ok(machine.can_auto_progress(&order))
    }

    /// Applies every automatic step available; a no-op when there is none.
    #[tracing::instrument(skip(self))]
    pub async fn execute_auto_progression(&self, order_id: OrderId) -> Result<CommandResult<Order>> {
        self.run("auto_progression", order_id, |machine, order| {
            machine.execute_auto_progression(order)
        })
        .await
    }

    /// Cancels the order if its status and the merchant allow it.
    #[tracing::instrument(skip(self), fields(order_id = %cmd.order_id, reason = cmd.reason.as_str()))]
    pub async fn cancel_order(&self, cmd: CancelOrder) -> Result<CommandResult<Order>> {
        let CancelOrder {
            order_id,
            reason,
            details,
        } = cmd;

        self.run("cancel_order", order_id, |machine, order| {
            machine.cancel_order(order, reason, details.clone())
        })
        .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn can_refund(&self, order_id: OrderId) -> Result<bool> {
        let (order, machine) = self.machine(order_id).await?;
        Ok(machine.can_refund(&order))
    }

    /// Refunds a delivered, cancelled or failed order paid by a refundable
    /// method.
    #[tracing::instrument(skip(self), fields(order_id = %cmd.order_id))]
    pub async fn process_refund(&self, cmd: RefundOrder) -> Result<CommandResult<Order>> {
        let RefundOrder { order_id, reason } = cmd;

        self.run("process_refund", order_id, |machine, order| {
            machine.process_refund(order, reason.clone())
        })
        .await
    }

    /// Records what the payment gateway reported and applies the consequences.
    #[tracing::instrument(skip(self), fields(order_id = %cmd.order_id, status = ?cmd.payment.status))]
    pub async fn record_payment(&self, cmd: RecordPayment) -> Result<CommandResult<Order>> {
        let RecordPayment { order_id, payment } = cmd;

        self.run("record_payment", order_id, |machine, order| {
            machine.record_payment(order, payment.clone())
        })
        .await
    }

    /// How long the order may sit in its current status.
    #[tracing::instrument(skip(self))]
    pub async fn status_timeout(&self, order_id: OrderId) -> Result<Duration> {
        let (order, machine) = self.machine(order_id).await?;
        Ok(machine.status_timeout(&order))
    }

    #[tracing::instrument(skip(self))]
    pub async fn requires_manual_intervention(&self, order_id: OrderId) -> Result<bool> {
        let (order, machine) = self.machine(order_id).await?;
        Ok(machine.requires_manual_intervention(&order))
    }

    /// Applies the timeout policy if the order is still past its timeout.
    ///
    /// The order may have moved on since the caller looked; then nothing
    /// happens and the result is a no-op.
    #[tracing::instrument(skip(self))]
    pub async fn handle_status_timeout(&self, order_id: OrderId) -> Result<CommandResult<Order>> {
        let result = self
            .run("handle_status_timeout", order_id, |machine, order| {
                if machine.is_timed_out(order) {
                    machine.handle_status_timeout(order)
                } else {
                    Ok(vec![])
                }
            })
            .await?;

        if result.is_noop() {
            tracing::debug!(status = %result.aggregate.status(), "order not timed out, nothing to do");
        }
        Ok(result)
    }

    /// Moves the order along after its delivery progressed.
    ///
    /// Skipped with a warning when the order cannot make the move, e.g. a
    /// delivery that failed before pickup while the order is still waiting.
    #[tracing::instrument(skip(self))]
    pub async fn follow_delivery(
        &self,
        order_id: OrderId,
        target: OrderStatus,
        note: &'static str,
    ) -> Result<CommandResult<Order>> {
        let result = self
            .run("follow_delivery", order_id, |machine, order| {
                if order.status() == target || !machine.can_transition(order, target) {
                    return Ok(vec![]);
                }
                machine.execute_transition(order, target, Some(note.to_string()))
            })
            .await?;

        if result.aggregate.status() != target {
            tracing::warn!(
                current = %result.aggregate.status(),
                %target,
                "order cannot follow its delivery"
            );
        }
        Ok(result)
    }

    async fn merchant_of(&self, order_id: OrderId) -> Result<MerchantId> {
        let order = self.orders.load_required(order_id.into()).await?;
        Ok(order
            .merchant_id()
            .ok_or_else(|| DomainError::from(OrderError::NotPlaced))?)
    }

    async fn machine(&self, order_id: OrderId) -> Result<(Order, OrderStateMachine)> {
        let order = self.orders.load_required(order_id.into()).await?;
        let machine = self.workflow.state_machine(&order).await?;
        Ok((order, machine))
    }

    async fn run<F>(
        &self,
        operation: &'static str,
        order_id: OrderId,
        decide: F,
    ) -> Result<CommandResult<Order>>
    where
        F: Fn(&OrderStateMachine, &Order) -> std::result::Result<Vec<OrderEvent>, OrderError> + Sync,
    {
        // The merchant never changes after placement.
        let merchant_id = self.merchant_of(order_id).await?;
        let decide = &decide;

        let result = retry_on_conflict(operation, self.max_retries, || async move {
            let machine = self
                .workflow
                .state_machine_for(merchant_id)
                .await
                .map_err(DomainError::from)?;
            Ok(self
                .orders
                .execute(order_id.into(), |order| decide(&machine, order))
                .await?)
        })
        .await?;

        record_order_events(&result.events);
        Ok(result)
    }
}

fn record_order_events(events: &[OrderEvent]) {
    for event in events {
        match event {
            OrderEvent::OrderStatusChanged(data) => {
                metrics::counter!(
                    "orders_transitions_total",
                    "from" => data.from.as_str(),
                    "to" => data.to.as_str()
                )
                .increment(1);
                tracing::info!(order_id = %data.order_id, from = %data.from, to = %data.to, "order status changed");
            }
            OrderEvent::OrderCancelled(data) => {
                metrics::counter!("orders_cancelled_total", "reason" => data.reason.as_str())
                    .increment(1);
                tracing::info!(order_id = %data.order_id, from = %data.from, reason = data.reason.as_str(), "order cancelled");
            }
            OrderEvent::OrderRefunded(data) => {
                metrics::counter!("orders_refunded_total").increment(1);
                tracing::info!(order_id = %data.order_id, amount = %data.amount, "order refunded");
            }
            OrderEvent::OrderPlaced(_) | OrderEvent::PaymentUpdated(_) => {}
        }
    }
}

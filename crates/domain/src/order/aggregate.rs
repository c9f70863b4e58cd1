//! Order aggregate implementation.

use chrono::{DateTime, Duration, Utc};
use common::{AggregateId, CustomerId, MerchantId, OrderId, TenantId};
use event_store::Version;
use serde::{Deserialize, Serialize};

use crate::aggregate::{Aggregate, SnapshotCapable};

use super::{
    CancellationReason, DeliveryAddress, Money, OrderError, OrderEvent, OrderItem, OrderStatus,
    PaymentInfo, PlaceOrder,
    events::{
        OrderCancelledData, OrderPlacedData, OrderRefundedData, OrderStatusChangedData,
        PaymentUpdatedData,
    },
    status,
};

/// Order aggregate root.
///
/// Status only changes through [`super::OrderStateMachine`]; the event
/// builders it uses are crate-private so no other caller can skip the
/// transition checks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Order {
    id: Option<OrderId>,

    #[serde(default)]
    version: Version,

    tenant_id: Option<TenantId>,
    merchant_id: Option<MerchantId>,
    customer_id: Option<CustomerId>,
    items: Vec<OrderItem>,
    delivery_address: Option<DeliveryAddress>,
    payment: Option<PaymentInfo>,
    total: Money,
    status: OrderStatus,
    cancellation_reason: Option<CancellationReason>,
    refunded_amount: Option<Money>,
    placed_at: Option<DateTime<Utc>>,
    status_changed_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl Aggregate for Order {
    type Event = OrderEvent;
    type Error = OrderError;

    fn aggregate_type() -> &'static str {
        "Order"
    }

    fn id(&self) -> Option<AggregateId> {
        self.id.map(AggregateId::from)
    }

    fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            OrderEvent::OrderPlaced(data) => self.apply_order_placed(data),
            OrderEvent::PaymentUpdated(data) => {
                self.payment = Some(data.payment);
                self.updated_at = Some(data.updated_at);
            }
            OrderEvent::OrderStatusChanged(data) => {
                self.move_to(data.to, data.changed_at);
            }
            OrderEvent::OrderCancelled(data) => {
                self.cancellation_reason = Some(data.reason);
                self.move_to(OrderStatus::Cancelled, data.cancelled_at);
            }
            OrderEvent::OrderRefunded(data) => {
                self.refunded_amount = Some(data.amount);
                if let Some(payment) = self.payment.as_mut() {
                    payment.status = super::PaymentStatus::Refunded;
                }
                self.move_to(OrderStatus::Refunded, data.refunded_at);
            }
        }
    }
}

impl SnapshotCapable for Order {
    fn snapshot_interval() -> u64 {
        20
    }
}

// Query methods
impl Order {
    pub fn order_id(&self) -> Option<OrderId> {
        self.id
    }

    pub fn merchant_id(&self) -> Option<MerchantId> {
        self.merchant_id
    }

    pub fn customer_id(&self) -> Option<CustomerId> {
        self.customer_id
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn delivery_address(&self) -> Option<&DeliveryAddress> {
        self.delivery_address.as_ref()
    }

    pub fn payment(&self) -> Option<&PaymentInfo> {
        self.payment.as_ref()
    }

    pub fn total(&self) -> Money {
        self.total
    }

    pub fn cancellation_reason(&self) -> Option<CancellationReason> {
        self.cancellation_reason
    }

    pub fn refunded_amount(&self) -> Option<Money> {
        self.refunded_amount
    }

    pub fn placed_at(&self) -> Option<DateTime<Utc>> {
        self.placed_at
    }

    pub fn status_changed_at(&self) -> Option<DateTime<Utc>> {
        self.status_changed_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub fn is_placed(&self) -> bool {
        self.id.is_some()
    }

    pub fn is_terminal(&self) -> bool {
        status::is_terminal(self.status)
    }

    pub fn is_cash_on_delivery(&self) -> bool {
        self.payment
            .as_ref()
            .is_some_and(|p| p.method.is_cash_on_delivery())
    }

    /// Time spent in the current status; zero for an unplaced order.
    pub fn time_in_status(&self, now: DateTime<Utc>) -> Duration {
        self.status_changed_at
            .map(|since| (now - since).max(Duration::zero()))
            .unwrap_or_else(Duration::zero)
    }
}

// Command methods (return events)
impl Order {
    /// Places the order. Item totals must add up to the payment amount.
    pub fn place(&self, cmd: &PlaceOrder, now: DateTime<Utc>) -> Result<Vec<OrderEvent>, OrderError> {
        if self.is_placed() {
            return Err(OrderError::AlreadyPlaced);
        }

        if cmd.items.is_empty() {
            return Err(OrderError::NoItems);
        }

        for item in &cmd.items {
            if item.quantity == 0 {
                return Err(OrderError::InvalidQuantity {
                    product_id: item.product_id.to_string(),
                });
            }
            if !item.unit_price.is_positive() {
                return Err(OrderError::InvalidPrice {
                    product_id: item.product_id.to_string(),
                    price: item.unit_price,
                });
            }
        }

        let total: Money = cmd.items.iter().map(OrderItem::total_price).sum();
        if let Some(payment) = &cmd.payment {
            ensure_amount_matches(total, payment)?;
        }

        Ok(vec![OrderEvent::OrderPlaced(OrderPlacedData {
            order_id: cmd.order_id,
            tenant_id: cmd.tenant_id,
            merchant_id: cmd.merchant_id,
            customer_id: cmd.customer_id,
            items: cmd.items.clone(),
            delivery_address: cmd.delivery_address.clone(),
            payment: cmd.payment.clone(),
            total,
            placed_at: now,
        })])
    }

    /// Attaches or updates payment details. Unchanged details are a no-op.
    pub fn update_payment(
        &self,
        payment: PaymentInfo,
        now: DateTime<Utc>,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        self.ensure_placed()?;

        if self.is_terminal() {
            return Err(OrderError::InvalidStateTransition {
                from: self.status,
                to: self.status,
                reason: "payment cannot change on a finished order".to_string(),
            });
        }

        ensure_amount_matches(self.total, &payment)?;

        if self.payment.as_ref() == Some(&payment) {
            return Ok(vec![]);
        }

        Ok(vec![OrderEvent::PaymentUpdated(PaymentUpdatedData {
            payment,
            updated_at: now,
        })])
    }

    pub(crate) fn ensure_placed(&self) -> Result<(), OrderError> {
        if self.is_placed() {
            Ok(())
        } else {
            Err(OrderError::NotPlaced)
        }
    }

    pub(crate) fn status_changed(
        &self,
        to: OrderStatus,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<OrderEvent, OrderError> {
        let (order_id, tenant_id) = self.identity()?;
        Ok(OrderEvent::OrderStatusChanged(OrderStatusChangedData {
            order_id,
            tenant_id,
            from: self.status,
            to,
            reason,
            changed_at: now,
        }))
    }

    pub(crate) fn cancelled(
        &self,
        reason: CancellationReason,
        details: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<OrderEvent, OrderError> {
        let (order_id, tenant_id) = self.identity()?;
        Ok(OrderEvent::OrderCancelled(OrderCancelledData {
            order_id,
            tenant_id,
            from: self.status,
            reason,
            details,
            cancelled_at: now,
        }))
    }

    pub(crate) fn refunded(
        &self,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<OrderEvent, OrderError> {
        let (order_id, tenant_id) = self.identity()?;
        let amount = self
            .payment
            .as_ref()
            .map(|p| p.amount)
            .unwrap_or(self.total);
        Ok(OrderEvent::OrderRefunded(OrderRefundedData {
            order_id,
            tenant_id,
            from: self.status,
            amount,
            reason,
            refunded_at: now,
        }))
    }

    fn identity(&self) -> Result<(OrderId, TenantId), OrderError> {
        match (self.id, self.tenant_id) {
            (Some(order_id), Some(tenant_id)) => Ok((order_id, tenant_id)),
            _ => Err(OrderError::NotPlaced),
        }
    }
}

fn ensure_amount_matches(total: Money, payment: &PaymentInfo) -> Result<(), OrderError> {
    if payment.amount != total {
        return Err(OrderError::PaymentAmountMismatch {
            expected: total,
            actual: payment.amount,
        });
    }
    Ok(())
}

// Apply event helpers
impl Order {
    fn apply_order_placed(&mut self, data: OrderPlacedData) {
        self.id = Some(data.order_id);
        self.tenant_id = Some(data.tenant_id);
        self.merchant_id = Some(data.merchant_id);
        self.customer_id = Some(data.customer_id);
        self.items = data.items;
        self.delivery_address = Some(data.delivery_address);
        self.payment = data.payment;
        self.total = data.total;
        self.status = OrderStatus::Pending;
        self.placed_at = Some(data.placed_at);
        self.status_changed_at = Some(data.placed_at);
        self.updated_at = Some(data.placed_at);
    }

    fn move_to(&mut self, status: OrderStatus, at: DateTime<Utc>) {
        self.status = status;
        self.status_changed_at = Some(at);
        self.updated_at = Some(at);
    }
}

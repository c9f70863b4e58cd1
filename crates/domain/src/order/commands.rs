//! Order commands.

use common::{AggregateId, CustomerId, MerchantId, OrderId, TenantId};

use crate::command::Command;

use super::{CancellationReason, DeliveryAddress, Order, OrderItem, OrderStatus, PaymentInfo};

/// Places a new order in `PENDING`.
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub order_id: OrderId,
    pub tenant_id: TenantId,
    pub merchant_id: MerchantId,
    pub customer_id: CustomerId,
    pub items: Vec<OrderItem>,
    pub delivery_address: DeliveryAddress,
    /// Absent when the customer pays later; the order then cannot enter
    /// `PAYMENT_PROCESSING` until payment details arrive.
    pub payment: Option<PaymentInfo>,
}

impl PlaceOrder {
    pub fn new(
        tenant_id: TenantId,
        merchant_id: MerchantId,
        customer_id: CustomerId,
        items: Vec<OrderItem>,
        delivery_address: DeliveryAddress,
    ) -> Self {
        Self {
            order_id: OrderId::new(),
            tenant_id,
            merchant_id,
            customer_id,
            items,
            delivery_address,
            payment: None,
        }
    }

    pub fn with_payment(mut self, payment: PaymentInfo) -> Self {
        self.payment = Some(payment);
        self
    }
}

impl Command for PlaceOrder {
    type Aggregate = Order;

    fn aggregate_id(&self) -> AggregateId {
        self.order_id.into()
    }
}

/// Moves an order to `target`, subject to the table and merchant rules.
#[derive(Debug, Clone)]
pub struct TransitionOrder {
    pub order_id: OrderId,
    pub target: OrderStatus,
    pub reason: Option<String>,
}

impl TransitionOrder {
    pub fn new(order_id: OrderId, target: OrderStatus) -> Self {
        Self {
            order_id,
            target,
            reason: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

impl Command for TransitionOrder {
    type Aggregate = Order;

    fn aggregate_id(&self) -> AggregateId {
        self.order_id.into()
    }
}

#[derive(Debug, Clone)]
pub struct CancelOrder {
    pub order_id: OrderId,
    pub reason: CancellationReason,
    pub details: Option<String>,
}

impl CancelOrder {
    pub fn new(order_id: OrderId, reason: CancellationReason) -> Self {
        Self {
            order_id,
            reason,
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl Command for CancelOrder {
    type Aggregate = Order;

    fn aggregate_id(&self) -> AggregateId {
        self.order_id.into()
    }
}

#[derive(Debug, Clone)]
pub struct RefundOrder {
    pub order_id: OrderId,
    pub reason: Option<String>,
}

impl Command for RefundOrder {
    type Aggregate = Order;

    fn aggregate_id(&self) -> AggregateId {
        self.order_id.into()
    }
}

/// Reports what the payment gateway saw for an order.
#[derive(Debug, Clone)]
pub struct RecordPayment {
    pub order_id: OrderId,
    pub payment: PaymentInfo,
}

impl Command for RecordPayment {
    type Aggregate = Order;

    fn aggregate_id(&self) -> AggregateId {
        self.order_id.into()
    }
}

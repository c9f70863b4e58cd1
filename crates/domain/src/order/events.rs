//! Order domain events.

use chrono::{DateTime, Utc};
use common::{CustomerId, MerchantId, OrderId, TenantId};
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;

use super::{CancellationReason, DeliveryAddress, Money, OrderItem, OrderStatus, PaymentInfo};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OrderEvent {
    OrderPlaced(OrderPlacedData),

    /// Payment details were attached or the gateway reported progress.
    PaymentUpdated(PaymentUpdatedData),

    OrderStatusChanged(OrderStatusChangedData),

    OrderCancelled(OrderCancelledData),

    OrderRefunded(OrderRefundedData),
}

impl DomainEvent for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::OrderPlaced(_) => "OrderPlaced",
            OrderEvent::PaymentUpdated(_) => "PaymentUpdated",
            OrderEvent::OrderStatusChanged(_) => "OrderStatusChanged",
            OrderEvent::OrderCancelled(_) => "OrderCancelled",
            OrderEvent::OrderRefunded(_) => "OrderRefunded",
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            OrderEvent::OrderPlaced(data) => data.placed_at,
            OrderEvent::PaymentUpdated(data) => data.updated_at,
            OrderEvent::OrderStatusChanged(data) => data.changed_at,
            OrderEvent::OrderCancelled(data) => data.cancelled_at,
            OrderEvent::OrderRefunded(data) => data.refunded_at,
        }
    }
}

impl OrderEvent {
    /// The status the order ends up in after this event, if it changes it.
    pub fn resulting_status(&self) -> Option<OrderStatus> {
        match self {
            OrderEvent::OrderPlaced(_) => Some(OrderStatus::Pending),
            OrderEvent::PaymentUpdated(_) => None,
            OrderEvent::OrderStatusChanged(data) => Some(data.to),
            OrderEvent::OrderCancelled(_) => Some(OrderStatus::Cancelled),
            OrderEvent::OrderRefunded(_) => Some(OrderStatus::Refunded),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPlacedData {
    pub order_id: OrderId,
    pub tenant_id: TenantId,
    pub merchant_id: MerchantId,
    pub customer_id: CustomerId,
    pub items: Vec<OrderItem>,
    pub delivery_address: DeliveryAddress,
    pub payment: Option<PaymentInfo>,
    pub total: Money,
    pub placed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentUpdatedData {
    pub payment: PaymentInfo,
    pub updated_at: DateTime<Utc>,
}

/// Signal for collaborators: old status, new status, order and tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusChangedData {
    pub order_id: OrderId,
    pub tenant_id: TenantId,
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub reason: Option<String>,
    pub changed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCancelledData {
    pub order_id: OrderId,
    pub tenant_id: TenantId,
    pub from: OrderStatus,
    pub reason: CancellationReason,
    pub details: Option<String>,
    pub cancelled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRefundedData {
    pub order_id: OrderId,
    pub tenant_id: TenantId,
    pub from: OrderStatus,
    pub amount: Money,
    pub reason: Option<String>,
    pub refunded_at: DateTime<Utc>,
}

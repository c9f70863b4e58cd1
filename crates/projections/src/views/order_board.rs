//! Order board: every order's current status and its status history.
//!
//! Terminal orders stay on the board so merchants can list what they
//! delivered or refunded; use [`OrderBoardView::active`] for the live set.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CustomerId, MerchantId, OrderId, TenantId, TimeRange};
use domain::order::{OrderEvent, OrderStatus, status};
use domain::{Money, PaymentStatus};
use event_store::EventEnvelope;
use geo::Location;
use tokio::sync::RwLock;

use crate::Result;
use crate::projection::{Projection, ProjectionPosition};
use crate::read_model::ReadModel;

/// One status an order passed through.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusEntry {
    pub status: OrderStatus,
    pub at: DateTime<Utc>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OrderSummary {
    pub order_id: OrderId,
    pub tenant_id: TenantId,
    pub merchant_id: MerchantId,
    pub customer_id: CustomerId,
    pub status: OrderStatus,
    pub total: Money,
    pub item_count: usize,
    pub payment_status: Option<PaymentStatus>,
    pub dropoff: Option<Location>,
    pub placed_at: DateTime<Utc>,
    pub status_changed_at: DateTime<Utc>,
    pub history: Vec<StatusEntry>,
}

impl OrderSummary {
    pub fn is_active(&self) -> bool {
        status::is_active(self.status)
    }

    fn move_to(&mut self, to: OrderStatus, at: DateTime<Utc>, reason: Option<String>) {
        self.status = to;
        self.status_changed_at = at;
        self.history.push(StatusEntry {
            status: to,
            at,
            reason,
        });
    }
}

#[derive(Clone)]
pub struct OrderBoardView {
    orders: Arc<RwLock<HashMap<OrderId, OrderSummary>>>,
    position: Arc<RwLock<ProjectionPosition>>,
}

impl OrderBoardView {
    pub fn new() -> Self {
        Self {
            orders: Arc::new(RwLock::new(HashMap::new())),
            position: Arc::new(RwLock::new(ProjectionPosition::zero())),
        }
    }

    pub async fn get(&self, order_id: OrderId) -> Option<OrderSummary> {
        self.orders.read().await.get(&order_id).cloned()
    }

    /// A merchant's orders, newest first.
    pub async fn by_merchant(&self, tenant_id: TenantId, merchant_id: MerchantId) -> Vec<OrderSummary> {
        self.collect_sorted(|o| o.tenant_id == tenant_id && o.merchant_id == merchant_id)
            .await
    }

    pub async fn by_status(&self, tenant_id: TenantId, wanted: OrderStatus) -> Vec<OrderSummary> {
        self.collect_sorted(|o| o.tenant_id == tenant_id && o.status == wanted)
            .await
    }

    pub async fn placed_within(&self, tenant_id: TenantId, range: &TimeRange) -> Vec<OrderSummary> {
        self.collect_sorted(|o| o.tenant_id == tenant_id && range.contains(o.placed_at))
            .await
    }

    pub async fn active(&self, tenant_id: TenantId) -> Vec<OrderSummary> {
        self.collect_sorted(|o| o.tenant_id == tenant_id && o.is_active())
            .await
    }

    /// Active orders of every tenant that have not moved since `cutoff`.
    ///
    /// Candidates only: the timeout handler re-checks each order against its
    /// own stream and the merchant's timeout before acting.
    pub async fn stalled_since(&self, cutoff: DateTime<Utc>) -> Vec<OrderSummary> {
        let mut stalled: Vec<_> = self
            .orders
            .read()
            .await
            .values()
            .filter(|o| o.is_active() && o.status_changed_at <= cutoff)
            .cloned()
            .collect();
        stalled.sort_by_key(|o| o.status_changed_at);
        stalled
    }

    async fn collect_sorted(&self, keep: impl Fn(&OrderSummary) -> bool) -> Vec<OrderSummary> {
        let mut orders: Vec<_> = self
            .orders
            .read()
            .await
            .values()
            .filter(|o| keep(o))
            .cloned()
            .collect();
        orders.sort_by(|a, b| {
            b.placed_at
                .cmp(&a.placed_at)
                .then_with(|| a.order_id.cmp(&b.order_id))
        });
        orders
    }

    fn apply(orders: &mut HashMap<OrderId, OrderSummary>, event: OrderEvent) {
        match event {
            OrderEvent::OrderPlaced(data) => {
                orders.insert(
                    data.order_id,
                    OrderSummary {
                        order_id: data.order_id,
                        tenant_id: data.tenant_id,
                        merchant_id: data.merchant_id,
                        customer_id: data.customer_id,
                        status: OrderStatus::Pending,
                        total: data.total,
                        item_count: data.items.len(),
                        payment_status: data.payment.map(|p| p.status),
                        dropoff: data.delivery_address.location,
                        placed_at: data.placed_at,
                        status_changed_at: data.placed_at,
                        history: vec![StatusEntry {
                            status: OrderStatus::Pending,
                            at: data.placed_at,
                            reason: None,
                        }],
                    },
                );
            }
            // PaymentUpdated carries no order id; handled by the caller.
            OrderEvent::PaymentUpdated(_) => {}
            OrderEvent::OrderStatusChanged(data) => {
                if let Some(order) = orders.get_mut(&data.order_id) {
                    order.move_to(data.to, data.changed_at, data.reason);
                }
            }
            OrderEvent::OrderCancelled(data) => {
                if let Some(order) = orders.get_mut(&data.order_id) {
                    let reason = data
                        .details
                        .unwrap_or_else(|| data.reason.description().to_string());
                    order.move_to(OrderStatus::Cancelled, data.cancelled_at, Some(reason));
                }
            }
            OrderEvent::OrderRefunded(data) => {
                if let Some(order) = orders.get_mut(&data.order_id) {
                    order.payment_status = order.payment_status.map(|_| PaymentStatus::Refunded);
                    order.move_to(OrderStatus::Refunded, data.refunded_at, data.reason);
                }
            }
        }
    }
}

impl Default for OrderBoardView {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Projection for OrderBoardView {
    fn name(&self) -> &'static str {
        "OrderBoardView"
    }

    async fn handle(&self, event: &EventEnvelope) -> Result<()> {
        if event.aggregate_type == "Order" {
            let order_event: OrderEvent = event.decode()?;
            let mut orders = self.orders.write().await;

            match order_event {
                OrderEvent::PaymentUpdated(data) => {
                    let order_id = OrderId::from_uuid(event.aggregate_id.as_uuid());
                    if let Some(order) = orders.get_mut(&order_id) {
                        order.payment_status = Some(data.payment.status);
                    }
                }
                other => Self::apply(&mut orders, other),
            }
        }

        let mut pos = self.position.write().await;
        *pos = pos.advance_to(event.sequence);
        Ok(())
    }

    async fn position(&self) -> ProjectionPosition {
        *self.position.read().await
    }

    async fn reset(&self) -> Result<()> {
        self.orders.write().await.clear();
        *self.position.write().await = ProjectionPosition::zero();
        Ok(())
    }
}

impl ReadModel for OrderBoardView {
    fn name(&self) -> &'static str {
        "OrderBoardView"
    }

    fn count(&self) -> usize {
        self.orders.try_read().map(|o| o.len()).unwrap_or(0)
    }
}

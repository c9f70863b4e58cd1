//! Delivery board: every delivery with its courier, status and ETA.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CourierId, DeliveryId, OrderId, TenantId};
use domain::delivery::{DeliveryEvent, DeliveryStatus, status};
use event_store::EventEnvelope;
use geo::Location;
use tokio::sync::RwLock;

use crate::Result;
use crate::projection::{Projection, ProjectionPosition};
use crate::read_model::ReadModel;

#[derive(Debug, Clone, PartialEq)]
pub struct DeliverySummary {
    pub delivery_id: DeliveryId,
    pub tenant_id: TenantId,
    pub order_id: OrderId,
    pub courier_id: CourierId,
    pub status: DeliveryStatus,
    pub current_location: Location,
    pub destination: Location,
    pub estimated_arrival: DateTime<Utc>,
    pub assigned_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DeliverySummary {
    pub fn is_active(&self) -> bool {
        status::is_active(self.status)
    }

    /// Still moving and past its estimated arrival.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.is_active() && now > self.estimated_arrival
    }
}

#[derive(Clone)]
pub struct DeliveryBoardView {
    deliveries: Arc<RwLock<HashMap<DeliveryId, DeliverySummary>>>,
    position: Arc<RwLock<ProjectionPosition>>,
}

impl DeliveryBoardView {
    pub fn new() -> Self {
        Self {
            deliveries: Arc::new(RwLock::new(HashMap::new())),
            position: Arc::new(RwLock::new(ProjectionPosition::zero())),
        }
    }

    pub async fn get(&self, delivery_id: DeliveryId) -> Option<DeliverySummary> {
        self.deliveries.read().await.get(&delivery_id).cloned()
    }

    /// The most recently assigned delivery for an order.
    pub async fn by_order(&self, order_id: OrderId) -> Option<DeliverySummary> {
        self.deliveries
            .read()
            .await
            .values()
            .filter(|d| d.order_id == order_id)
            .max_by_key(|d| d.assigned_at)
            .cloned()
    }

    pub async fn active_for_courier(&self, courier_id: CourierId) -> Vec<DeliverySummary> {
        let mut active: Vec<_> = self
            .deliveries
            .read()
            .await
            .values()
            .filter(|d| d.courier_id == courier_id && d.is_active())
            .cloned()
            .collect();
        active.sort_by_key(|d| d.assigned_at);
        active
    }

    /// Active deliveries past their ETA, most late first.
    pub async fn overdue(&self, tenant_id: TenantId, now: DateTime<Utc>) -> Vec<DeliverySummary> {
        let mut late: Vec<_> = self
            .deliveries
            .read()
            .await
            .values()
            .filter(|d| d.tenant_id == tenant_id && d.is_overdue(now))
            .cloned()
            .collect();
        late.sort_by_key(|d| d.estimated_arrival);
        late
    }

    pub async fn active_count(&self, tenant_id: TenantId) -> usize {
        self.deliveries
            .read()
            .await
            .values()
            .filter(|d| d.tenant_id == tenant_id && d.is_active())
            .count()
    }

    fn apply(deliveries: &mut HashMap<DeliveryId, DeliverySummary>, event: DeliveryEvent) {
        match event {
            DeliveryEvent::DeliveryAssigned(data) => {
                deliveries.insert(
                    data.delivery_id,
                    DeliverySummary {
                        delivery_id: data.delivery_id,
                        tenant_id: data.tenant_id,
                        order_id: data.order_id,
                        courier_id: data.courier_id,
                        status: DeliveryStatus::Assigned,
                        current_location: data.route.start(),
                        destination: data.route.end(),
                        estimated_arrival: data.estimated_arrival,
                        assigned_at: data.assigned_at,
                        updated_at: data.assigned_at,
                    },
                );
            }
            DeliveryEvent::DeliveryStatusChanged(data) => {
                if let Some(entry) = deliveries.get_mut(&data.delivery_id) {
                    entry.status = data.to;
                    entry.updated_at = data.changed_at;
                }
            }
            DeliveryEvent::DeliveryCompleted(data) => {
                if let Some(entry) = deliveries.get_mut(&data.delivery_id) {
                    entry.updated_at = data.completed_at;
                }
            }
            DeliveryEvent::DeliveryLocationUpdated(data) => {
                if let Some(entry) = deliveries.get_mut(&data.delivery_id) {
                    entry.current_location = data.location;
                    entry.estimated_arrival = data.estimated_arrival;
                    entry.updated_at = data.updated_at;
                }
            }
            DeliveryEvent::DeliveryReassigned(data) => {
                if let Some(entry) = deliveries.get_mut(&data.delivery_id) {
                    entry.courier_id = data.to_courier;
                    entry.current_location = data.route.start();
                    entry.destination = data.route.end();
                    entry.estimated_arrival = data.estimated_arrival;
                    entry.updated_at = data.reassigned_at;
                }
            }
            DeliveryEvent::DeliveryCancelled(data) => {
                if let Some(entry) = deliveries.get_mut(&data.delivery_id) {
                    entry.status = DeliveryStatus::Cancelled;
                    entry.updated_at = data.cancelled_at;
                }
            }
        }
    }
}

impl Default for DeliveryBoardView {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Projection for DeliveryBoardView {
    fn name(&self) -> &'static str {
        "DeliveryBoardView"
    }

    async fn handle(&self, event: &EventEnvelope) -> Result<()> {
        if event.aggregate_type == "Delivery" {
            let delivery_event: DeliveryEvent = event.decode()?;
            let mut deliveries = self.deliveries.write().await;
            Self::apply(&mut deliveries, delivery_event);
        }

        let mut pos = self.position.write().await;
        *pos = pos.advance_to(event.sequence);
        Ok(())
    }

    async fn position(&self) -> ProjectionPosition {
        *self.position.read().await
    }

    async fn reset(&self) -> Result<()> {
        self.deliveries.write().await.clear();
        *self.position.write().await = ProjectionPosition::zero();
        Ok(())
    }
}

impl ReadModel for DeliveryBoardView {
    fn name(&self) -> &'static str {
        "DeliveryBoardView"
    }

    fn count(&self) -> usize {
        self.deliveries.try_read().map(|d| d.len()).unwrap_or(0)
    }
}

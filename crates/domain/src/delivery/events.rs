//! Delivery events.

use chrono::{DateTime, Utc};
use common::{CourierId, DeliveryId, OrderId, TenantId};
use geo::{Location, Route};
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;
use crate::courier::Parcel;

use super::DeliveryStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum DeliveryEvent {
    DeliveryAssigned(DeliveryAssignedData),

    DeliveryStatusChanged(DeliveryStatusChangedData),

    /// Emitted alongside the status change into `DELIVERED`.
    DeliveryCompleted(DeliveryCompletedData),

    DeliveryLocationUpdated(DeliveryLocationUpdatedData),

    DeliveryReassigned(DeliveryReassignedData),

    DeliveryCancelled(DeliveryCancelledData),
}

impl DomainEvent for DeliveryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            DeliveryEvent::DeliveryAssigned(_) => "DeliveryAssigned",
            DeliveryEvent::DeliveryStatusChanged(_) => "DeliveryStatusChanged",
            DeliveryEvent::DeliveryCompleted(_) => "DeliveryCompleted",
            DeliveryEvent::DeliveryLocationUpdated(_) => "DeliveryLocationUpdated",
            DeliveryEvent::DeliveryReassigned(_) => "DeliveryReassigned",
            DeliveryEvent::DeliveryCancelled(_) => "DeliveryCancelled",
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            DeliveryEvent::DeliveryAssigned(data) => data.assigned_at,
            DeliveryEvent::DeliveryStatusChanged(data) => data.changed_at,
            DeliveryEvent::DeliveryCompleted(data) => data.completed_at,
            DeliveryEvent::DeliveryLocationUpdated(data) => data.updated_at,
            DeliveryEvent::DeliveryReassigned(data) => data.reassigned_at,
            DeliveryEvent::DeliveryCancelled(data) => data.cancelled_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryAssignedData {
    pub delivery_id: DeliveryId,
    pub tenant_id: TenantId,
    pub order_id: OrderId,
    pub courier_id: CourierId,
    pub route: Route,
    pub parcel: Parcel,
    pub estimated_arrival: DateTime<Utc>,
    pub assigned_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryStatusChangedData {
    pub delivery_id: DeliveryId,
    pub order_id: OrderId,
    pub courier_id: CourierId,
    pub from: DeliveryStatus,
    pub to: DeliveryStatus,
    pub notes: Option<String>,
    pub changed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryCompletedData {
    pub delivery_id: DeliveryId,
    pub order_id: OrderId,
    pub courier_id: CourierId,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryLocationUpdatedData {
    pub delivery_id: DeliveryId,
    pub courier_id: CourierId,
    pub location: Location,
    /// Unchanged from before the update when the delivery is completed.
    pub estimated_arrival: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryReassignedData {
    pub delivery_id: DeliveryId,
    pub order_id: OrderId,
    pub from_courier: CourierId,
    pub to_courier: CourierId,
    pub route: Route,
    pub estimated_arrival: DateTime<Utc>,
    pub reassigned_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryCancelledData {
    pub delivery_id: DeliveryId,
    pub order_id: OrderId,
    pub courier_id: CourierId,
    pub from: DeliveryStatus,
    pub reason: String,
    pub cancelled_at: DateTime<Utc>,
}

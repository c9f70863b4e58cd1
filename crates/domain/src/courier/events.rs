//! Courier profile events.

use chrono::{DateTime, Utc};
use common::{CourierId, DeliveryId, TenantId};
use geo::Location;
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;

use super::{
    ApprovalStatus, AvailabilitySchedule, CourierStatus, DeliveryCapacity, Parcel, VehicleInfo,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum CourierEvent {
    CourierRegistered(CourierRegisteredData),

    /// Approval status moved; the on-duty status follows it.
    ApprovalChanged(ApprovalChangedData),

    VehicleUpdated(VehicleUpdatedData),

    ScheduleUpdated(ScheduleUpdatedData),

    CourierStatusChanged(CourierStatusChangedData),

    CourierLocationUpdated(CourierLocationUpdatedData),

    DeliveryLoadAssigned(LoadChangedData),

    DeliveryLoadReleased(LoadChangedData),
}

impl DomainEvent for CourierEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CourierEvent::CourierRegistered(_) => "CourierRegistered",
            CourierEvent::ApprovalChanged(_) => "ApprovalChanged",
            CourierEvent::VehicleUpdated(_) => "VehicleUpdated",
            CourierEvent::ScheduleUpdated(_) => "ScheduleUpdated",
            CourierEvent::CourierStatusChanged(_) => "CourierStatusChanged",
            CourierEvent::CourierLocationUpdated(_) => "CourierLocationUpdated",
            CourierEvent::DeliveryLoadAssigned(_) => "DeliveryLoadAssigned",
            CourierEvent::DeliveryLoadReleased(_) => "DeliveryLoadReleased",
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            CourierEvent::CourierRegistered(data) => data.registered_at,
            CourierEvent::ApprovalChanged(data) => data.changed_at,
            CourierEvent::VehicleUpdated(data) => data.updated_at,
            CourierEvent::ScheduleUpdated(data) => data.updated_at,
            CourierEvent::CourierStatusChanged(data) => data.changed_at,
            CourierEvent::CourierLocationUpdated(data) => data.updated_at,
            CourierEvent::DeliveryLoadAssigned(data) | CourierEvent::DeliveryLoadReleased(data) => {
                data.at
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourierRegisteredData {
    pub courier_id: CourierId,
    pub tenant_id: TenantId,
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
    pub city: String,
    pub vehicle: VehicleInfo,
    pub capacity: DeliveryCapacity,
    pub location: Location,
    pub schedule: AvailabilitySchedule,
    pub registered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalChangedData {
    pub courier_id: CourierId,
    pub from: ApprovalStatus,
    pub to: ApprovalStatus,
    pub notes: Option<String>,
    pub changed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleUpdatedData {
    pub vehicle: VehicleInfo,
    pub capacity: DeliveryCapacity,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleUpdatedData {
    pub schedule: AvailabilitySchedule,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourierStatusChangedData {
    pub courier_id: CourierId,
    pub from: CourierStatus,
    pub to: CourierStatus,
    pub changed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourierLocationUpdatedData {
    pub courier_id: CourierId,
    pub location: Location,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadChangedData {
    pub courier_id: CourierId,
    pub delivery_id: DeliveryId,
    pub parcel: Parcel,
    pub at: DateTime<Utc>,
}

//! Courier commands.

use common::{AggregateId, CourierId, TenantId};
use geo::Location;

use crate::command::Command;

use super::{AvailabilitySchedule, CourierProfile, DeliveryCapacity, VehicleInfo};

/// Registers a courier. New couriers start `PENDING` review and `INACTIVE`.
#[derive(Debug, Clone)]
pub struct RegisterCourier {
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
}

impl RegisterCourier {
    pub fn new(
        tenant_id: TenantId,
        full_name: impl Into<String>,
        email: impl Into<String>,
        phone_number: impl Into<String>,
        city: impl Into<String>,
        vehicle: VehicleInfo,
        location: Location,
    ) -> Self {
        Self {
            courier_id: CourierId::new(),
            tenant_id,
            full_name: full_name.into(),
            email: email.into(),
            phone_number: phone_number.into(),
            city: city.into(),
            vehicle,
            capacity: DeliveryCapacity::default(),
            location,
            schedule: AvailabilitySchedule::default(),
        }
    }

    pub fn with_capacity(mut self, capacity: DeliveryCapacity) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_schedule(mut self, schedule: AvailabilitySchedule) -> Self {
        self.schedule = schedule;
        self
    }
}

impl Command for RegisterCourier {
    type Aggregate = CourierProfile;

    fn aggregate_id(&self) -> AggregateId {
        self.courier_id.into()
    }
}

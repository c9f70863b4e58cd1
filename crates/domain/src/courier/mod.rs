//! Courier profiles: onboarding approval, on-duty status, location and the
//! load a courier is carrying.

mod aggregate;
mod capacity;
mod commands;
mod events;
mod schedule;
pub mod status;
mod vehicle;

pub use aggregate::CourierProfile;
pub use capacity::{CurrentLoad, DeliveryCapacity, Parcel};
pub use commands::RegisterCourier;
pub use events::{
    ApprovalChangedData, CourierEvent, CourierLocationUpdatedData, CourierRegisteredData,
    CourierStatusChangedData, LoadChangedData, ScheduleUpdatedData, VehicleUpdatedData,
};
pub use schedule::{AvailabilitySchedule, TimeSlot};
pub use status::{ApprovalStatus, CourierStatus};
pub use vehicle::{VehicleInfo, VehicleType};

use common::DeliveryId;
use thiserror::Error;

use crate::error::ErrorKind;

#[derive(Debug, Error)]
pub enum CourierError {
    #[error("Courier is not registered")]
    NotRegistered,

    #[error("Courier already registered")]
    AlreadyRegistered,

    #[error("Cannot move courier from {from} to {to}")]
    InvalidStatusTransition {
        from: CourierStatus,
        to: CourierStatus,
    },

    #[error("Cannot change approval from {from} to {to}")]
    InvalidApprovalTransition {
        from: ApprovalStatus,
        to: ApprovalStatus,
    },

    #[error("Courier is not approved (approval status {approval})")]
    NotApproved { approval: ApprovalStatus },

    #[error("Courier cannot take deliveries while {status} ({approval})")]
    NotAvailable {
        status: CourierStatus,
        approval: ApprovalStatus,
    },

    #[error(
        "Load of {} orders, {} g, {} cm3 exceeds capacity of {} orders, {} g, {} cm3",
        .load.orders, .load.weight_grams, .load.volume_cm3,
        .capacity.max_orders(), .capacity.max_weight_grams(), .capacity.max_volume_cm3()
    )]
    CapacityExceeded {
        load: CurrentLoad,
        capacity: DeliveryCapacity,
    },

    #[error("Courier has no active deliveries")]
    NoActiveDeliveries,

    #[error("Courier is not carrying delivery {0}")]
    UnknownDelivery(DeliveryId),

    #[error("Capacity limits must all be positive")]
    InvalidCapacity,

    #[error("Invalid vehicle: {0}")]
    InvalidVehicle(String),

    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("Invalid profile: {0}")]
    InvalidProfile(String),
}

impl CourierError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CourierError::NotRegistered => ErrorKind::NotFound,
            CourierError::InvalidStatusTransition { .. }
            | CourierError::InvalidApprovalTransition { .. }
            | CourierError::NotApproved { .. }
            | CourierError::NoActiveDeliveries
            | CourierError::UnknownDelivery(_) => ErrorKind::InvalidStateTransition,
            // Both mean the courier can no longer take this parcel.
            CourierError::NotAvailable { .. } | CourierError::CapacityExceeded { .. } => {
                ErrorKind::CapacityExceeded
            }
            CourierError::AlreadyRegistered
            | CourierError::InvalidCapacity
            | CourierError::InvalidVehicle(_)
            | CourierError::InvalidSchedule(_)
            | CourierError::InvalidProfile(_) => ErrorKind::Validation,
        }
    }
}

//! Deliveries: a courier carrying one order from pickup to drop-off.

mod aggregate;
mod commands;
mod events;
pub mod status;
mod tracking;

pub use aggregate::Delivery;
pub use commands::OpenDelivery;
pub use events::{
    DeliveryAssignedData, DeliveryCancelledData, DeliveryCompletedData, DeliveryEvent,
    DeliveryLocationUpdatedData, DeliveryReassignedData, DeliveryStatusChangedData,
};
pub use status::{DeliveryEventType, DeliveryStatus};
pub use tracking::{LifecycleEntry, TrackingUpdate};

use common::CourierId;
use thiserror::Error;

use crate::error::ErrorKind;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Delivery has not been opened")]
    NotOpened,

    #[error("Delivery already opened")]
    AlreadyOpened,

    #[error("Cannot move delivery from {from} to {to}")]
    InvalidStatusTransition {
        from: DeliveryStatus,
        to: DeliveryStatus,
    },

    #[error("Delivery is already {status}")]
    AlreadyCompleted { status: DeliveryStatus },

    #[error("Cannot cancel delivery in status {status}")]
    NotCancellable { status: DeliveryStatus },

    #[error("Delivery is already assigned to courier {0}")]
    SameCourier(CourierId),
}

impl DeliveryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DeliveryError::NotOpened => ErrorKind::NotFound,
            DeliveryError::InvalidStatusTransition { .. }
            | DeliveryError::AlreadyCompleted { .. }
            | DeliveryError::NotCancellable { .. } => ErrorKind::InvalidStateTransition,
            DeliveryError::AlreadyOpened | DeliveryError::SameCourier(_) => ErrorKind::Validation,
        }
    }
}

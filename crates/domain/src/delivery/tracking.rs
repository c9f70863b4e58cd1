//! Lifecycle log entries and the tracking snapshot shown to customers.

use chrono::{DateTime, Duration, Utc};
use common::{CourierId, DeliveryId};
use geo::Location;
use serde::{Deserialize, Serialize};

use super::{Delivery, DeliveryEventType, DeliveryStatus};

/// One line of a delivery's append-only lifecycle log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifecycleEntry {
    pub event_type: DeliveryEventType,
    pub location: Location,
    pub notes: Option<String>,
    pub at: DateTime<Utc>,
}

/// Where a delivery stands right now.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingUpdate {
    pub delivery_id: DeliveryId,
    pub courier_id: CourierId,
    pub current_location: Location,
    pub status: DeliveryStatus,
    pub estimated_arrival: Option<DateTime<Utc>>,
    pub time_to_arrival: Duration,
    pub progress: f64,
    pub is_overdue: bool,
    pub status_message: &'static str,
    pub timestamp: DateTime<Utc>,
}

impl TrackingUpdate {
    /// `None` for a delivery that was never opened.
    pub fn from_delivery(delivery: &Delivery, now: DateTime<Utc>) -> Option<Self> {
        Some(Self {
            delivery_id: delivery.delivery_id()?,
            courier_id: delivery.courier_id()?,
            current_location: delivery.current_location()?,
            status: delivery.status(),
            estimated_arrival: delivery.estimated_arrival(),
            time_to_arrival: delivery.time_to_arrival(now),
            progress: delivery.progress(),
            is_overdue: delivery.is_overdue(now),
            status_message: delivery.status().status_message(),
            timestamp: now,
        })
    }

    pub fn is_in_transit(&self) -> bool {
        super::status::is_active(self.status)
    }
}

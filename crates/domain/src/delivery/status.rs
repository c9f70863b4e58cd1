//! Delivery statuses, their edges and the lifecycle log vocabulary.
//!
//! ```text
//! ASSIGNED ─► EN_ROUTE_TO_PICKUP ─► ARRIVED_AT_PICKUP ─► IN_TRANSIT ─► ARRIVED_AT_DELIVERY ─► DELIVERED
//!    └──────────────┴──────────────────────┴─► CANCELLED      └──────────────┴─► FAILED
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    #[default]
    Assigned,
    EnRouteToPickup,
    ArrivedAtPickup,
    InTransit,
    ArrivedAtDelivery,
    Delivered,
    Cancelled,
    Failed,
}

use DeliveryStatus::*;

pub const ALL_DELIVERY_STATUSES: [DeliveryStatus; 8] = [
    Assigned,
    EnRouteToPickup,
    ArrivedAtPickup,
    InTransit,
    ArrivedAtDelivery,
    Delivered,
    Cancelled,
    Failed,
];

/// Adjacency table: each status with the statuses it may move to.
pub const DELIVERY_TRANSITIONS: [(DeliveryStatus, &[DeliveryStatus]); 8] = [
    (Assigned, &[EnRouteToPickup, Cancelled]),
    (EnRouteToPickup, &[ArrivedAtPickup, Cancelled]),
    (ArrivedAtPickup, &[InTransit, Cancelled]),
    (InTransit, &[ArrivedAtDelivery, Failed]),
    (ArrivedAtDelivery, &[Delivered, Failed]),
    (Delivered, &[]),
    (Cancelled, &[]),
    (Failed, &[]),
];

/// Empty for a completed delivery.
pub fn next_statuses(from: DeliveryStatus) -> &'static [DeliveryStatus] {
    DELIVERY_TRANSITIONS
        .iter()
        .find(|(status, _)| *status == from)
        .map(|(_, next)| *next)
        .unwrap_or(&[])
}

pub fn is_listed_transition(from: DeliveryStatus, to: DeliveryStatus) -> bool {
    next_statuses(from).contains(&to)
}

/// Delivered, cancelled or failed. Nothing moves a completed delivery.
pub fn is_completed(status: DeliveryStatus) -> bool {
    matches!(status, Delivered | Cancelled | Failed)
}

pub fn is_active(status: DeliveryStatus) -> bool {
    !is_completed(status)
}

/// Cancellation is only possible before the parcel is picked up.
pub fn is_cancellable(status: DeliveryStatus) -> bool {
    matches!(status, Assigned | EnRouteToPickup | ArrivedAtPickup)
}

/// Share of the journey done, for client progress bars.
pub fn progress(status: DeliveryStatus) -> f64 {
    match status {
        Assigned => 0.0,
        EnRouteToPickup => 0.2,
        ArrivedAtPickup => 0.4,
        InTransit => 0.7,
        ArrivedAtDelivery => 0.9,
        Delivered => 1.0,
        Cancelled | Failed => 0.0,
    }
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Assigned => "ASSIGNED",
            EnRouteToPickup => "EN_ROUTE_TO_PICKUP",
            ArrivedAtPickup => "ARRIVED_AT_PICKUP",
            InTransit => "IN_TRANSIT",
            ArrivedAtDelivery => "ARRIVED_AT_DELIVERY",
            Delivered => "DELIVERED",
            Cancelled => "CANCELLED",
            Failed => "FAILED",
        }
    }

    /// Customer-facing one-liner.
    pub fn status_message(&self) -> &'static str {
        match self {
            Assigned => "Delivery assigned and ready to start",
            EnRouteToPickup => "Courier is on the way to the pickup location",
            ArrivedAtPickup => "Courier has arrived at the pickup location",
            InTransit => "Order picked up and on the way to you",
            ArrivedAtDelivery => "Courier has arrived at your location",
            Delivered => "Order delivered successfully",
            Cancelled => "Delivery has been cancelled",
            Failed => "Delivery failed, please contact support",
        }
    }
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entry types of a delivery's lifecycle log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryEventType {
    Assigned,
    EnRouteToPickup,
    ArrivedAtPickup,
    PickedUp,
    ArrivedAtDelivery,
    Delivered,
    Cancelled,
    Failed,
    Reassigned,
    LocationUpdated,
}

impl DeliveryEventType {
    /// The log entry written when a delivery enters `status`.
    pub fn for_status(status: DeliveryStatus) -> Self {
        match status {
            Assigned => DeliveryEventType::Assigned,
            EnRouteToPickup => DeliveryEventType::EnRouteToPickup,
            ArrivedAtPickup => DeliveryEventType::ArrivedAtPickup,
            InTransit => DeliveryEventType::PickedUp,
            ArrivedAtDelivery => DeliveryEventType::ArrivedAtDelivery,
            Delivered => DeliveryEventType::Delivered,
            Cancelled => DeliveryEventType::Cancelled,
            Failed => DeliveryEventType::Failed,
        }
    }

    pub fn is_milestone(&self) -> bool {
        matches!(
            self,
            DeliveryEventType::Assigned
                | DeliveryEventType::PickedUp
                | DeliveryEventType::Delivered
                | DeliveryEventType::Cancelled
                | DeliveryEventType::Failed
        )
    }

    pub fn is_completion(&self) -> bool {
        matches!(
            self,
            DeliveryEventType::Delivered | DeliveryEventType::Cancelled | DeliveryEventType::Failed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_status_has_a_row() {
        for status in ALL_DELIVERY_STATUSES {
            assert!(DELIVERY_TRANSITIONS.iter().any(|(s, _)| *s == status));
        }
    }

    #[test]
    fn happy_path_is_listed() {
        let path = [
            Assigned,
            EnRouteToPickup,
            ArrivedAtPickup,
            InTransit,
            ArrivedAtDelivery,
            Delivered,
        ];
        for pair in path.windows(2) {
            assert!(is_listed_transition(pair[0], pair[1]), "{:?}", pair);
        }
    }

    #[test]
    fn completed_statuses_are_sinks() {
        for status in ALL_DELIVERY_STATUSES.into_iter().filter(|s| is_completed(*s)) {
            assert!(next_statuses(status).is_empty(), "{status}");
        }
    }

    #[test]
    fn cancellable_statuses_match_table() {
        for status in ALL_DELIVERY_STATUSES {
            assert_eq!(
                is_cancellable(status),
                is_listed_transition(status, Cancelled),
                "{status}"
            );
        }
    }

    #[test]
    fn failure_only_after_pickup() {
        assert!(!is_listed_transition(Assigned, Failed));
        assert!(!is_listed_transition(ArrivedAtPickup, Failed));
        assert!(is_listed_transition(InTransit, Failed));
        assert!(is_listed_transition(ArrivedAtDelivery, Failed));
    }

    #[test]
    fn progress_is_monotonic_along_happy_path() {
        let path = [
            Assigned,
            EnRouteToPickup,
            ArrivedAtPickup,
            InTransit,
            ArrivedAtDelivery,
            Delivered,
        ];
        for pair in path.windows(2) {
            assert!(progress(pair[0]) < progress(pair[1]));
        }
        assert_eq!(progress(Cancelled), 0.0);
        assert_eq!(progress(Failed), 0.0);
    }

    #[test]
    fn picking_up_is_logged_as_picked_up() {
        assert_eq!(
            DeliveryEventType::for_status(InTransit),
            DeliveryEventType::PickedUp
        );
        assert!(DeliveryEventType::PickedUp.is_milestone());
        assert!(!DeliveryEventType::LocationUpdated.is_milestone());
        assert!(DeliveryEventType::Failed.is_completion());
        assert!(!DeliveryEventType::Reassigned.is_completion());
    }
}

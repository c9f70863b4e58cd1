//! Order statuses and the table of edges that may ever exist between them.
//!
//! ```text
//! PENDING ─► PAYMENT_PROCESSING ─► PAYMENT_CONFIRMED ─► PREPARING ─► READY_FOR_PICKUP ─► OUT_FOR_DELIVERY ─► DELIVERED
//!    └──────────────────────────────────►┘                                                      └──────────► FAILED
//!
//! any non-terminal status ─► CANCELLED        DELIVERED | CANCELLED | FAILED ─► REFUNDED
//! ```
//!
//! Merchant rules may forbid an edge listed here, never allow one that is
//! missing.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    PaymentProcessing,
    PaymentConfirmed,
    Preparing,
    ReadyForPickup,
    OutForDelivery,
    Delivered,
    Cancelled,
    Refunded,
    Failed,
}

use OrderStatus::*;

/// Every status, in lifecycle order.
pub const ALL_ORDER_STATUSES: [OrderStatus; 10] = [
    Pending,
    PaymentProcessing,
    PaymentConfirmed,
    Preparing,
    ReadyForPickup,
    OutForDelivery,
    Delivered,
    Cancelled,
    Refunded,
    Failed,
];

/// Adjacency table: each status with the statuses it may move to.
pub const ORDER_TRANSITIONS: [(OrderStatus, &[OrderStatus]); 10] = [
    (Pending, &[PaymentProcessing, PaymentConfirmed, Cancelled]),
    (PaymentProcessing, &[PaymentConfirmed, Cancelled]),
    (PaymentConfirmed, &[Preparing, Cancelled]),
    (Preparing, &[ReadyForPickup, Cancelled]),
    (ReadyForPickup, &[OutForDelivery, Cancelled]),
    (OutForDelivery, &[Delivered, Failed, Cancelled]),
    (Delivered, &[Refunded]),
    (Cancelled, &[Refunded]),
    (Failed, &[Refunded]),
    (Refunded, &[]),
];

/// Statuses reachable from `from` in one step, before merchant rules.
pub fn next_statuses(from: OrderStatus) -> &'static [OrderStatus] {
    ORDER_TRANSITIONS
        .iter()
        .find(|(status, _)| *status == from)
        .map(|(_, next)| *next)
        .unwrap_or(&[])
}

pub fn is_listed_transition(from: OrderStatus, to: OrderStatus) -> bool {
    next_statuses(from).contains(&to)
}

/// The order has reached an outcome; only a refund may follow.
pub fn is_terminal(status: OrderStatus) -> bool {
    matches!(status, Delivered | Cancelled | Refunded | Failed)
}

pub fn is_active(status: OrderStatus) -> bool {
    !is_terminal(status)
}

pub fn allows_refund(status: OrderStatus) -> bool {
    matches!(status, Delivered | Cancelled | Failed)
}

pub fn requires_merchant_action(status: OrderStatus) -> bool {
    matches!(status, PaymentConfirmed | Preparing)
}

pub fn requires_courier_action(status: OrderStatus) -> bool {
    matches!(status, ReadyForPickup | OutForDelivery)
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Pending => "PENDING",
            PaymentProcessing => "PAYMENT_PROCESSING",
            PaymentConfirmed => "PAYMENT_CONFIRMED",
            Preparing => "PREPARING",
            ReadyForPickup => "READY_FOR_PICKUP",
            OutForDelivery => "OUT_FOR_DELIVERY",
            Delivered => "DELIVERED",
            Cancelled => "CANCELLED",
            Refunded => "REFUNDED",
            Failed => "FAILED",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Pending => "Order received, awaiting payment",
            PaymentProcessing => "Payment is being processed",
            PaymentConfirmed => "Payment confirmed, awaiting merchant",
            Preparing => "Merchant is preparing the order",
            ReadyForPickup => "Ready for courier pickup",
            OutForDelivery => "Courier is on the way",
            Delivered => "Order delivered",
            Cancelled => "Order cancelled",
            Refunded => "Payment refunded",
            Failed => "Delivery failed",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

//! Order aggregate, its status table and the rule-driven state machine.

mod aggregate;
mod commands;
mod events;
mod state_machine;
pub mod status;
mod value_objects;
mod workflow;

pub use aggregate::Order;
pub use commands::*;
pub use events::{
    OrderCancelledData, OrderEvent, OrderPlacedData, OrderRefundedData, OrderStatusChangedData,
    PaymentUpdatedData,
};
pub use state_machine::OrderStateMachine;
pub use status::{ALL_ORDER_STATUSES, ORDER_TRANSITIONS, OrderStatus};
pub use value_objects::{
    CancellationReason, DeliveryAddress, Money, OrderItem, PaymentInfo, PaymentMethod,
    PaymentStatus, ProductId,
};
pub use workflow::OrderWorkflow;

use thiserror::Error;

use crate::error::ErrorKind;

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Cannot transition order from {from} to {to}: {reason}")]
    InvalidStateTransition {
        from: OrderStatus,
        to: OrderStatus,
        reason: String,
    },

    #[error("Refund not allowed: {reason}")]
    RefundNotAllowed { reason: String },

    #[error("Order has not been placed")]
    NotPlaced,

    #[error("Order already placed")]
    AlreadyPlaced,

    #[error("Order has no items")]
    NoItems,

    #[error("Invalid quantity for {product_id} (must be greater than 0)")]
    InvalidQuantity { product_id: String },

    #[error("Invalid price {price} for {product_id} (must be greater than 0)")]
    InvalidPrice { product_id: String, price: Money },

    #[error("Payment amount {actual} does not match order total {expected}")]
    PaymentAmountMismatch { expected: Money, actual: Money },
}

impl OrderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrderError::InvalidStateTransition { .. } => ErrorKind::InvalidStateTransition,
            OrderError::RefundNotAllowed { .. } => ErrorKind::RefundNotAllowed,
            OrderError::NotPlaced => ErrorKind::NotFound,
            OrderError::AlreadyPlaced
            | OrderError::NoItems
            | OrderError::InvalidQuantity { .. }
            | OrderError::InvalidPrice { .. }
            | OrderError::PaymentAmountMismatch { .. } => ErrorKind::Validation,
        }
    }
}

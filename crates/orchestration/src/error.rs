//! Orchestration error types.

use common::OrderId;
use domain::{DomainError, ErrorKind};
use event_store::EventStoreError;
use geo::GeoError;
use projections::ProjectionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrchestrationError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Projection error: {0}")]
    Projection(#[from] ProjectionError),

    #[error("Routing error: {0}")]
    Geo(#[from] GeoError),

    /// No courier could take the order after every allowed attempt.
    #[error("No eligible courier for order {order_id} ({candidates} candidates tried)")]
    NoEligibleCourier { order_id: OrderId, candidates: usize },

    /// The order has no drop-off coordinates to dispatch to.
    #[error("Order {0} has no drop-off location")]
    MissingDropoff(OrderId),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Telemetry error: {0}")]
    Telemetry(String),
}

impl From<EventStoreError> for OrchestrationError {
    fn from(err: EventStoreError) -> Self {
        OrchestrationError::Domain(DomainError::from(err))
    }
}

impl OrchestrationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrchestrationError::Domain(e) => e.kind(),
            OrchestrationError::NoEligibleCourier { .. } => ErrorKind::NoEligibleCourier,
            OrchestrationError::Geo(_)
            | OrchestrationError::MissingDropoff(_)
            | OrchestrationError::Config(_) => ErrorKind::Validation,
            OrchestrationError::Projection(_) | OrchestrationError::Telemetry(_) => {
                ErrorKind::Infrastructure
            }
        }
    }

    pub fn is_conflict(&self) -> bool {
        self.kind() == ErrorKind::ConcurrentModificationConflict
    }
}

/// Convenience type alias for orchestration results.
pub type Result<T> = std::result::Result<T, OrchestrationError>;

//! Domain error types.

use event_store::EventStoreError;
use thiserror::Error;

use crate::courier::CourierError;
use crate::delivery::DeliveryError;
use crate::merchant::RulesError;
use crate::order::OrderError;

/// Coarse classification callers use to map failures to responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Illegal status edge, or an edge the merchant's rules forbid.
    InvalidStateTransition,
    NotFound,
    CapacityExceeded,
    NoEligibleCourier,
    RefundNotAllowed,
    /// Another writer committed to the same aggregate first.
    ConcurrentModificationConflict,
    /// Malformed input such as an empty order.
    Validation,
    Infrastructure,
}

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Event store error: {0}")]
    EventStore(#[from] EventStoreError),

    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    #[error("Delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    #[error("Courier error: {0}")]
    Courier(#[from] CourierError),

    #[error("Workflow rules error: {0}")]
    Rules(#[from] RulesError),

    #[error("Aggregate not found: {aggregate_type} with id {aggregate_id}")]
    AggregateNotFound {
        aggregate_type: &'static str,
        aggregate_id: String,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DomainError {
    pub fn not_found(aggregate_type: &'static str, aggregate_id: impl ToString) -> Self {
        DomainError::AggregateNotFound {
            aggregate_type,
            aggregate_id: aggregate_id.to_string(),
        }
    }

    /// Coarse category for callers. Only conflicts are worth retrying.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::EventStore(e) if e.is_conflict() => {
                ErrorKind::ConcurrentModificationConflict
            }
            DomainError::EventStore(_) | DomainError::Serialization(_) => {
                ErrorKind::Infrastructure
            }
            DomainError::Order(e) => e.kind(),
            DomainError::Delivery(e) => e.kind(),
            DomainError::Courier(e) => e.kind(),
            DomainError::Rules(e) => e.kind(),
            DomainError::AggregateNotFound { .. } => ErrorKind::NotFound,
        }
    }

    pub fn is_conflict(&self) -> bool {
        self.kind() == ErrorKind::ConcurrentModificationConflict
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::AggregateId;
    use event_store::Version;

    #[test]
    fn store_conflicts_are_classified_as_concurrent_modification() {
        let err = DomainError::from(EventStoreError::ConcurrencyConflict {
            aggregate_id: AggregateId::new(),
            expected: Version::first(),
            actual: Version::new(2),
        });
        assert!(err.is_conflict());
    }

    #[test]
    fn missing_aggregate_is_not_found() {
        let err = DomainError::not_found("Delivery", "abc");
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(
            err.to_string(),
            "Aggregate not found: Delivery with id abc"
        );
    }
}

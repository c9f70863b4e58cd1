//! Core projection trait and position tracking.

use async_trait::async_trait;
use event_store::EventEnvelope;

use crate::Result;

/// The last global sequence number a projection has applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct ProjectionPosition {
    pub last_sequence: u64,
}

impl ProjectionPosition {
    pub fn zero() -> Self {
        Self { last_sequence: 0 }
    }

    /// Moves to `sequence`; never moves backwards.
    pub fn advance_to(&self, sequence: u64) -> Self {
        Self {
            last_sequence: self.last_sequence.max(sequence),
        }
    }

    pub fn has_seen(&self, sequence: u64) -> bool {
        sequence <= self.last_sequence
    }
}

impl std::fmt::Display for ProjectionPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "position({})", self.last_sequence)
    }
}

/// A projection that processes events and updates a read model.
///
/// Handlers must tolerate events for aggregates they do not track; they
/// still advance their position past them.
#[async_trait]
pub trait Projection: Send + Sync {
    fn name(&self) -> &'static str;

    /// Handles a single committed event, updating the read model.
    async fn handle(&self, event: &EventEnvelope) -> Result<()>;

    async fn position(&self) -> ProjectionPosition;

    /// Resets the projection to its initial state.
    async fn reset(&self) -> Result<()>;
}

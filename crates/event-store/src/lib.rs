//! Event storage for the orchestration core.
//!
//! Each aggregate owns one stream, addressed by [`AggregateId`]. Appends are
//! guarded by an expected [`Version`] so that two writers racing on the same
//! aggregate cannot both commit. Every committed event is also published to
//! subscribers, which is how status-change signals leave the core.

pub mod error;
pub mod event;
pub mod memory;
pub mod query;
pub mod snapshot;
pub mod store;

pub use common::{AggregateId, TenantId};
pub use error::{EventStoreError, Result};
pub use event::{EventEnvelope, EventEnvelopeBuilder, EventId, Version};
pub use memory::InMemoryEventStore;
pub use query::EventQuery;
pub use snapshot::Snapshot;
pub use store::{AppendOptions, EventStore, EventStoreExt, EventStream};

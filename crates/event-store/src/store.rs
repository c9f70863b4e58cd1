use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;
use tokio::sync::broadcast;

use crate::{AggregateId, EventEnvelope, EventQuery, EventStoreError, Result, Snapshot, Version};

/// Concurrency expectations for an append.
#[derive(Debug, Clone, Default)]
pub struct AppendOptions {
    /// Version the stream must be at for the append to succeed.
    /// `None` skips the check.
    pub expected_version: Option<Version>,
}

impl AppendOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Optimistic concurrency: the append fails with a conflict unless the
    /// stream is exactly at `version`.
    pub fn expect_version(version: Version) -> Self {
        Self {
            expected_version: Some(version),
        }
    }

    /// The stream must not exist yet.
    pub fn expect_new() -> Self {
        Self::expect_version(Version::initial())
    }
}

pub type EventStream = Pin<Box<dyn Stream<Item = Result<EventEnvelope>> + Send>>;

/// Persistence port for aggregate event streams.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Atomically appends a batch to one stream and returns the new version.
    ///
    /// Fails with [`EventStoreError::ConcurrencyConflict`] when
    /// `options.expected_version` does not match the stream.
    async fn append(&self, events: Vec<EventEnvelope>, options: AppendOptions) -> Result<Version>;

    /// Events of one stream in version order.
    async fn load_stream(&self, aggregate_id: AggregateId) -> Result<Vec<EventEnvelope>>;

    /// Events of one stream with version >= `from_version`.
    async fn load_stream_from(
        &self,
        aggregate_id: AggregateId,
        from_version: Version,
    ) -> Result<Vec<EventEnvelope>>;

    /// Events matching `query`, in commit order.
    async fn query(&self, query: EventQuery) -> Result<Vec<EventEnvelope>>;

    /// Every event in commit order.
    async fn stream_all(&self) -> Result<EventStream>;

    /// `None` when the stream has never been written.
    async fn stream_version(&self, aggregate_id: AggregateId) -> Result<Option<Version>>;

    /// Replaces any previous snapshot of the aggregate.
    async fn save_snapshot(&self, snapshot: Snapshot) -> Result<()>;

    /// `None` when no snapshot was ever saved for the aggregate.
    async fn latest_snapshot(&self, aggregate_id: AggregateId) -> Result<Option<Snapshot>>;

    /// Receives every event committed after the call.
    fn subscribe(&self) -> broadcast::Receiver<EventEnvelope>;
}

#[async_trait]
pub trait EventStoreExt: EventStore {
    async fn stream_exists(&self, aggregate_id: AggregateId) -> Result<bool> {
        Ok(self.stream_version(aggregate_id).await?.is_some())
    }

    /// The latest snapshot, if any, plus the events recorded after it.
    async fn load_with_snapshot(
        &self,
        aggregate_id: AggregateId,
    ) -> Result<(Option<Snapshot>, Vec<EventEnvelope>)> {
        match self.latest_snapshot(aggregate_id).await? {
            Some(snapshot) => {
                let events = self
                    .load_stream_from(aggregate_id, snapshot.version.next())
                    .await?;
                Ok((Some(snapshot), events))
            }
            None => Ok((None, self.load_stream(aggregate_id).await?)),
        }
    }
}

impl<T: EventStore + ?Sized> EventStoreExt for T {}

/// Checks that a batch targets a single stream with consecutive versions.
pub fn validate_batch(events: &[EventEnvelope]) -> Result<()> {
    let Some(first) = events.first() else {
        return Err(EventStoreError::InvalidAppend(
            "cannot append an empty batch".to_string(),
        ));
    };

    let mut expected_version = first.version;
    for event in &events[1..] {
        if event.aggregate_id != first.aggregate_id || event.aggregate_type != first.aggregate_type
        {
            return Err(EventStoreError::InvalidAppend(
                "all events in a batch must target the same stream".to_string(),
            ));
        }
        expected_version = expected_version.next();
        if event.version != expected_version {
            return Err(EventStoreError::InvalidAppend(format!(
                "versions must be consecutive: expected {expected_version}, got {}",
                event.version
            )));
        }
    }

    Ok(())
}

//! Projection processor for feeding events to projections.

use event_store::{EventEnvelope, EventQuery, EventStore};
use futures_util::StreamExt;
use tokio::sync::Mutex;

use crate::Result;
use crate::projection::{Projection, ProjectionPosition};

/// Processes events from an event store and delivers them to projections.
///
/// The processor supports:
/// - Catch-up: delivers everything committed since the slowest projection's
///   position, so queries can be answered from up-to-date views
/// - Single event delivery, e.g. from a store subscription
/// - Rebuild: resets all projections and replays from scratch
///
/// Catch-up runs are serialized; a projection never sees an event twice.
pub struct ProjectionProcessor<S: EventStore> {
    store: S,
    projections: Vec<Box<dyn Projection>>,
    catch_up: Mutex<()>,
}

impl<S: EventStore> ProjectionProcessor<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            projections: Vec::new(),
            catch_up: Mutex::new(()),
        }
    }

    pub fn register(&mut self, projection: Box<dyn Projection>) {
        self.projections.push(projection);
    }

    pub fn projection_count(&self) -> usize {
        self.projections.len()
    }

    /// Delivers every committed event the projections have not seen yet.
    ///
    /// Returns the number of events read from the store.
    #[tracing::instrument(skip(self))]
    pub async fn run_catch_up(&self) -> Result<usize> {
        let _guard = self.catch_up.lock().await;

        let from = self.slowest_position().await;
        let events = self
            .store
            .query(EventQuery::new().after_sequence(from.last_sequence))
            .await?;

        for event in &events {
            self.deliver(event).await?;
        }

        if !events.is_empty() {
            tracing::debug!(events = events.len(), from = %from, "catch-up complete");
        }

        Ok(events.len())
    }

    /// Delivers a single event to every projection that has not seen it.
    #[tracing::instrument(skip(self, event), fields(event_type = %event.event_type))]
    pub async fn process_event(&self, event: &EventEnvelope) -> Result<()> {
        let _guard = self.catch_up.lock().await;
        self.deliver(event).await
    }

    /// Resets all projections and replays all events from the store.
    #[tracing::instrument(skip(self))]
    pub async fn rebuild_all(&self) -> Result<()> {
        let _guard = self.catch_up.lock().await;

        for projection in &self.projections {
            projection.reset().await?;
        }

        let mut stream = self.store.stream_all().await?;
        let mut replayed: u64 = 0;
        while let Some(result) = stream.next().await {
            self.deliver(&result?).await?;
            replayed += 1;
        }

        tracing::info!(events_replayed = replayed, "projections rebuilt");
        Ok(())
    }

    async fn deliver(&self, event: &EventEnvelope) -> Result<()> {
        for projection in &self.projections {
            if !projection.position().await.has_seen(event.sequence) {
                projection.handle(event).await?;
                metrics::counter!("projections_events_processed", "projection" => projection.name())
                    .increment(1);
            }
        }
        Ok(())
    }

    async fn slowest_position(&self) -> ProjectionPosition {
        let mut slowest: Option<ProjectionPosition> = None;
        for projection in &self.projections {
            let position = projection.position().await;
            slowest = Some(slowest.map_or(position, |s| s.min(position)));
        }
        slowest.unwrap_or_default()
    }
}

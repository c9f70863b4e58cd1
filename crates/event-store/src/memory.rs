use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{RwLock, broadcast};

use crate::store::{AppendOptions, EventStore, EventStream, validate_batch};
use crate::{AggregateId, EventEnvelope, EventQuery, EventStoreError, Result, Snapshot, Version};

const SUBSCRIPTION_BUFFER: usize = 1024;

#[derive(Default)]
struct Log {
    /// Committed events in commit order; `events[i].sequence == i + 1`.
    events: Vec<EventEnvelope>,
    /// Indices into `events` per stream, in version order.
    streams: HashMap<AggregateId, Vec<usize>>,
    snapshots: HashMap<AggregateId, Snapshot>,
}

impl Log {
    fn stream_version(&self, aggregate_id: &AggregateId) -> Version {
        self.streams
            .get(aggregate_id)
            .and_then(|indices| indices.last())
            .map(|&i| self.events[i].version)
            .unwrap_or_default()
    }

    fn stream_events(&self, aggregate_id: &AggregateId) -> impl Iterator<Item = &EventEnvelope> {
        self.streams
            .get(aggregate_id)
            .into_iter()
            .flatten()
            .map(|&i| &self.events[i])
    }
}

/// Event store kept entirely in memory.
///
/// Clones share the same log. The write lock is held for the whole
/// check-and-append, which makes the version check atomic.
#[derive(Clone)]
pub struct InMemoryEventStore {
    log: Arc<RwLock<Log>>,
    publisher: broadcast::Sender<EventEnvelope>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        let (publisher, _) = broadcast::channel(SUBSCRIPTION_BUFFER);
        Self {
            log: Arc::new(RwLock::new(Log::default())),
            publisher,
        }
    }

    /// Total events across all streams.
    pub async fn event_count(&self) -> usize {
        self.log.read().await.events.len()
    }
}

impl Default for InMemoryEventStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(&self, events: Vec<EventEnvelope>, options: AppendOptions) -> Result<Version> {
        validate_batch(&events)?;
        let aggregate_id = events[0].aggregate_id;
        let first_version = events[0].version;

        let mut log = self.log.write().await;
        let current = log.stream_version(&aggregate_id);

        if let Some(expected) = options.expected_version
            && expected != current
        {
            metrics::counter!("event_store_conflicts_total").increment(1);
            tracing::debug!(%aggregate_id, %expected, actual = %current, "append rejected");
            return Err(EventStoreError::ConcurrencyConflict {
                aggregate_id,
                expected,
                actual: current,
            });
        }

        if first_version != current.next() {
            return Err(EventStoreError::ConcurrencyConflict {
                aggregate_id,
                expected: first_version,
                actual: current,
            });
        }

        let mut committed = Vec::with_capacity(events.len());
        let mut last_version = current;
        for mut event in events {
            let index = log.events.len();
            event.sequence = index as u64 + 1;
            last_version = event.version;
            log.streams.entry(aggregate_id).or_default().push(index);
            log.events.push(event.clone());
            committed.push(event);
        }
        drop(log);

        metrics::counter!("event_store_events_appended_total").increment(committed.len() as u64);
        for event in committed {
            // No subscribers is not an error.
            let _ = self.publisher.send(event);
        }

        Ok(last_version)
    }

    async fn load_stream(&self, aggregate_id: AggregateId) -> Result<Vec<EventEnvelope>> {
        let log = self.log.read().await;
        Ok(log.stream_events(&aggregate_id).cloned().collect())
    }

    async fn load_stream_from(
        &self,
        aggregate_id: AggregateId,
        from_version: Version,
    ) -> Result<Vec<EventEnvelope>> {
        let log = self.log.read().await;
        Ok(log
            .stream_events(&aggregate_id)
            .filter(|e| e.version >= from_version)
            .cloned()
            .collect())
    }

    async fn query(&self, query: EventQuery) -> Result<Vec<EventEnvelope>> {
        let log = self.log.read().await;
        let matching = log.events.iter().filter(|e| query.matches(e)).cloned();
        Ok(match query.limit {
            Some(limit) => matching.take(limit).collect(),
            None => matching.collect(),
        })
    }

    async fn stream_all(&self) -> Result<EventStream> {
        let events = self.log.read().await.events.clone();
        Ok(Box::pin(futures_util::stream::iter(
            events.into_iter().map(Ok),
        )))
    }

    async fn stream_version(&self, aggregate_id: AggregateId) -> Result<Option<Version>> {
        let log = self.log.read().await;
        Ok(log
            .streams
            .contains_key(&aggregate_id)
            .then(|| log.stream_version(&aggregate_id)))
    }

    async fn save_snapshot(&self, snapshot: Snapshot) -> Result<()> {
        let mut log = self.log.write().await;
        log.snapshots.insert(snapshot.aggregate_id, snapshot);
        Ok(())
    }

    async fn latest_snapshot(&self, aggregate_id: AggregateId) -> Result<Option<Snapshot>> {
        Ok(self.log.read().await.snapshots.get(&aggregate_id).cloned())
    }

    fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.publisher.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EventStoreExt, TenantId};
    use chrono::Utc;

    fn event(aggregate_id: AggregateId, version: u64, event_type: &str) -> EventEnvelope {
        EventEnvelope::builder()
            .aggregate_id(aggregate_id)
            .aggregate_type("Delivery")
            .event_type(event_type)
            .version(Version::new(version))
            .payload_raw(serde_json::json!({"test": true}))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn append_assigns_global_sequence() {
        let store = InMemoryEventStore::new();
        let a = AggregateId::new();
        let b = AggregateId::new();

        store
            .append(vec![event(a, 1, "A1"), event(a, 2, "A2")], AppendOptions::expect_new())
            .await
            .unwrap();
        store
            .append(vec![event(b, 1, "B1")], AppendOptions::expect_new())
            .await
            .unwrap();

        let all = store.query(EventQuery::new()).await.unwrap();
        let sequences: Vec<u64> = all.iter().map(|e| e.sequence).collect();
        assert_eq!(sequences, vec![1, 2, 3]);
        assert_eq!(store.event_count().await, 3);
    }

    #[tokio::test]
    async fn stale_expected_version_is_a_conflict() {
        let store = InMemoryEventStore::new();
        let id = AggregateId::new();
        store
            .append(vec![event(id, 1, "E1")], AppendOptions::expect_new())
            .await
            .unwrap();

        let result = store
            .append(vec![event(id, 2, "E2")], AppendOptions::expect_new())
            .await;

        match result {
            Err(EventStoreError::ConcurrencyConflict {
                expected, actual, ..
            }) => {
                assert_eq!(expected, Version::initial());
                assert_eq!(actual, Version::first());
            }
            other => panic!("expected conflict, got {other:?}"),
        }
        assert_eq!(store.load_stream(id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn version_gap_is_rejected_even_without_expectation() {
        let store = InMemoryEventStore::new();
        let id = AggregateId::new();

        let result = store
            .append(vec![event(id, 3, "E3")], AppendOptions::new())
            .await;
        assert!(matches!(
            result,
            Err(EventStoreError::ConcurrencyConflict { .. })
        ));
    }

    #[tokio::test]
    async fn concurrent_writers_only_one_wins() {
        let store = InMemoryEventStore::new();
        let id = AggregateId::new();
        store
            .append(vec![event(id, 1, "E1")], AppendOptions::expect_new())
            .await
            .unwrap();

        let s1 = store.clone();
        let s2 = store.clone();
        let first = tokio::spawn(async move {
            s1.append(
                vec![event(id, 2, "Left")],
                AppendOptions::expect_version(Version::first()),
            )
            .await
        });
        let second = tokio::spawn(async move {
            s2.append(
                vec![event(id, 2, "Right")],
                AppendOptions::expect_version(Version::first()),
            )
            .await
        });

        let outcomes = [first.await.unwrap(), second.await.unwrap()];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(
            store.stream_version(id).await.unwrap(),
            Some(Version::new(2))
        );
    }

    #[tokio::test]
    async fn load_stream_from_version() {
        let store = InMemoryEventStore::new();
        let id = AggregateId::new();
        store
            .append(
                vec![event(id, 1, "E1"), event(id, 2, "E2"), event(id, 3, "E3")],
                AppendOptions::new(),
            )
            .await
            .unwrap();

        let tail = store.load_stream_from(id, Version::new(2)).await.unwrap();
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].version, Version::new(2));
    }

    #[tokio::test]
    async fn query_by_tenant_and_time() {
        let store = InMemoryEventStore::new();
        let tenant = TenantId::new();
        let now = Utc::now();

        let tenanted = EventEnvelope::builder()
            .aggregate_id(AggregateId::new())
            .aggregate_type("Order")
            .event_type("OrderPlaced")
            .tenant_id(Some(tenant))
            .version(Version::first())
            .occurred_at(now)
            .payload_raw(serde_json::json!({}))
            .build()
            .unwrap();
        store
            .append(vec![tenanted], AppendOptions::expect_new())
            .await
            .unwrap();
        store
            .append(
                vec![event(AggregateId::new(), 1, "OrderPlaced")],
                AppendOptions::expect_new(),
            )
            .await
            .unwrap();

        let query = EventQuery::new()
            .tenant(tenant)
            .between(now - chrono::Duration::seconds(1), now + chrono::Duration::seconds(1));
        let results = store.query(query).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].tenant_id, Some(tenant));
    }

    #[tokio::test]
    async fn stream_version_and_existence() {
        let store = InMemoryEventStore::new();
        let id = AggregateId::new();
        assert_eq!(store.stream_version(id).await.unwrap(), None);
        assert!(!store.stream_exists(id).await.unwrap());

        store
            .append(vec![event(id, 1, "E1"), event(id, 2, "E2")], AppendOptions::new())
            .await
            .unwrap();
        assert_eq!(
            store.stream_version(id).await.unwrap(),
            Some(Version::new(2))
        );
        assert!(store.stream_exists(id).await.unwrap());
    }

    #[tokio::test]
    async fn snapshot_then_tail() {
        let store = InMemoryEventStore::new();
        let id = AggregateId::new();
        store
            .append(
                vec![event(id, 1, "E1"), event(id, 2, "E2"), event(id, 3, "E3")],
                AppendOptions::new(),
            )
            .await
            .unwrap();
        let snapshot = Snapshot::from_state(
            id,
            "Delivery",
            Version::new(2),
            Utc::now(),
            &serde_json::json!({"at": 2}),
        )
        .unwrap();
        store.save_snapshot(snapshot).await.unwrap();

        let (snapshot, tail) = store.load_with_snapshot(id).await.unwrap();
        assert_eq!(snapshot.unwrap().version, Version::new(2));
        assert_eq!(tail.len(), 1);
        assert_eq!(tail[0].version, Version::new(3));
    }

    #[tokio::test]
    async fn subscribers_receive_committed_events() {
        let store = InMemoryEventStore::new();
        let mut receiver = store.subscribe();
        let id = AggregateId::new();

        store
            .append(vec![event(id, 1, "DeliveryAssigned")], AppendOptions::expect_new())
            .await
            .unwrap();

        let published = receiver.recv().await.unwrap();
        assert_eq!(published.event_type, "DeliveryAssigned");
        assert_eq!(published.sequence, 1);
    }

    #[tokio::test]
    async fn stream_all_in_commit_order() {
        use futures_util::StreamExt;

        let store = InMemoryEventStore::new();
        store
            .append(vec![event(AggregateId::new(), 1, "First")], AppendOptions::new())
            .await
            .unwrap();
        store
            .append(vec![event(AggregateId::new(), 1, "Second")], AppendOptions::new())
            .await
            .unwrap();

        let events: Vec<_> = store.stream_all().await.unwrap().collect().await;
        let types: Vec<String> = events
            .into_iter()
            .map(|e| e.unwrap().event_type)
            .collect();
        assert_eq!(types, vec!["First", "Second"]);
    }
}

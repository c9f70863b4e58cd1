//! Core aggregate and domain event traits.

use chrono::{DateTime, Utc};
use common::{AggregateId, TenantId};
use event_store::Version;
use serde::{Serialize, de::DeserializeOwned};

/// A fact recorded on an aggregate's stream.
pub trait DomainEvent: Serialize + DeserializeOwned + Send + Sync + Clone {
    /// Name stored alongside the payload, used for filtering.
    fn event_type(&self) -> &'static str;

    /// Business time of the fact, taken from the injected clock.
    fn occurred_at(&self) -> DateTime<Utc>;
}

/// An event-sourced consistency boundary.
///
/// Command methods take `&self`, validate against the current state and
/// return the events to record; an empty list means "nothing to do".
/// [`Aggregate::apply`] folds a recorded event into the state and never
/// fails.
pub trait Aggregate: Default + Send + Sync + Sized {
    type Event: DomainEvent;

    type Error: std::error::Error + Send + Sync;

    /// Stream category, e.g. `"Order"`.
    fn aggregate_type() -> &'static str;

    /// `None` until the creating event has been applied.
    fn id(&self) -> Option<AggregateId>;

    /// Tenant stamped on stored envelopes for tenant-scoped queries.
    fn tenant_id(&self) -> Option<TenantId> {
        None
    }

    fn version(&self) -> Version;

    fn set_version(&mut self, version: Version);

    fn apply(&mut self, event: Self::Event);

    fn apply_events(&mut self, events: impl IntoIterator<Item = Self::Event>) {
        for event in events {
            self.apply(event);
        }
    }
}

/// Aggregates whose streams grow long enough to be worth snapshotting.
pub trait SnapshotCapable: Aggregate + Serialize + DeserializeOwned {
    /// Number of events between snapshots.
    fn snapshot_interval() -> u64 {
        100
    }

    fn should_snapshot(&self) -> bool {
        let version = self.version().as_u64();
        version > 0 && version.is_multiple_of(Self::snapshot_interval())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize)]
    enum PingEvent {
        Registered { at: DateTime<Utc> },
        Pinged { count: u32, at: DateTime<Utc> },
    }

    impl DomainEvent for PingEvent {
        fn event_type(&self) -> &'static str {
            match self {
                PingEvent::Registered { .. } => "Registered",
                PingEvent::Pinged { .. } => "Pinged",
            }
        }

        fn occurred_at(&self) -> DateTime<Utc> {
            match self {
                PingEvent::Registered { at } | PingEvent::Pinged { at, .. } => *at,
            }
        }
    }

    #[derive(Debug, Default, Clone, Serialize, Deserialize)]
    struct Pinger {
        id: Option<AggregateId>,
        count: u32,
        version: Version,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("ping error")]
    struct PingError;

    impl Aggregate for Pinger {
        type Event = PingEvent;
        type Error = PingError;

        fn aggregate_type() -> &'static str {
            "Pinger"
        }

        fn id(&self) -> Option<AggregateId> {
            self.id
        }

        fn version(&self) -> Version {
            self.version
        }

        fn set_version(&mut self, version: Version) {
            self.version = version;
        }

        fn apply(&mut self, event: Self::Event) {
            match event {
                PingEvent::Registered { .. } => self.id = Some(AggregateId::new()),
                PingEvent::Pinged { count, .. } => self.count = count,
            }
        }
    }

    impl SnapshotCapable for Pinger {
        fn snapshot_interval() -> u64 {
            10
        }
    }

    #[test]
    fn apply_events_folds_in_order() {
        let now = Utc::now();
        let mut pinger = Pinger::default();
        pinger.apply_events([
            PingEvent::Registered { at: now },
            PingEvent::Pinged { count: 1, at: now },
            PingEvent::Pinged { count: 2, at: now },
        ]);

        assert!(pinger.id().is_some());
        assert_eq!(pinger.count, 2);
        assert_eq!(pinger.tenant_id(), None);
    }

    #[test]
    fn snapshot_on_interval_boundaries_only() {
        let mut pinger = Pinger::default();
        assert!(!pinger.should_snapshot());

        pinger.set_version(Version::new(10));
        assert!(pinger.should_snapshot());

        pinger.set_version(Version::new(11));
        assert!(!pinger.should_snapshot());
    }
}

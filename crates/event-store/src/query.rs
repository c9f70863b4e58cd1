use chrono::{DateTime, Utc};

use crate::{AggregateId, EventEnvelope, TenantId, Version};

/// Filter over the global event log.
///
/// Unset fields match everything. Results come back in commit order.
#[derive(Debug, Clone, Default)]
pub struct EventQuery {
    pub aggregate_id: Option<AggregateId>,
    pub aggregate_type: Option<String>,
    pub tenant_id: Option<TenantId>,
    /// Any of these event types.
    pub event_types: Option<Vec<String>>,
    /// Inclusive.
    pub from_version: Option<Version>,
    /// Inclusive.
    pub to_version: Option<Version>,
    /// Inclusive.
    pub from_time: Option<DateTime<Utc>>,
    /// Inclusive.
    pub to_time: Option<DateTime<Utc>>,
    /// Only events whose global sequence is greater than this.
    pub after_sequence: Option<u64>,
    pub limit: Option<usize>,
}

impl EventQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// All events of one stream.
    pub fn for_aggregate(aggregate_id: impl Into<AggregateId>) -> Self {
        Self {
            aggregate_id: Some(aggregate_id.into()),
            ..Default::default()
        }
    }

    pub fn aggregate_type(mut self, aggregate_type: impl Into<String>) -> Self {
        self.aggregate_type = Some(aggregate_type.into());
        self
    }

    pub fn tenant(mut self, tenant_id: TenantId) -> Self {
        self.tenant_id = Some(tenant_id);
        self
    }

    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_types = Some(vec![event_type.into()]);
        self
    }

    pub fn event_types(mut self, event_types: Vec<String>) -> Self {
        self.event_types = Some(event_types);
        self
    }

    pub fn from_version(mut self, version: Version) -> Self {
        self.from_version = Some(version);
        self
    }

    pub fn to_version(mut self, version: Version) -> Self {
        self.to_version = Some(version);
        self
    }

    /// Both ends inclusive.
    pub fn between(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.from_time = Some(from);
        self.to_time = Some(to);
        self
    }

    pub fn after_sequence(mut self, sequence: u64) -> Self {
        self.after_sequence = Some(sequence);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether `event` satisfies every filter except `limit`.
    pub fn matches(&self, event: &EventEnvelope) -> bool {
        if self.aggregate_id.is_some_and(|id| id != event.aggregate_id) {
            return false;
        }
        if let Some(ref aggregate_type) = self.aggregate_type
            && aggregate_type != &event.aggregate_type
        {
            return false;
        }
        if self.tenant_id.is_some() && self.tenant_id != event.tenant_id {
            return false;
        }
        if let Some(ref types) = self.event_types
            && !types.contains(&event.event_type)
        {
            return false;
        }
        if self.from_version.is_some_and(|v| event.version < v) {
            return false;
        }
        if self.to_version.is_some_and(|v| event.version > v) {
            return false;
        }
        if self.from_time.is_some_and(|t| event.occurred_at < t) {
            return false;
        }
        if self.to_time.is_some_and(|t| event.occurred_at > t) {
            return false;
        }
        if self.after_sequence.is_some_and(|s| event.sequence <= s) {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(tenant: Option<TenantId>, event_type: &str, version: u64) -> EventEnvelope {
        EventEnvelope::builder()
            .event_type(event_type)
            .aggregate_id(AggregateId::new())
            .aggregate_type("Order")
            .tenant_id(tenant)
            .version(Version::new(version))
            .payload_raw(serde_json::json!({}))
            .build()
            .unwrap()
    }

    #[test]
    fn empty_query_matches_everything() {
        assert!(EventQuery::new().matches(&envelope(None, "A", 1)));
    }

    #[test]
    fn tenant_filter_excludes_other_tenants_and_untenanted_events() {
        let tenant = TenantId::new();
        let query = EventQuery::new().tenant(tenant);
        assert!(query.matches(&envelope(Some(tenant), "A", 1)));
        assert!(!query.matches(&envelope(Some(TenantId::new()), "A", 1)));
        assert!(!query.matches(&envelope(None, "A", 1)));
    }

    #[test]
    fn version_window_is_inclusive() {
        let query = EventQuery::new()
            .from_version(Version::new(2))
            .to_version(Version::new(3));
        assert!(!query.matches(&envelope(None, "A", 1)));
        assert!(query.matches(&envelope(None, "A", 2)));
        assert!(query.matches(&envelope(None, "A", 3)));
        assert!(!query.matches(&envelope(None, "A", 4)));
    }

    #[test]
    fn event_type_filter() {
        let query = EventQuery::new().event_types(vec!["A".into(), "B".into()]);
        assert!(query.matches(&envelope(None, "B", 1)));
        assert!(!query.matches(&envelope(None, "C", 1)));
    }
}

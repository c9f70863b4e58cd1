//! Loading aggregates from their streams and committing new events.

use std::marker::PhantomData;

use common::AggregateId;
use event_store::{
    AppendOptions, EventEnvelope, EventStore, EventStoreError, EventStoreExt, Snapshot, Version,
};
use serde::de::DeserializeOwned;

use crate::aggregate::{Aggregate, DomainEvent, SnapshotCapable};
use crate::error::DomainError;

/// Outcome of a committed command.
#[derive(Debug)]
pub struct CommandResult<A: Aggregate> {
    /// State after the new events.
    pub aggregate: A,

    /// Events recorded by this command; empty when it was a no-op.
    pub events: Vec<A::Event>,

    pub new_version: Version,
}

impl<A: Aggregate> CommandResult<A> {
    pub fn is_noop(&self) -> bool {
        self.events.is_empty()
    }
}

/// A request that creates or targets one aggregate.
pub trait Command: Send + Sync {
    type Aggregate: Aggregate;

    fn aggregate_id(&self) -> AggregateId;
}

/// Runs commands against event-sourced aggregates.
///
/// Each execution loads the current stream, evaluates the command against
/// that state and appends the result with the loaded version as the
/// expected version. A writer that raced ahead turns the append into a
/// conflict instead of a lost update.
pub struct CommandHandler<S, A>
where
    S: EventStore,
    A: Aggregate,
{
    store: S,
    _phantom: PhantomData<A>,
}

impl<S, A> Clone for CommandHandler<S, A>
where
    S: EventStore + Clone,
    A: Aggregate,
{
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            _phantom: PhantomData,
        }
    }
}

impl<S, A> CommandHandler<S, A>
where
    S: EventStore,
    A: Aggregate + DeserializeOwned,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            _phantom: PhantomData,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Rebuilds the aggregate, starting from its snapshot when one exists.
    ///
    /// A stream that was never written yields `A::default()`.
    pub async fn load(&self, aggregate_id: AggregateId) -> Result<A, DomainError> {
        let (snapshot, events) = self.store.load_with_snapshot(aggregate_id).await?;

        let mut aggregate = match snapshot {
            Some(snapshot) => {
                let version = snapshot.version;
                let mut restored: A = snapshot.into_state()?;
                restored.set_version(version);
                restored
            }
            None => A::default(),
        };

        for envelope in events {
            let event: A::Event = envelope.decode()?;
            aggregate.apply(event);
            aggregate.set_version(envelope.version);
        }

        Ok(aggregate)
    }

    /// `None` for a stream that was never written, instead of a default
    /// aggregate.
    pub async fn load_existing(&self, aggregate_id: AggregateId) -> Result<Option<A>, DomainError> {
        let aggregate = self.load(aggregate_id).await?;
        Ok(aggregate.id().is_some().then_some(aggregate))
    }

    /// Like [`Self::load_existing`] but absence is an error.
    pub async fn load_required(&self, aggregate_id: AggregateId) -> Result<A, DomainError> {
        self.load_existing(aggregate_id)
            .await?
            .ok_or_else(|| DomainError::not_found(A::aggregate_type(), aggregate_id))
    }

    /// Evaluates `command_fn` against the current state and commits its events.
    pub async fn execute<F, E>(
        &self,
        aggregate_id: AggregateId,
        command_fn: F,
    ) -> Result<CommandResult<A>, DomainError>
    where
        F: FnOnce(&A) -> Result<Vec<A::Event>, E>,
        DomainError: From<E>,
    {
        let mut aggregate = self.load(aggregate_id).await?;
        let current_version = aggregate.version();

        let events = command_fn(&aggregate)?;
        if events.is_empty() {
            return Ok(CommandResult {
                aggregate,
                events,
                new_version: current_version,
            });
        }

        aggregate.apply_events(events.iter().cloned());
        let envelopes = self.build_envelopes(aggregate_id, &aggregate, current_version, &events)?;

        let options = AppendOptions::expect_version(current_version);
        let new_version = self.store.append(envelopes, options).await?;
        aggregate.set_version(new_version);

        Ok(CommandResult {
            aggregate,
            events,
            new_version,
        })
    }

    fn build_envelopes(
        &self,
        aggregate_id: AggregateId,
        aggregate: &A,
        current_version: Version,
        events: &[A::Event],
    ) -> Result<Vec<EventEnvelope>, DomainError> {
        let mut envelopes = Vec::with_capacity(events.len());
        let mut version = current_version;

        for event in events {
            version = version.next();
            let envelope = EventEnvelope::builder()
                .aggregate_id(aggregate_id)
                .aggregate_type(A::aggregate_type())
                .tenant_id(aggregate.tenant_id())
                .event_type(event.event_type())
                .version(version)
                .occurred_at(event.occurred_at())
                .payload(event)?
                .build()
                .ok_or_else(|| {
                    EventStoreError::InvalidAppend(format!("incomplete envelope for {aggregate_id}"))
                })?;
            envelopes.push(envelope);
        }

        Ok(envelopes)
    }
}

impl<S, A> CommandHandler<S, A>
where
    S: EventStore,
    A: SnapshotCapable,
{
    /// Executes a command and snapshots the result on interval boundaries.
    pub async fn execute_with_snapshot<F, E>(
        &self,
        aggregate_id: AggregateId,
        command_fn: F,
    ) -> Result<CommandResult<A>, DomainError>
    where
        F: FnOnce(&A) -> Result<Vec<A::Event>, E>,
        DomainError: From<E>,
    {
        let result = self.execute(aggregate_id, command_fn).await?;

        if let Some(last) = result.events.last()
            && result.aggregate.should_snapshot()
        {
            let snapshot = Snapshot::from_state(
                aggregate_id,
                A::aggregate_type(),
                result.new_version,
                last.occurred_at(),
                &result.aggregate,
            )?;
            self.store.save_snapshot(snapshot).await?;
            tracing::debug!(%aggregate_id, version = %result.new_version, "snapshot saved");
        }

        Ok(result)
    }
}

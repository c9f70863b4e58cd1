//! The spatial filter dispatch starts from.

use std::sync::Arc;

use async_trait::async_trait;
use common::{CourierId, TenantId};
use event_store::EventStore;
use geo::{Distance, Location};
use projections::{CourierAvailabilityView, ProjectionProcessor};

use crate::error::Result;

/// Finds couriers of a tenant that are on duty near a point.
///
/// The answer may be slightly stale; dispatch re-checks every candidate
/// against its own stream before assigning.
#[async_trait]
pub trait CourierLocator: Send + Sync {
    /// Couriers within `radius` of `point`, nearest first.
    async fn available_near(
        &self,
        tenant_id: TenantId,
        point: Location,
        radius: Distance,
    ) -> Result<Vec<CourierId>>;
}

#[async_trait]
impl<T: CourierLocator + ?Sized> CourierLocator for Arc<T> {
    async fn available_near(
        &self,
        tenant_id: TenantId,
        point: Location,
        radius: Distance,
    ) -> Result<Vec<CourierId>> {
        (**self).available_near(tenant_id, point, radius).await
    }
}

/// Answers from the courier availability view after catching it up with
/// the event log.
pub struct ProjectedCourierLocator<S: EventStore> {
    processor: Arc<ProjectionProcessor<S>>,
    view: CourierAvailabilityView,
}

impl<S: EventStore> ProjectedCourierLocator<S> {
    /// `view` must be registered with `processor`.
    pub fn new(processor: Arc<ProjectionProcessor<S>>, view: CourierAvailabilityView) -> Self {
        Self { processor, view }
    }
}

#[async_trait]
impl<S: EventStore + 'static> CourierLocator for ProjectedCourierLocator<S> {
    async fn available_near(
        &self,
        tenant_id: TenantId,
        point: Location,
        radius: Distance,
    ) -> Result<Vec<CourierId>> {
        self.processor.run_catch_up().await?;
        Ok(self
            .view
            .available_within(tenant_id, &point, radius)
            .await
            .into_iter()
            .map(|nearby| nearby.courier.courier_id)
            .collect())
    }
}

//! Matching orders to couriers and opening the resulting delivery.

use std::sync::Arc;
use std::time::Instant;

use common::{Clock, CourierId, DeliveryId, OrderId};
use domain::dispatch;
use domain::{
    Aggregate, CommandHandler, CourierProfile, Delivery, DeliveryAssignment, DispatchRequest,
    DomainError, ErrorKind, OpenDelivery, Order, OrderError, OrderStatus, Parcel,
};
use event_store::EventStore;
use geo::{DirectRoutePlanner, Distance, Location, RoutePlanner};

use crate::config::Config;
use crate::error::{OrchestrationError, Result};
use crate::locator::CourierLocator;
use crate::services::CourierService;

/// A committed assignment: the courier's load was taken and the delivery
/// opened.
#[derive(Debug, Clone)]
pub struct Dispatched {
    pub assignment: DeliveryAssignment,
    pub delivery: Delivery,
}

/// Ranks couriers for an order and turns the best available one into a
/// delivery.
///
/// Ranking reads a possibly stale view, so assignment is optimistic: the
/// courier's load is taken with a version-checked append and a courier that
/// filled up in between is skipped for the next one in the ranking.
pub struct DispatchCoordinator<S: EventStore, L: CourierLocator> {
    orders: CommandHandler<S, Order>,
    deliveries: CommandHandler<S, Delivery>,
    couriers: CourierService<S>,
    locator: L,
    planner: DirectRoutePlanner,
    clock: Arc<dyn Clock>,
    max_radius: Distance,
    max_attempts: usize,
}

impl<S, L> DispatchCoordinator<S, L>
where
    S: EventStore + Clone,
    L: CourierLocator,
{
    pub fn new(
        store: S,
        couriers: CourierService<S>,
        locator: L,
        config: &Config,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            orders: CommandHandler::new(store.clone()),
            deliveries: CommandHandler::new(store),
            couriers,
            locator,
            planner: DirectRoutePlanner::new(config.average_speed),
            clock,
            max_radius: config.max_radius,
            max_attempts: config.max_assignment_attempts,
        }
    }

    /// Base 5, +2 for trips under 5 km, -1 over 20 km.
    pub fn calculate_order_priority(&self, pickup: Location, dropoff: Location) -> u8 {
        dispatch::order_priority(pickup, dropoff)
    }

    pub async fn can_courier_handle_order(&self, courier_id: CourierId, parcel: Parcel) -> Result<bool> {
        self.couriers.can_handle_order(courier_id, parcel).await
    }

    /// Every courier that could take the request, best first. Empty when
    /// nobody qualifies.
    #[tracing::instrument(skip(self), fields(order_id = %request.order_id))]
    pub async fn all_possible_assignments(
        &self,
        request: &DispatchRequest,
    ) -> Result<Vec<DeliveryAssignment>> {
        metrics::counter!("dispatch_requests_total").increment(1);

        let nearby = self
            .locator
            .available_near(request.tenant_id, request.pickup, self.max_radius)
            .await?;

        // The view may lag; rank on each courier's own stream.
        let mut candidates: Vec<CourierProfile> = Vec::with_capacity(nearby.len());
        for courier_id in nearby {
            if let Some(courier) = self.couriers.get(courier_id).await? {
                candidates.push(courier);
            }
        }

        let started = Instant::now();
        let ranked = dispatch::rank_candidates(&candidates, request, self.max_radius);
        metrics::histogram!("dispatch_ranking_seconds").record(started.elapsed().as_secs_f64());

        tracing::debug!(nearby = candidates.len(), eligible = ranked.len(), "couriers ranked");
        Ok(ranked)
    }

    pub async fn find_best_delivery_person(
        &self,
        request: &DispatchRequest,
    ) -> Result<Option<DeliveryAssignment>> {
        Ok(self.all_possible_assignments(request).await?.into_iter().next())
    }

    /// Builds the dispatch request for an order that is still in play.
    pub async fn request_for(
        &self,
        order_id: OrderId,
        pickup: Location,
        parcel: Parcel,
    ) -> Result<DispatchRequest> {
        let order = self.orders.load_required(order_id.into()).await?;

        if order.is_terminal() {
            return Err(DomainError::from(OrderError::InvalidStateTransition {
                from: order.status(),
                to: OrderStatus::OutForDelivery,
                reason: "order is already finished".to_string(),
            })
            .into());
        }

        let tenant_id = order
            .tenant_id()
            .ok_or_else(|| DomainError::from(OrderError::NotPlaced))?;
        let dropoff = order
            .delivery_address()
            .and_then(|address| address.location)
            .ok_or(OrchestrationError::MissingDropoff(order_id))?;

        Ok(DispatchRequest::new(tenant_id, order_id, pickup, dropoff, parcel))
    }

    /// Assigns the order to the best courier that still has room.
    ///
    /// Tries at most the configured number of candidates, in ranking order.
    /// The delivery is routed from the courier through the pickup to the
    /// drop-off.
    #[tracing::instrument(skip(self))]
    pub async fn assign_delivery(
        &self,
        order_id: OrderId,
        pickup: Location,
        parcel: Parcel,
    ) -> Result<Dispatched> {
        let request = self.request_for(order_id, pickup, parcel).await?;
        let ranked = self.all_possible_assignments(&request).await?;
        let delivery_id = DeliveryId::new();

        let mut tried = 0;
        for assignment in ranked.iter().take(self.max_attempts) {
            tried += 1;

            let courier = match self
                .couriers
                .assign_delivery(assignment.courier_id, delivery_id, parcel)
                .await
            {
                Ok(result) => result.aggregate,
                Err(err) if err.kind() == ErrorKind::CapacityExceeded => {
                    metrics::counter!("dispatch_assignment_retries_total").increment(1);
                    tracing::warn!(
                        courier_id = %assignment.courier_id,
                        error = %err,
                        "candidate can no longer take the order, trying next"
                    );
                    continue;
                }
                Err(err) => return Err(err),
            };

            return match self.open_delivery(&request, delivery_id, &courier).await {
                Ok(delivery) => {
                    tracing::info!(
                        %delivery_id,
                        courier_id = %assignment.courier_id,
                        score = assignment.score,
                        "delivery assigned"
                    );
                    Ok(Dispatched {
                        assignment: *assignment,
                        delivery,
                    })
                }
                Err(err) => {
                    if let Err(release) = self
                        .couriers
                        .complete_delivery(assignment.courier_id, delivery_id)
                        .await
                    {
                        tracing::error!(
                            courier_id = %assignment.courier_id,
                            error = %release,
                            "failed to release load after aborted dispatch"
                        );
                    }
                    Err(err)
                }
            };
        }

        metrics::counter!("dispatch_no_candidate_total").increment(1);
        tracing::warn!(candidates = ranked.len(), tried, "no eligible courier");
        Err(OrchestrationError::NoEligibleCourier {
            order_id,
            candidates: tried,
        })
    }

    async fn open_delivery(
        &self,
        request: &DispatchRequest,
        delivery_id: DeliveryId,
        courier: &CourierProfile,
    ) -> Result<Delivery> {
        let courier_id = courier
            .courier_id()
            .ok_or_else(|| DomainError::from(domain::CourierError::NotRegistered))?;
        let start = courier.location().unwrap_or(request.pickup);
        let route = self.planner.plan(start, &[request.pickup], request.dropoff)?;

        let cmd = OpenDelivery {
            delivery_id,
            tenant_id: request.tenant_id,
            order_id: request.order_id,
            courier_id,
            route,
            parcel: request.parcel,
        };

        let now = self.clock.now();
        let result = self
            .deliveries
            .execute_with_snapshot(delivery_id.into(), |delivery| delivery.open(&cmd, now))
            .await?;
        Ok(result.aggregate)
    }
}

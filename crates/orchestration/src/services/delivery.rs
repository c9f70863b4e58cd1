//! Delivery lifecycle driven by courier updates, with the order and the
//! courier's capacity kept in step.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::{Clock, CourierId, DeliveryId, OrderId, TenantId};
use domain::{
    CommandHandler, CommandResult, Delivery, DeliveryError, DeliveryEvent, DeliveryStatus,
    DomainError, OrderStatus, TrackingUpdate,
};
use event_store::EventStore;
use geo::{AverageSpeed, DirectRoutePlanner, Location, Route, RoutePlanner};
use projections::{DeliveryBoardView, DeliverySummary, ProjectionProcessor};

use crate::config::Config;
use crate::error::Result;
use crate::retry::retry_on_conflict;
use crate::services::{CourierService, OrderService};

/// Applies courier-side progress to deliveries.
///
/// A delivery that reaches a final status hands its parcel back to the
/// courier, and the order follows the delivery: picking up puts it
/// `OUT_FOR_DELIVERY`, completion marks it `DELIVERED` and a failed delivery
/// marks it `FAILED`.
pub struct DeliveryService<S: EventStore> {
    deliveries: CommandHandler<S, Delivery>,
    orders: OrderService<S>,
    couriers: CourierService<S>,
    processor: Arc<ProjectionProcessor<S>>,
    board: DeliveryBoardView,
    planner: DirectRoutePlanner,
    speed: AverageSpeed,
    clock: Arc<dyn Clock>,
    max_retries: u32,
}

impl<S: EventStore> DeliveryService<S> {
    /// `board` must be registered with `processor`.
    pub fn new(
        store: S,
        orders: OrderService<S>,
        couriers: CourierService<S>,
        processor: Arc<ProjectionProcessor<S>>,
        board: DeliveryBoardView,
        config: &Config,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            deliveries: CommandHandler::new(store),
            orders,
            couriers,
            processor,
            board,
            planner: DirectRoutePlanner::new(config.average_speed),
            speed: config.average_speed,
            clock,
            max_retries: config.command_max_retries,
        }
    }

    /// Replays the delivery from its stream. `None` if it was never opened.
    pub async fn get(&self, delivery_id: DeliveryId) -> Result<Option<Delivery>> {
        Ok(self.deliveries.load_existing(delivery_id.into()).await?)
    }

    /// Moves the delivery along its status table and brings the order and
    /// the courier's load in line with the new status.
    ///
    /// Repeating the current status commits nothing but still re-runs the
    /// follow-up, so a call that failed after the status was saved can be
    /// retried until the order and courier have caught up.
    #[tracing::instrument(skip(self))]
    pub async fn update_status(
        &self,
        delivery_id: DeliveryId,
        status: DeliveryStatus,
        notes: Option<String>,
    ) -> Result<CommandResult<Delivery>> {
        let result = self
            .run("update_delivery_status", delivery_id, |delivery, now| {
                delivery.update_status(status, notes.clone(), now)
            })
            .await?;

        if !result.is_noop() {
            tracing::info!(%status, "delivery status changed");
        }
        self.follow_up(&result.aggregate).await?;
        Ok(result)
    }

    /// Records a courier position for the delivery and moves the courier
    /// with it.
    #[tracing::instrument(skip(self))]
    pub async fn update_location(
        &self,
        delivery_id: DeliveryId,
        location: Location,
    ) -> Result<CommandResult<Delivery>> {
        let speed = self.speed;
        let result = self
            .run("update_delivery_location", delivery_id, |delivery, now| {
                delivery.update_location(location, speed, now)
            })
            .await?;

        if !result.is_noop()
            && let Some(courier_id) = result.aggregate.courier_id()
        {
            self.couriers.update_location(courier_id, location).await?;
        }
        Ok(result)
    }

    /// Hands the delivery to another courier.
    ///
    /// The new courier's capacity is taken first; the old courier's load is
    /// released only once the delivery is rebound.
    #[tracing::instrument(skip(self))]
    pub async fn reassign(
        &self,
        delivery_id: DeliveryId,
        to_courier: CourierId,
    ) -> Result<CommandResult<Delivery>> {
        let delivery = self
            .deliveries
            .load_required(delivery_id.into())
            .await?;
        let from_courier = delivery
            .courier_id()
            .ok_or_else(|| DomainError::from(DeliveryError::NotOpened))?;

        if delivery.is_completed() {
            return Err(DomainError::from(DeliveryError::AlreadyCompleted {
                status: delivery.status(),
            })
            .into());
        }
        if from_courier == to_courier {
            return Err(DomainError::from(DeliveryError::SameCourier(to_courier)).into());
        }

        let reserved = self
            .couriers
            .assign_delivery(to_courier, delivery_id, delivery.parcel())
            .await?;

        let rebound = match self.plan_handover(&delivery, reserved.aggregate.location()) {
            Ok(route) => {
                self.run("reassign_delivery", delivery_id, |current, now| {
                    current.reassign(to_courier, route.clone(), now)
                })
                .await
            }
            Err(err) => Err(err),
        };

        let result = match rebound {
            Ok(result) => result,
            Err(err) => {
                if let Err(release) = self.couriers.complete_delivery(to_courier, delivery_id).await {
                    tracing::error!(
                        courier_id = %to_courier,
                        error = %release,
                        "failed to release load after aborted reassignment"
                    );
                }
                return Err(err);
            }
        };

        self.couriers.complete_delivery(from_courier, delivery_id).await?;
        tracing::info!(%from_courier, %to_courier, "delivery reassigned");
        Ok(result)
    }

    /// Cancels a delivery that has not been picked up and frees the courier.
    ///
    /// Cancelling an already cancelled delivery only finishes releasing the
    /// courier.
    #[tracing::instrument(skip(self))]
    pub async fn cancel(&self, delivery_id: DeliveryId, reason: String) -> Result<CommandResult<Delivery>> {
        let result = self
            .run("cancel_delivery", delivery_id, |delivery, now| {
                if delivery.status() == DeliveryStatus::Cancelled {
                    return Ok(vec![]);
                }
                delivery.cancel(reason.clone(), now)
            })
            .await?;

        if !result.is_noop() {
            tracing::info!(%reason, "delivery cancelled");
        }
        self.follow_up(&result.aggregate).await?;
        Ok(result)
    }

    /// What the customer sees for the delivery right now.
    pub async fn tracking(&self, delivery_id: DeliveryId) -> Result<TrackingUpdate> {
        let delivery = self
            .deliveries
            .load_required(delivery_id.into())
            .await?;
        Ok(TrackingUpdate::from_delivery(&delivery, self.clock.now())
            .ok_or_else(|| DomainError::from(DeliveryError::NotOpened))?)
    }

    /// Deliveries the courier still has to finish, oldest assignment first.
    /// Reads the delivery board after catching it up.
    pub async fn active_for_courier(&self, courier_id: CourierId) -> Result<Vec<DeliverySummary>> {
        self.processor.run_catch_up().await?;
        Ok(self.board.active_for_courier(courier_id).await)
    }

    /// The order's most recently assigned delivery, finished or not.
    pub async fn for_order(&self, order_id: OrderId) -> Result<Option<DeliverySummary>> {
        self.processor.run_catch_up().await?;
        Ok(self.board.by_order(order_id).await)
    }

    /// Active deliveries of the tenant past their ETA, most overdue first.
    pub async fn overdue(&self, tenant_id: TenantId) -> Result<Vec<DeliverySummary>> {
        self.processor.run_catch_up().await?;
        Ok(self.board.overdue(tenant_id, self.clock.now()).await)
    }

    /// Every step is idempotent. The order moves before the courier's load
    /// is freed.
    async fn follow_up(&self, delivery: &Delivery) -> Result<()> {
        let (Some(delivery_id), Some(order_id), Some(courier_id)) =
            (delivery.delivery_id(), delivery.order_id(), delivery.courier_id())
        else {
            return Ok(());
        };

        match delivery.status() {
            DeliveryStatus::InTransit => {
                self.orders
                    .follow_delivery(order_id, OrderStatus::OutForDelivery, "Picked up by courier")
                    .await?;
            }
            DeliveryStatus::Delivered => {
                self.orders
                    .follow_delivery(order_id, OrderStatus::Delivered, "Delivery completed")
                    .await?;
                let released = self.couriers.release_delivery(courier_id, delivery_id).await?;
                if !released.is_noop() {
                    metrics::counter!("deliveries_completed_total").increment(1);
                }
            }
            DeliveryStatus::Failed => {
                self.orders
                    .follow_delivery(order_id, OrderStatus::Failed, "Delivery failed")
                    .await?;
                self.couriers.release_delivery(courier_id, delivery_id).await?;
            }
            DeliveryStatus::Cancelled => {
                self.couriers.release_delivery(courier_id, delivery_id).await?;
            }
            DeliveryStatus::Assigned
            | DeliveryStatus::EnRouteToPickup
            | DeliveryStatus::ArrivedAtPickup
            | DeliveryStatus::ArrivedAtDelivery => {}
        }
        Ok(())
    }

    /// Route for the new courier: through the pickup if the parcel has not
    /// been collected yet, otherwise straight to the drop-off.
    fn plan_handover(&self, delivery: &Delivery, courier_at: Option<Location>) -> Result<Route> {
        let route = delivery
            .route()
            .ok_or_else(|| DomainError::from(DeliveryError::NotOpened))?;
        let start = courier_at
            .or(delivery.current_location())
            .unwrap_or(route.start());

        let stops: &[Location] = match delivery.status() {
            DeliveryStatus::Assigned
            | DeliveryStatus::EnRouteToPickup
            | DeliveryStatus::ArrivedAtPickup => route.intermediate_stops(),
            _ => &[],
        };

        Ok(self.planner.plan(start, stops, route.end())?)
    }

    async fn run<F>(
        &self,
        operation: &'static str,
        delivery_id: DeliveryId,
        decide: F,
    ) -> Result<CommandResult<Delivery>>
    where
        F: Fn(&Delivery, DateTime<Utc>) -> std::result::Result<Vec<DeliveryEvent>, DeliveryError>
            + Sync,
    {
        let decide = &decide;

        retry_on_conflict(operation, self.max_retries, || async move {
            let now = self.clock.now();
            Ok(self
                .deliveries
                .execute_with_snapshot(delivery_id.into(), |delivery| decide(delivery, now))
                .await?)
        })
        .await
    }
}

//! Courier profile operations: approval, duty status, location and load.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::{Clock, CourierId, DeliveryId};
use domain::courier::AvailabilitySchedule;
use domain::{
    Command, CommandHandler, CommandResult, CourierError, CourierEvent, CourierProfile,
    CourierStatus, DeliveryCapacity, Parcel, RegisterCourier, VehicleInfo,
};
use event_store::EventStore;
use geo::Location;

use crate::error::Result;
use crate::retry::retry_on_conflict;

/// Capacity tracker for couriers.
///
/// Load changes are version-checked appends on the courier's own stream,
/// so two dispatches racing for the last unit of capacity cannot both
/// commit; the loser is re-evaluated against the winner's state.
#[derive(Clone)]
pub struct CourierService<S: EventStore> {
    couriers: CommandHandler<S, CourierProfile>,
    clock: Arc<dyn Clock>,
    max_retries: u32,
}

impl<S: EventStore> CourierService<S> {
    pub fn new(store: S, clock: Arc<dyn Clock>, max_retries: u32) -> Self {
        Self {
            couriers: CommandHandler::new(store),
            clock,
            max_retries,
        }
    }

    /// Creates the courier's profile, pending approval and off duty.
    #[tracing::instrument(skip(self, cmd), fields(courier_id = %cmd.courier_id))]
    pub async fn register(&self, cmd: RegisterCourier) -> Result<CommandResult<CourierProfile>> {
        let now = self.clock.now();
        let result = self
            .couriers
            .execute_with_snapshot(cmd.aggregate_id(), |courier| courier.register(&cmd, now))
            .await?;

        tracing::info!(city = result.aggregate.city(), "courier registered");
        Ok(result)
    }

    /// Current profile replayed from the courier's stream, or `None` if the
    /// courier never registered.
    pub async fn get(&self, courier_id: CourierId) -> Result<Option<CourierProfile>> {
        Ok(self.couriers.load_existing(courier_id.into()).await?)
    }

    /// Approves a pending or suspended courier.
    #[tracing::instrument(skip(self))]
    pub async fn approve(
        &self,
        courier_id: CourierId,
        notes: Option<String>,
    ) -> Result<CommandResult<CourierProfile>> {
        self.run("approve_courier", courier_id, |courier, now| {
            courier.approve(notes.clone(), now)
        })
        .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn reject(
        &self,
        courier_id: CourierId,
        notes: Option<String>,
    ) -> Result<CommandResult<CourierProfile>> {
        self.run("reject_courier", courier_id, |courier, now| {
            courier.reject(notes.clone(), now)
        })
        .await
    }

    /// A suspended courier is never offered new deliveries. Deliveries
    /// already on board stay assigned.
    #[tracing::instrument(skip(self))]
    pub async fn suspend(
        &self,
        courier_id: CourierId,
        reason: Option<String>,
    ) -> Result<CommandResult<CourierProfile>> {
        self.run("suspend_courier", courier_id, |courier, now| {
            courier.suspend(reason.clone(), now)
        })
        .await
    }

    /// Final. A terminated courier cannot be approved again.
    #[tracing::instrument(skip(self))]
    pub async fn terminate(
        &self,
        courier_id: CourierId,
        reason: Option<String>,
    ) -> Result<CommandResult<CourierProfile>> {
        self.run("terminate_courier", courier_id, |courier, now| {
            courier.terminate(reason.clone(), now)
        })
        .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn resubmit(&self, courier_id: CourierId) -> Result<CommandResult<CourierProfile>> {
        self.run("resubmit_courier", courier_id, |courier, now| {
            courier.resubmit(now)
        })
        .await
    }

    /// Replaces the vehicle and its capacity. Rejected when the new capacity
    /// cannot hold what the courier is already carrying.
    #[tracing::instrument(skip(self, vehicle))]
    pub async fn update_vehicle_info(
        &self,
        courier_id: CourierId,
        vehicle: VehicleInfo,
        capacity: DeliveryCapacity,
    ) -> Result<CommandResult<CourierProfile>> {
        self.run("update_vehicle_info", courier_id, |courier, now| {
            courier.update_vehicle_info(vehicle.clone(), capacity, now)
        })
        .await
    }

    #[tracing::instrument(skip(self, schedule))]
    pub async fn update_availability_schedule(
        &self,
        courier_id: CourierId,
        schedule: AvailabilitySchedule,
    ) -> Result<CommandResult<CourierProfile>> {
        self.run("update_availability_schedule", courier_id, |courier, now| {
            courier.update_availability_schedule(schedule.clone(), now)
        })
        .await
    }

    /// Duty status set by the courier. Requires approval, except for going
    /// `Inactive`.
    #[tracing::instrument(skip(self))]
    pub async fn update_status(
        &self,
        courier_id: CourierId,
        status: CourierStatus,
    ) -> Result<CommandResult<CourierProfile>> {
        self.run("update_courier_status", courier_id, |courier, now| {
            courier.update_status(status, now)
        })
        .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_location(
        &self,
        courier_id: CourierId,
        location: Location,
    ) -> Result<CommandResult<CourierProfile>> {
        self.run("update_courier_location", courier_id, |courier, now| {
            courier.update_location(location, now)
        })
        .await
    }

    /// Adds a delivery's parcel to the courier's load.
    ///
    /// Fails with a capacity error when the courier filled up or went off
    /// duty since it was ranked.
    #[tracing::instrument(skip(self))]
    pub async fn assign_delivery(
        &self,
        courier_id: CourierId,
        delivery_id: DeliveryId,
        parcel: Parcel,
    ) -> Result<CommandResult<CourierProfile>> {
        self.run("assign_courier_load", courier_id, |courier, now| {
            courier.assign_delivery(delivery_id, parcel, now)
        })
        .await
    }

    /// Removes a delivery from the courier's load.
    ///
    /// Errors if the courier is not carrying it. See
    /// [`Self::release_delivery`] for the repeatable variant.
    #[tracing::instrument(skip(self))]
    pub async fn complete_delivery(
        &self,
        courier_id: CourierId,
        delivery_id: DeliveryId,
    ) -> Result<CommandResult<CourierProfile>> {
        self.run("release_courier_load", courier_id, |courier, now| {
            courier.complete_delivery(delivery_id, now)
        })
        .await
    }

    /// Releases a delivery's load if the courier still carries it.
    ///
    /// Unlike [`Self::complete_delivery`] this is safe to repeat: a delivery
    /// already handed back is a no-op.
    #[tracing::instrument(skip(self))]
    pub async fn release_delivery(
        &self,
        courier_id: CourierId,
        delivery_id: DeliveryId,
    ) -> Result<CommandResult<CourierProfile>> {
        self.run("release_courier_load", courier_id, |courier, now| {
            if !courier.is_carrying(delivery_id) {
                return Ok(vec![]);
            }
            courier.complete_delivery(delivery_id, now)
        })
        .await
    }

    /// Whether the courier could take `parcel` right now, regardless of
    /// where they are: approved, available and with room left. Unknown
    /// couriers cannot.
    pub async fn can_handle_order(&self, courier_id: CourierId, parcel: Parcel) -> Result<bool> {
        Ok(self
            .get(courier_id)
            .await?
            .is_some_and(|courier| domain::dispatch::can_handle_order(&courier, parcel)))
    }

    async fn run<F>(
        &self,
        operation: &'static str,
        courier_id: CourierId,
        decide: F,
    ) -> Result<CommandResult<CourierProfile>>
    where
        F: Fn(&CourierProfile, DateTime<Utc>) -> std::result::Result<Vec<CourierEvent>, CourierError>
            + Sync,
    {
        let decide = &decide;

        let result = retry_on_conflict(operation, self.max_retries, || async move {
            let now = self.clock.now();
            Ok(self
                .couriers
                .execute_with_snapshot(courier_id.into(), |courier| decide(courier, now))
                .await?)
        })
        .await?;

        for event in &result.events {
            if let CourierEvent::CourierStatusChanged(data) = event {
                tracing::info!(from = %data.from, to = %data.to, "courier status changed");
            }
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{ManualClock, TenantId};
    use domain::{ApprovalStatus, ErrorKind, VehicleType};
    use event_store::InMemoryEventStore;

    fn service() -> CourierService<InMemoryEventStore> {
        CourierService::new(
            InMemoryEventStore::new(),
            Arc::new(ManualClock::default()),
            3,
        )
    }

    fn registration(capacity: DeliveryCapacity) -> RegisterCourier {
        let vehicle =
            VehicleInfo::new(VehicleType::Motorcycle, "Honda", "CG 125", "AAA-123-MP", "Red", 2021)
                .unwrap();
        RegisterCourier::new(
            TenantId::new(),
            "Ana Macuácua",
            "ana@example.com",
            "+258 84 000 0000",
            "Maputo",
            vehicle,
            Location::new(-25.9692, 32.5732).unwrap(),
        )
        .with_capacity(capacity)
    }

    async fn on_duty(service: &CourierService<InMemoryEventStore>, capacity: DeliveryCapacity) -> CourierId {
        let cmd = registration(capacity);
        let courier_id = cmd.courier_id;
        service.register(cmd).await.unwrap();
        service.approve(courier_id, None).await.unwrap();
        service
            .update_status(courier_id, CourierStatus::Available)
            .await
            .unwrap();
        courier_id
    }

    #[tokio::test]
    async fn test_approval_puts_courier_off_duty() {
        let service = service();
        let cmd = registration(DeliveryCapacity::default());
        let courier_id = cmd.courier_id;
        service.register(cmd).await.unwrap();

        let result = service
            .approve(courier_id, Some("documents verified".into()))
            .await
            .unwrap();

        assert_eq!(result.aggregate.approval_status(), ApprovalStatus::Approved);
        assert_eq!(result.aggregate.status(), CourierStatus::OffDuty);
    }

    #[tokio::test]
    async fn test_unapproved_courier_cannot_go_on_duty() {
        let service = service();
        let cmd = registration(DeliveryCapacity::default());
        let courier_id = cmd.courier_id;
        service.register(cmd).await.unwrap();

        let err = service
            .update_status(courier_id, CourierStatus::Available)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidStateTransition);
    }

    #[tokio::test]
    async fn test_load_fills_and_frees_capacity() {
        let service = service();
        let capacity = DeliveryCapacity::new(2, 10_000, 50_000).unwrap();
        let courier_id = on_duty(&service, capacity).await;
        let parcel = Parcel::new(1_000, 2_000);
        let (first, second) = (DeliveryId::new(), DeliveryId::new());

        service.assign_delivery(courier_id, first, parcel).await.unwrap();
        let full = service.assign_delivery(courier_id, second, parcel).await.unwrap();
        assert_eq!(full.aggregate.status(), CourierStatus::Busy);
        assert!(!service.can_handle_order(courier_id, parcel).await.unwrap());

        let err = service
            .assign_delivery(courier_id, DeliveryId::new(), parcel)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CapacityExceeded);

        let freed = service.complete_delivery(courier_id, first).await.unwrap();
        assert_eq!(freed.aggregate.status(), CourierStatus::Available);
        assert_eq!(freed.aggregate.current_load().orders, 1);
    }

    #[tokio::test]
    async fn test_release_is_repeatable() {
        let service = service();
        let courier_id = on_duty(&service, DeliveryCapacity::default()).await;
        let delivery_id = DeliveryId::new();
        service
            .assign_delivery(courier_id, delivery_id, Parcel::default())
            .await
            .unwrap();

        let released = service.release_delivery(courier_id, delivery_id).await.unwrap();
        assert!(!released.is_noop());
        assert_eq!(released.aggregate.current_load().orders, 0);

        let again = service.release_delivery(courier_id, delivery_id).await.unwrap();
        assert!(again.is_noop());
        let err = service
            .complete_delivery(courier_id, delivery_id)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidStateTransition);
    }

    #[tokio::test]
    async fn test_room_alone_does_not_make_a_courier_eligible() {
        let service = service();
        let parcel = Parcel::new(500, 1_000);
        let courier_id = on_duty(&service, DeliveryCapacity::default()).await;
        assert!(service.can_handle_order(courier_id, parcel).await.unwrap());

        service
            .update_status(courier_id, CourierStatus::OffDuty)
            .await
            .unwrap();
        let courier = service.get(courier_id).await.unwrap().unwrap();
        assert!(courier.capacity().can_accommodate(courier.current_load().with(parcel)));
        assert!(!service.can_handle_order(courier_id, parcel).await.unwrap());

        service
            .update_status(courier_id, CourierStatus::Available)
            .await
            .unwrap();
        service.suspend(courier_id, None).await.unwrap();
        assert!(!service.can_handle_order(courier_id, parcel).await.unwrap());

        assert!(!service.can_handle_order(CourierId::new(), parcel).await.unwrap());
    }

    #[tokio::test]
    async fn test_unknown_courier_is_not_found() {
        let service = service();
        let err = service
            .update_location(CourierId::new(), Location::new(0.0, 0.0).unwrap())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(service.get(CourierId::new()).await.unwrap().is_none());
    }
}

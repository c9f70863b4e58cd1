//! Delivery aggregate: one courier carrying one order along a route.

use chrono::{DateTime, Duration, Utc};
use common::{AggregateId, CourierId, DeliveryId, OrderId, TenantId};
use event_store::Version;
use geo::{AverageSpeed, Location, Route};
use serde::{Deserialize, Serialize};

use crate::aggregate::{Aggregate, SnapshotCapable};
use crate::courier::Parcel;

use super::{
    DeliveryError, DeliveryEvent, DeliveryEventType, DeliveryStatus, LifecycleEntry, OpenDelivery,
    events::{
        DeliveryAssignedData, DeliveryCancelledData, DeliveryCompletedData,
        DeliveryLocationUpdatedData, DeliveryReassignedData, DeliveryStatusChangedData,
    },
    status,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Delivery {
    id: Option<DeliveryId>,

    #[serde(default)]
    version: Version,

    tenant_id: Option<TenantId>,
    order_id: Option<OrderId>,
    courier_id: Option<CourierId>,
    route: Option<Route>,
    current_location: Option<Location>,
    status: DeliveryStatus,
    parcel: Parcel,
    estimated_arrival: Option<DateTime<Utc>>,
    log: Vec<LifecycleEntry>,
    cancellation_reason: Option<String>,
    assigned_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl Aggregate for Delivery {
    type Event = DeliveryEvent;
    type Error = DeliveryError;

    fn aggregate_type() -> &'static str {
        "Delivery"
    }

    fn id(&self) -> Option<AggregateId> {
        self.id.map(AggregateId::from)
    }

    fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            DeliveryEvent::DeliveryAssigned(data) => self.apply_assigned(data),
            DeliveryEvent::DeliveryStatusChanged(data) => {
                self.status = data.to;
                self.append_log(DeliveryEventType::for_status(data.to), data.notes, data.changed_at);
                if status::is_completed(data.to) {
                    self.completed_at = Some(data.changed_at);
                }
                self.updated_at = Some(data.changed_at);
            }
            DeliveryEvent::DeliveryCompleted(data) => {
                self.completed_at = Some(data.completed_at);
            }
            DeliveryEvent::DeliveryLocationUpdated(data) => {
                self.current_location = Some(data.location);
                self.estimated_arrival = Some(data.estimated_arrival);
                self.append_log(
                    DeliveryEventType::LocationUpdated,
                    Some("Location updated".to_string()),
                    data.updated_at,
                );
                self.updated_at = Some(data.updated_at);
            }
            DeliveryEvent::DeliveryReassigned(data) => {
                self.courier_id = Some(data.to_courier);
                self.route = Some(data.route);
                self.estimated_arrival = Some(data.estimated_arrival);
                self.append_log(
                    DeliveryEventType::Reassigned,
                    Some(format!("Reassigned from courier {}", data.from_courier)),
                    data.reassigned_at,
                );
                self.updated_at = Some(data.reassigned_at);
            }
            DeliveryEvent::DeliveryCancelled(data) => {
                self.status = DeliveryStatus::Cancelled;
                self.append_log(
                    DeliveryEventType::Cancelled,
                    Some(data.reason.clone()),
                    data.cancelled_at,
                );
                self.cancellation_reason = Some(data.reason);
                self.completed_at = Some(data.cancelled_at);
                self.updated_at = Some(data.cancelled_at);
            }
        }
    }
}

impl SnapshotCapable for Delivery {
    fn snapshot_interval() -> u64 {
        50
    }
}

// Query methods
impl Delivery {
    pub fn delivery_id(&self) -> Option<DeliveryId> {
        self.id
    }

    pub fn order_id(&self) -> Option<OrderId> {
        self.order_id
    }

    pub fn courier_id(&self) -> Option<CourierId> {
        self.courier_id
    }

    pub fn route(&self) -> Option<&Route> {
        self.route.as_ref()
    }

    pub fn current_location(&self) -> Option<Location> {
        self.current_location
    }

    pub fn destination(&self) -> Option<Location> {
        self.route.as_ref().map(Route::end)
    }

    pub fn status(&self) -> DeliveryStatus {
        self.status
    }

    pub fn parcel(&self) -> Parcel {
        self.parcel
    }

    pub fn estimated_arrival(&self) -> Option<DateTime<Utc>> {
        self.estimated_arrival
    }

    /// The lifecycle log, oldest first.
    pub fn log(&self) -> &[LifecycleEntry] {
        &self.log
    }

    pub fn cancellation_reason(&self) -> Option<&str> {
        self.cancellation_reason.as_deref()
    }

    pub fn assigned_at(&self) -> Option<DateTime<Utc>> {
        self.assigned_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub fn is_opened(&self) -> bool {
        self.id.is_some()
    }

    pub fn is_completed(&self) -> bool {
        status::is_completed(self.status)
    }

    pub fn can_be_cancelled(&self) -> bool {
        self.is_opened() && status::is_cancellable(self.status)
    }

    /// Never negative; zero once completed or past the ETA.
    pub fn time_to_arrival(&self, now: DateTime<Utc>) -> Duration {
        match self.estimated_arrival {
            Some(eta) if !self.is_completed() => (eta - now).max(Duration::zero()),
            _ => Duration::zero(),
        }
    }

    /// Past the ETA and still not completed.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        match self.estimated_arrival {
            Some(eta) => !self.is_completed() && now > eta,
            None => false,
        }
    }

    /// Share of the way to the customer implied by the status, in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        status::progress(self.status)
    }
}

// Command methods (return events)
impl Delivery {
    /// Opens the delivery `ASSIGNED` at the start of its route.
    pub fn open(
        &self,
        cmd: &OpenDelivery,
        now: DateTime<Utc>,
    ) -> Result<Vec<DeliveryEvent>, DeliveryError> {
        if self.is_opened() {
            return Err(DeliveryError::AlreadyOpened);
        }

        Ok(vec![DeliveryEvent::DeliveryAssigned(DeliveryAssignedData {
            delivery_id: cmd.delivery_id,
            tenant_id: cmd.tenant_id,
            order_id: cmd.order_id,
            courier_id: cmd.courier_id,
            route: cmd.route.clone(),
            parcel: cmd.parcel,
            estimated_arrival: now + cmd.route.estimated_duration(),
            assigned_at: now,
        })])
    }

    /// Moves the delivery along its status table.
    ///
    /// Asking for the current status is a no-op. Cancelling goes through
    /// [`Self::cancel`], with `notes` as the reason. Reaching `DELIVERED` also
    /// emits `DeliveryCompleted`.
    pub fn update_status(
        &self,
        to: DeliveryStatus,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Vec<DeliveryEvent>, DeliveryError> {
        let (delivery_id, order_id, courier_id) = self.ensure_opened()?;

        if self.status == to {
            return Ok(vec![]);
        }

        if to == DeliveryStatus::Cancelled {
            let reason = notes.unwrap_or_else(|| "Cancelled".to_string());
            return self.cancel(reason, now);
        }

        if !status::is_listed_transition(self.status, to) {
            return Err(DeliveryError::InvalidStatusTransition {
                from: self.status,
                to,
            });
        }

        let mut events = vec![DeliveryEvent::DeliveryStatusChanged(
            DeliveryStatusChangedData {
                delivery_id,
                order_id,
                courier_id,
                from: self.status,
                to,
                notes,
                changed_at: now,
            },
        )];

        if to == DeliveryStatus::Delivered {
            events.push(DeliveryEvent::DeliveryCompleted(DeliveryCompletedData {
                delivery_id,
                order_id,
                courier_id,
                completed_at: now,
            }));
        }

        Ok(events)
    }

    /// Records the courier's position and re-estimates arrival from the
    /// remaining straight-line distance at `speed`.
    ///
    /// Reporting the current location is a no-op. A completed delivery keeps
    /// its last ETA.
    pub fn update_location(
        &self,
        location: Location,
        speed: AverageSpeed,
        now: DateTime<Utc>,
    ) -> Result<Vec<DeliveryEvent>, DeliveryError> {
        let (delivery_id, _, courier_id) = self.ensure_opened()?;

        if self.current_location == Some(location) {
            return Ok(vec![]);
        }

        let estimated_arrival = match (self.destination(), self.estimated_arrival) {
            (Some(end), _) if !self.is_completed() => {
                now + speed.travel_time(location.distance_to(&end))
            }
            (_, Some(eta)) => eta,
            (_, None) => now,
        };

        Ok(vec![DeliveryEvent::DeliveryLocationUpdated(
            DeliveryLocationUpdatedData {
                delivery_id,
                courier_id,
                location,
                estimated_arrival,
                updated_at: now,
            },
        )])
    }

    /// Hands the delivery to another courier on a freshly planned route.
    pub fn reassign(
        &self,
        to_courier: CourierId,
        route: Route,
        now: DateTime<Utc>,
    ) -> Result<Vec<DeliveryEvent>, DeliveryError> {
        let (delivery_id, order_id, from_courier) = self.ensure_opened()?;

        if self.is_completed() {
            return Err(DeliveryError::AlreadyCompleted {
                status: self.status,
            });
        }

        if to_courier == from_courier {
            return Err(DeliveryError::SameCourier(to_courier));
        }

        Ok(vec![DeliveryEvent::DeliveryReassigned(DeliveryReassignedData {
            delivery_id,
            order_id,
            from_courier,
            to_courier,
            estimated_arrival: now + route.estimated_duration(),
            route,
            reassigned_at: now,
        })])
    }

    /// Cancels a delivery that has not been picked up yet.
    pub fn cancel(
        &self,
        reason: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<Vec<DeliveryEvent>, DeliveryError> {
        let (delivery_id, order_id, courier_id) = self.ensure_opened()?;

        if self.is_completed() {
            return Err(DeliveryError::AlreadyCompleted {
                status: self.status,
            });
        }

        if !status::is_cancellable(self.status) {
            return Err(DeliveryError::NotCancellable {
                status: self.status,
            });
        }

        Ok(vec![DeliveryEvent::DeliveryCancelled(DeliveryCancelledData {
            delivery_id,
            order_id,
            courier_id,
            from: self.status,
            reason: reason.into(),
            cancelled_at: now,
        })])
    }

    fn ensure_opened(&self) -> Result<(DeliveryId, OrderId, CourierId), DeliveryError> {
        match (self.id, self.order_id, self.courier_id) {
            (Some(id), Some(order), Some(courier)) => Ok((id, order, courier)),
            _ => Err(DeliveryError::NotOpened),
        }
    }
}

// Apply event helpers
impl Delivery {
    fn apply_assigned(&mut self, data: DeliveryAssignedData) {
        let start = data.route.start();
        self.id = Some(data.delivery_id);
        self.tenant_id = Some(data.tenant_id);
        self.order_id = Some(data.order_id);
        self.courier_id = Some(data.courier_id);
        self.current_location = Some(start);
        self.route = Some(data.route);
        self.status = DeliveryStatus::Assigned;
        self.parcel = data.parcel;
        self.estimated_arrival = Some(data.estimated_arrival);
        self.assigned_at = Some(data.assigned_at);
        self.updated_at = Some(data.assigned_at);
        self.append_log(
            DeliveryEventType::Assigned,
            Some("Delivery assigned".to_string()),
            data.assigned_at,
        );
    }

    fn append_log(&mut self, event_type: DeliveryEventType, notes: Option<String>, at: DateTime<Utc>) {
        // Position is only unknown before the delivery is opened.
        if let Some(location) = self.current_location {
            self.log.push(LifecycleEntry {
                event_type,
                location,
                notes,
                at,
            });
        }
    }
}

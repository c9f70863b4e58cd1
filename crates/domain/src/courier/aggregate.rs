//! Courier profile aggregate: approval, on-duty status and carried load.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use common::{AggregateId, CourierId, DeliveryId, TenantId};
use event_store::Version;
use geo::{Distance, Location};
use serde::{Deserialize, Serialize};

use crate::aggregate::{Aggregate, SnapshotCapable};

use super::{
    ApprovalStatus, AvailabilitySchedule, CourierError, CourierEvent, CourierStatus, CurrentLoad,
    DeliveryCapacity, Parcel, RegisterCourier, VehicleInfo,
    events::{
        ApprovalChangedData, CourierLocationUpdatedData, CourierRegisteredData,
        CourierStatusChangedData, LoadChangedData, ScheduleUpdatedData, VehicleUpdatedData,
    },
    status,
};

/// A courier and everything dispatch needs to know about them.
///
/// The load counters only change through [`Self::assign_delivery`] and
/// [`Self::complete_delivery`], which keep them within capacity and flip the
/// on-duty status between `AVAILABLE` and `BUSY` as room runs out or frees
/// up.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CourierProfile {
    id: Option<CourierId>,

    #[serde(default)]
    version: Version,

    tenant_id: Option<TenantId>,
    full_name: String,
    email: String,
    phone_number: String,
    city: String,
    vehicle: Option<VehicleInfo>,
    capacity: DeliveryCapacity,
    status: CourierStatus,
    approval: ApprovalStatus,
    location: Option<Location>,
    schedule: AvailabilitySchedule,
    load: CurrentLoad,
    active_deliveries: BTreeMap<DeliveryId, Parcel>,
    review_notes: Option<String>,
    registered_at: Option<DateTime<Utc>>,
    approved_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl Aggregate for CourierProfile {
    type Event = CourierEvent;
    type Error = CourierError;

    fn aggregate_type() -> &'static str {
        "CourierProfile"
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
            CourierEvent::CourierRegistered(data) => self.apply_registered(data),
            CourierEvent::ApprovalChanged(data) => self.apply_approval_changed(data),
            CourierEvent::VehicleUpdated(data) => {
                self.vehicle = Some(data.vehicle);
                self.capacity = data.capacity;
                self.updated_at = Some(data.updated_at);
            }
            CourierEvent::ScheduleUpdated(data) => {
                self.schedule = data.schedule;
                self.updated_at = Some(data.updated_at);
            }
            CourierEvent::CourierStatusChanged(data) => {
                self.status = data.to;
                self.updated_at = Some(data.changed_at);
            }
            CourierEvent::CourierLocationUpdated(data) => {
                self.location = Some(data.location);
                self.updated_at = Some(data.updated_at);
            }
            CourierEvent::DeliveryLoadAssigned(data) => {
                self.load = self.load.with(data.parcel);
                self.active_deliveries.insert(data.delivery_id, data.parcel);
                self.updated_at = Some(data.at);
            }
            CourierEvent::DeliveryLoadReleased(data) => {
                self.load = self.load.without(data.parcel);
                self.active_deliveries.remove(&data.delivery_id);
                self.updated_at = Some(data.at);
            }
        }
    }
}

impl SnapshotCapable for CourierProfile {
    // Location pings make courier streams the longest by far.
    fn snapshot_interval() -> u64 {
        50
    }
}

// Query methods
impl CourierProfile {
    pub fn courier_id(&self) -> Option<CourierId> {
        self.id
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn phone_number(&self) -> &str {
        &self.phone_number
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn vehicle(&self) -> Option<&VehicleInfo> {
        self.vehicle.as_ref()
    }

    pub fn capacity(&self) -> DeliveryCapacity {
        self.capacity
    }

    pub fn status(&self) -> CourierStatus {
        self.status
    }

    pub fn approval_status(&self) -> ApprovalStatus {
        self.approval
    }

    pub fn location(&self) -> Option<Location> {
        self.location
    }

    pub fn schedule(&self) -> &AvailabilitySchedule {
        &self.schedule
    }

    pub fn current_load(&self) -> CurrentLoad {
        self.load
    }

    pub fn active_deliveries(&self) -> impl Iterator<Item = (&DeliveryId, &Parcel)> {
        self.active_deliveries.iter()
    }

    pub fn is_carrying(&self, delivery_id: DeliveryId) -> bool {
        self.active_deliveries.contains_key(&delivery_id)
    }

    pub fn review_notes(&self) -> Option<&str> {
        self.review_notes.as_deref()
    }

    pub fn registered_at(&self) -> Option<DateTime<Utc>> {
        self.registered_at
    }

    pub fn approved_at(&self) -> Option<DateTime<Utc>> {
        self.approved_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub fn is_registered(&self) -> bool {
        self.id.is_some()
    }

    pub fn can_work(&self) -> bool {
        status::can_work(self.approval)
    }

    /// Approved and on duty with nothing holding them back.
    pub fn is_available(&self) -> bool {
        self.can_work() && status::is_available(self.status)
    }

    pub fn utilization(&self) -> f64 {
        self.capacity.utilization(self.load)
    }

    /// `None` until the courier has reported a location.
    pub fn distance_to(&self, point: &Location) -> Option<Distance> {
        self.location.map(|here| here.distance_to(point))
    }

    /// Approved, available, and the parcel fits on top of the current load.
    pub fn can_accept_delivery(&self, parcel: Parcel) -> bool {
        self.is_available() && self.capacity.can_accommodate(self.load.with(parcel))
    }
}

// Command methods (return events)
impl CourierProfile {
    pub fn register(
        &self,
        cmd: &RegisterCourier,
        now: DateTime<Utc>,
    ) -> Result<Vec<CourierEvent>, CourierError> {
        if self.is_registered() {
            return Err(CourierError::AlreadyRegistered);
        }

        for (field, value) in [
            ("full name", &cmd.full_name),
            ("phone number", &cmd.phone_number),
            ("city", &cmd.city),
        ] {
            if value.trim().is_empty() {
                return Err(CourierError::InvalidProfile(format!("{field} cannot be empty")));
            }
        }
        if !cmd.email.contains('@') {
            return Err(CourierError::InvalidProfile("invalid email format".to_string()));
        }
        cmd.vehicle.validate()?;

        Ok(vec![CourierEvent::CourierRegistered(CourierRegisteredData {
            courier_id: cmd.courier_id,
            tenant_id: cmd.tenant_id,
            full_name: cmd.full_name.trim().to_string(),
            email: cmd.email.trim().to_lowercase(),
            phone_number: cmd.phone_number.trim().to_string(),
            city: cmd.city.trim().to_string(),
            vehicle: cmd.vehicle.clone(),
            capacity: cmd.capacity,
            location: cmd.location,
            schedule: cmd.schedule.clone(),
            registered_at: now,
        })])
    }

    /// Approves the courier, who then starts `OFF_DUTY`.
    pub fn approve(
        &self,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Vec<CourierEvent>, CourierError> {
        self.change_approval(ApprovalStatus::Approved, notes, now)
    }

    pub fn reject(
        &self,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Vec<CourierEvent>, CourierError> {
        self.change_approval(ApprovalStatus::Rejected, notes, now)
    }

    pub fn suspend(
        &self,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Vec<CourierEvent>, CourierError> {
        self.change_approval(ApprovalStatus::Suspended, reason, now)
    }

    pub fn terminate(
        &self,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Vec<CourierEvent>, CourierError> {
        self.change_approval(ApprovalStatus::Terminated, reason, now)
    }

    /// Sends a rejected application back to review.
    pub fn resubmit(&self, now: DateTime<Utc>) -> Result<Vec<CourierEvent>, CourierError> {
        self.change_approval(ApprovalStatus::Pending, None, now)
    }

    /// Replaces vehicle and capacity; the new capacity must hold the current
    /// load.
    pub fn update_vehicle_info(
        &self,
        vehicle: VehicleInfo,
        capacity: DeliveryCapacity,
        now: DateTime<Utc>,
    ) -> Result<Vec<CourierEvent>, CourierError> {
        self.ensure_registered()?;
        vehicle.validate()?;

        if !capacity.can_accommodate(self.load) {
            return Err(CourierError::CapacityExceeded {
                load: self.load,
                capacity,
            });
        }

        if self.vehicle.as_ref() == Some(&vehicle) && self.capacity == capacity {
            return Ok(vec![]);
        }

        Ok(vec![CourierEvent::VehicleUpdated(VehicleUpdatedData {
            vehicle,
            capacity,
            updated_at: now,
        })])
    }

    pub fn update_availability_schedule(
        &self,
        schedule: AvailabilitySchedule,
        now: DateTime<Utc>,
    ) -> Result<Vec<CourierEvent>, CourierError> {
        self.ensure_registered()?;

        if self.schedule == schedule {
            return Ok(vec![]);
        }

        Ok(vec![CourierEvent::ScheduleUpdated(ScheduleUpdatedData {
            schedule,
            updated_at: now,
        })])
    }

    /// Changes the on-duty status.
    ///
    /// Only approved couriers may change status, except to go `INACTIVE`.
    /// Asking for the current status is a no-op.
    pub fn update_status(
        &self,
        to: CourierStatus,
        now: DateTime<Utc>,
    ) -> Result<Vec<CourierEvent>, CourierError> {
        let courier_id = self.ensure_registered()?;

        if !self.can_work() && to != CourierStatus::Inactive {
            return Err(CourierError::NotApproved {
                approval: self.approval,
            });
        }

        if self.status == to {
            return Ok(vec![]);
        }

        if !status::courier_status_transition_allowed(self.status, to) {
            return Err(CourierError::InvalidStatusTransition {
                from: self.status,
                to,
            });
        }

        Ok(vec![self.status_changed(courier_id, to, now)])
    }

    /// Moves the courier. Reporting the same location is a no-op.
    pub fn update_location(
        &self,
        location: Location,
        now: DateTime<Utc>,
    ) -> Result<Vec<CourierEvent>, CourierError> {
        let courier_id = self.ensure_registered()?;

        if self.location == Some(location) {
            return Ok(vec![]);
        }

        Ok(vec![CourierEvent::CourierLocationUpdated(
            CourierLocationUpdatedData {
                courier_id,
                location,
                updated_at: now,
            },
        )])
    }

    /// Takes on a delivery's load.
    ///
    /// Re-assigning a delivery the courier already carries is a no-op so a
    /// retried dispatch cannot count it twice. The courier turns `BUSY` when
    /// one more order would no longer fit.
    pub fn assign_delivery(
        &self,
        delivery_id: DeliveryId,
        parcel: Parcel,
        now: DateTime<Utc>,
    ) -> Result<Vec<CourierEvent>, CourierError> {
        let courier_id = self.ensure_registered()?;

        if self.is_carrying(delivery_id) {
            return Ok(vec![]);
        }

        if !self.is_available() {
            return Err(CourierError::NotAvailable {
                status: self.status,
                approval: self.approval,
            });
        }

        let load = self.load.with(parcel);
        if !self.capacity.can_accommodate(load) {
            return Err(CourierError::CapacityExceeded {
                load,
                capacity: self.capacity,
            });
        }

        let mut events = vec![CourierEvent::DeliveryLoadAssigned(LoadChangedData {
            courier_id,
            delivery_id,
            parcel,
            at: now,
        })];

        if !self.capacity.can_accommodate(load.with(Parcel::default())) {
            events.push(self.status_changed(courier_id, CourierStatus::Busy, now));
        }

        Ok(events)
    }

    /// Hands over a delivery's load, freeing capacity.
    ///
    /// A `BUSY` courier becomes `AVAILABLE` again once another order fits.
    pub fn complete_delivery(
        &self,
        delivery_id: DeliveryId,
        now: DateTime<Utc>,
    ) -> Result<Vec<CourierEvent>, CourierError> {
        let courier_id = self.ensure_registered()?;

        if self.load.is_empty() {
            return Err(CourierError::NoActiveDeliveries);
        }

        let parcel = self
            .active_deliveries
            .get(&delivery_id)
            .copied()
            .ok_or(CourierError::UnknownDelivery(delivery_id))?;

        let mut events = vec![CourierEvent::DeliveryLoadReleased(LoadChangedData {
            courier_id,
            delivery_id,
            parcel,
            at: now,
        })];

        let freed = self.load.without(parcel);
        if self.status == CourierStatus::Busy
            && self.capacity.can_accommodate(freed.with(Parcel::default()))
        {
            events.push(self.status_changed(courier_id, CourierStatus::Available, now));
        }

        Ok(events)
    }

    fn change_approval(
        &self,
        to: ApprovalStatus,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Vec<CourierEvent>, CourierError> {
        let courier_id = self.ensure_registered()?;

        if !status::approval_transition_allowed(self.approval, to) {
            return Err(CourierError::InvalidApprovalTransition {
                from: self.approval,
                to,
            });
        }

        Ok(vec![CourierEvent::ApprovalChanged(ApprovalChangedData {
            courier_id,
            from: self.approval,
            to,
            notes,
            changed_at: now,
        })])
    }

    fn status_changed(
        &self,
        courier_id: CourierId,
        to: CourierStatus,
        now: DateTime<Utc>,
    ) -> CourierEvent {
        CourierEvent::CourierStatusChanged(CourierStatusChangedData {
            courier_id,
            from: self.status,
            to,
            changed_at: now,
        })
    }

    fn ensure_registered(&self) -> Result<CourierId, CourierError> {
        self.id.ok_or(CourierError::NotRegistered)
    }
}

// Apply event helpers
impl CourierProfile {
    fn apply_registered(&mut self, data: CourierRegisteredData) {
        self.id = Some(data.courier_id);
        self.tenant_id = Some(data.tenant_id);
        self.full_name = data.full_name;
        self.email = data.email;
        self.phone_number = data.phone_number;
        self.city = data.city;
        self.vehicle = Some(data.vehicle);
        self.capacity = data.capacity;
        self.location = Some(data.location);
        self.schedule = data.schedule;
        self.status = CourierStatus::Inactive;
        self.approval = ApprovalStatus::Pending;
        self.registered_at = Some(data.registered_at);
        self.updated_at = Some(data.registered_at);
    }

    fn apply_approval_changed(&mut self, data: ApprovalChangedData) {
        self.approval = data.to;
        self.status = match data.to {
            ApprovalStatus::Approved => CourierStatus::OffDuty,
            _ => CourierStatus::Inactive,
        };
        if data.to == ApprovalStatus::Approved {
            self.approved_at = Some(data.changed_at);
        }
        if data.notes.is_some() {
            self.review_notes = data.notes;
        }
        self.updated_at = Some(data.changed_at);
    }
}

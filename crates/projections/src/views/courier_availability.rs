//! Courier availability read model: where couriers are and who can take work.
//!
//! This is the spatial filter dispatch starts from. It is a linear scan over
//! the tenant's couriers, which is fine at city scale; the courier aggregates
//! stay authoritative for the final capacity check.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CourierId, TenantId};
use domain::courier::{
    ApprovalStatus, CourierEvent, CourierStatus, CurrentLoad, DeliveryCapacity, status,
};
use event_store::EventEnvelope;
use geo::{Distance, Location};
use tokio::sync::RwLock;

use crate::Result;
use crate::projection::{Projection, ProjectionPosition};
use crate::read_model::ReadModel;

#[derive(Debug, Clone, PartialEq)]
pub struct CourierAvailability {
    pub courier_id: CourierId,
    pub tenant_id: TenantId,
    pub status: CourierStatus,
    pub approval: ApprovalStatus,
    pub location: Location,
    pub capacity: DeliveryCapacity,
    pub load: CurrentLoad,
    pub updated_at: DateTime<Utc>,
}

impl CourierAvailability {
    pub fn is_available(&self) -> bool {
        status::can_work(self.approval) && status::is_available(self.status)
    }
}

/// A courier near a point, with the distance to it.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyCourier {
    pub courier: CourierAvailability,
    pub distance: Distance,
}

#[derive(Clone)]
pub struct CourierAvailabilityView {
    couriers: Arc<RwLock<HashMap<CourierId, CourierAvailability>>>,
    position: Arc<RwLock<ProjectionPosition>>,
}

impl CourierAvailabilityView {
    pub fn new() -> Self {
        Self {
            couriers: Arc::new(RwLock::new(HashMap::new())),
            position: Arc::new(RwLock::new(ProjectionPosition::zero())),
        }
    }

    pub async fn get(&self, courier_id: CourierId) -> Option<CourierAvailability> {
        self.couriers.read().await.get(&courier_id).cloned()
    }

    pub async fn location_of(&self, courier_id: CourierId) -> Option<Location> {
        self.couriers.read().await.get(&courier_id).map(|c| c.location)
    }

    /// Available couriers of `tenant_id` within `radius` of `point`, nearest
    /// first.
    pub async fn available_within(
        &self,
        tenant_id: TenantId,
        point: &Location,
        radius: Distance,
    ) -> Vec<NearbyCourier> {
        let couriers = self.couriers.read().await;
        let mut nearby: Vec<NearbyCourier> = couriers
            .values()
            .filter(|c| c.tenant_id == tenant_id && c.is_available())
            .filter_map(|c| {
                let distance = c.location.distance_to(point);
                (distance <= radius).then(|| NearbyCourier {
                    courier: c.clone(),
                    distance,
                })
            })
            .collect();

        nearby.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then_with(|| a.courier.courier_id.cmp(&b.courier.courier_id))
        });
        nearby
    }

    pub async fn by_status(&self, tenant_id: TenantId, wanted: CourierStatus) -> Vec<CourierAvailability> {
        self.couriers
            .read()
            .await
            .values()
            .filter(|c| c.tenant_id == tenant_id && c.status == wanted)
            .cloned()
            .collect()
    }

    fn apply(couriers: &mut HashMap<CourierId, CourierAvailability>, event: CourierEvent) {
        if let CourierEvent::CourierRegistered(data) = event {
            couriers.insert(
                data.courier_id,
                CourierAvailability {
                    courier_id: data.courier_id,
                    tenant_id: data.tenant_id,
                    status: CourierStatus::Inactive,
                    approval: ApprovalStatus::Pending,
                    location: data.location,
                    capacity: data.capacity,
                    load: CurrentLoad::default(),
                    updated_at: data.registered_at,
                },
            );
            return;
        }

        let Some(courier_id) = courier_of(&event) else {
            return;
        };
        let Some(entry) = couriers.get_mut(&courier_id) else {
            return;
        };

        match event {
            CourierEvent::ApprovalChanged(data) => {
                entry.approval = data.to;
                entry.status = match data.to {
                    ApprovalStatus::Approved => CourierStatus::OffDuty,
                    _ => CourierStatus::Inactive,
                };
                entry.updated_at = data.changed_at;
            }
            CourierEvent::CourierStatusChanged(data) => {
                entry.status = data.to;
                entry.updated_at = data.changed_at;
            }
            CourierEvent::CourierLocationUpdated(data) => {
                entry.location = data.location;
                entry.updated_at = data.updated_at;
            }
            CourierEvent::DeliveryLoadAssigned(data) => {
                entry.load = entry.load.with(data.parcel);
                entry.updated_at = data.at;
            }
            CourierEvent::DeliveryLoadReleased(data) => {
                entry.load = entry.load.without(data.parcel);
                entry.updated_at = data.at;
            }
            CourierEvent::CourierRegistered(_)
            | CourierEvent::VehicleUpdated(_)
            | CourierEvent::ScheduleUpdated(_) => {}
        }
    }
}

/// Events that do not carry the courier id are resolved from the envelope.
fn courier_of(event: &CourierEvent) -> Option<CourierId> {
    match event {
        CourierEvent::CourierRegistered(data) => Some(data.courier_id),
        CourierEvent::ApprovalChanged(data) => Some(data.courier_id),
        CourierEvent::CourierStatusChanged(data) => Some(data.courier_id),
        CourierEvent::CourierLocationUpdated(data) => Some(data.courier_id),
        CourierEvent::DeliveryLoadAssigned(data) | CourierEvent::DeliveryLoadReleased(data) => {
            Some(data.courier_id)
        }
        CourierEvent::VehicleUpdated(_) | CourierEvent::ScheduleUpdated(_) => None,
    }
}

impl Default for CourierAvailabilityView {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Projection for CourierAvailabilityView {
    fn name(&self) -> &'static str {
        "CourierAvailabilityView"
    }

    async fn handle(&self, event: &EventEnvelope) -> Result<()> {
        if event.aggregate_type == "CourierProfile" {
            let courier_event: CourierEvent = event.decode()?;
            let mut couriers = self.couriers.write().await;

            match courier_event {
                CourierEvent::VehicleUpdated(data) => {
                    let courier_id = CourierId::from_uuid(event.aggregate_id.as_uuid());
                    if let Some(entry) = couriers.get_mut(&courier_id) {
                        entry.capacity = data.capacity;
                        entry.updated_at = data.updated_at;
                    }
                }
                other => Self::apply(&mut couriers, other),
            }
        }

        let mut pos = self.position.write().await;
        *pos = pos.advance_to(event.sequence);
        Ok(())
    }

    async fn position(&self) -> ProjectionPosition {
        *self.position.read().await
    }

    async fn reset(&self) -> Result<()> {
        self.couriers.write().await.clear();
        *self.position.write().await = ProjectionPosition::zero();
        Ok(())
    }
}

impl ReadModel for CourierAvailabilityView {
    fn name(&self) -> &'static str {
        "CourierAvailabilityView"
    }

    fn count(&self) -> usize {
        self.couriers.try_read().map(|c| c.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::courier::{
        ApprovalChangedData, CourierLocationUpdatedData, CourierRegisteredData,
        CourierStatusChangedData, LoadChangedData, Parcel, VehicleInfo, VehicleType,
    };
    use domain::DomainEvent;
    use event_store::Version;

    struct Feed {
        view: CourierAvailabilityView,
        sequence: u64,
    }

    impl Feed {
        fn new() -> Self {
            Self {
                view: CourierAvailabilityView::new(),
                sequence: 0,
            }
        }

        async fn push(&mut self, courier_id: CourierId, event: CourierEvent) {
            self.sequence += 1;
            let mut envelope = EventEnvelope::builder()
                .aggregate_id(courier_id)
                .aggregate_type("CourierProfile")
                .event_type(event.event_type())
                .version(Version::new(self.sequence))
                .payload(&event)
                .unwrap()
                .build()
                .unwrap();
            envelope.sequence = self.sequence;
            self.view.handle(&envelope).await.unwrap();
        }
    }

    fn location(lat: f64, lon: f64) -> Location {
        Location::new(lat, lon).unwrap()
    }

    async fn on_duty(feed: &mut Feed, tenant_id: TenantId, at: Location) -> CourierId {
        let courier_id = CourierId::new();
        let now = Utc::now();
        feed.push(
            courier_id,
            CourierEvent::CourierRegistered(CourierRegisteredData {
                courier_id,
                tenant_id,
                full_name: "Courier".into(),
                email: "c@example.com".into(),
                phone_number: "+258".into(),
                city: "Maputo".into(),
                vehicle: VehicleInfo::new(VehicleType::Car, "Toyota", "Vitz", "X", "Grey", 2016)
                    .unwrap(),
                capacity: DeliveryCapacity::default(),
                location: at,
                schedule: Default::default(),
                registered_at: now,
            }),
        )
        .await;
        feed.push(
            courier_id,
            CourierEvent::ApprovalChanged(ApprovalChangedData {
                courier_id,
                from: ApprovalStatus::Pending,
                to: ApprovalStatus::Approved,
                notes: None,
                changed_at: now,
            }),
        )
        .await;
        feed.push(
            courier_id,
            CourierEvent::CourierStatusChanged(CourierStatusChangedData {
                courier_id,
                from: CourierStatus::OffDuty,
                to: CourierStatus::Available,
                changed_at: now,
            }),
        )
        .await;
        courier_id
    }

    #[tokio::test]
    async fn test_registration_is_not_available_until_on_duty() {
        let mut feed = Feed::new();
        let tenant = TenantId::new();
        let courier = on_duty(&mut feed, tenant, location(-25.97, 32.57)).await;

        let entry = feed.view.get(courier).await.unwrap();
        assert!(entry.is_available());
        assert_eq!(entry.approval, ApprovalStatus::Approved);
        assert_eq!(feed.view.position().await.last_sequence, 3);
    }

    #[tokio::test]
    async fn test_available_within_filters_and_sorts_by_distance() {
        let mut feed = Feed::new();
        let tenant = TenantId::new();
        let pickup = location(-25.9692, 32.5732);
        let near = on_duty(&mut feed, tenant, location(-25.9700, 32.5740)).await;
        let mid = on_duty(&mut feed, tenant, location(-25.9300, 32.6000)).await;
        let _far = on_duty(&mut feed, tenant, location(-23.8650, 35.3833)).await;
        let _other_tenant = on_duty(&mut feed, TenantId::new(), pickup).await;

        let found = feed
            .view
            .available_within(tenant, &pickup, Distance::from_km(50.0).unwrap())
            .await;
        let ids: Vec<_> = found.iter().map(|n| n.courier.courier_id).collect();
        assert_eq!(ids, vec![near, mid]);
        assert!(found[0].distance < found[1].distance);
    }

    #[tokio::test]
    async fn test_status_location_and_load_are_tracked() {
        let mut feed = Feed::new();
        let tenant = TenantId::new();
        let courier_id = on_duty(&mut feed, tenant, location(-25.97, 32.57)).await;
        let now = Utc::now();

        feed.push(
            courier_id,
            CourierEvent::CourierLocationUpdated(CourierLocationUpdatedData {
                courier_id,
                location: location(-25.95, 32.58),
                updated_at: now,
            }),
        )
        .await;
        let delivery_id = common::DeliveryId::new();
        feed.push(
            courier_id,
            CourierEvent::DeliveryLoadAssigned(LoadChangedData {
                courier_id,
                delivery_id,
                parcel: Parcel::new(500, 600),
                at: now,
            }),
        )
        .await;
        feed.push(
            courier_id,
            CourierEvent::CourierStatusChanged(CourierStatusChangedData {
                courier_id,
                from: CourierStatus::Available,
                to: CourierStatus::Busy,
                changed_at: now,
            }),
        )
        .await;

        let entry = feed.view.get(courier_id).await.unwrap();
        assert_eq!(entry.location, location(-25.95, 32.58));
        assert_eq!(entry.load.orders, 1);
        assert!(!entry.is_available());
        assert_eq!(feed.view.by_status(tenant, CourierStatus::Busy).await.len(), 1);

        feed.push(
            courier_id,
            CourierEvent::DeliveryLoadReleased(LoadChangedData {
                courier_id,
                delivery_id,
                parcel: Parcel::new(500, 600),
                at: now,
            }),
        )
        .await;
        assert!(feed.view.get(courier_id).await.unwrap().load.is_empty());
    }

    #[tokio::test]
    async fn test_other_aggregates_only_advance_position() {
        let view = CourierAvailabilityView::new();
        let mut envelope = EventEnvelope::builder()
            .aggregate_id(common::AggregateId::new())
            .aggregate_type("Order")
            .event_type("OrderPlaced")
            .version(Version::first())
            .payload_raw(serde_json::json!({}))
            .build()
            .unwrap();
        envelope.sequence = 9;

        view.handle(&envelope).await.unwrap();
        assert_eq!(view.position().await.last_sequence, 9);
        assert_eq!(ReadModel::count(&view), 0);
    }
}

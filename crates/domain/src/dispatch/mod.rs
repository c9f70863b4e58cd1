//! Courier matching: who may take a delivery, and in what order to ask them.
//!
//! Everything here is pure. The caller supplies the candidate couriers
//! (already narrowed to the neighbourhood of the pickup) and gets back a
//! ranking; committing the assignment happens on the courier aggregate.

use std::cmp::Ordering;

use common::{CourierId, OrderId, TenantId};
use geo::{Distance, Location};

use crate::courier::{CourierProfile, Parcel};

/// Default search radius around the pickup.
pub const MAX_ASSIGNMENT_RADIUS_KM: f64 = 50.0;

const BASE_PRIORITY: u8 = 5;
const MIN_PRIORITY: u8 = 1;
const MAX_PRIORITY: u8 = 10;
const SHORT_TRIP_KM: f64 = 5.0;
const LONG_TRIP_KM: f64 = 20.0;

const DISTANCE_WEIGHT: f64 = 0.5;
const CAPACITY_WEIGHT: f64 = 0.3;
const PRIORITY_WEIGHT: f64 = 0.2;

/// What has to be carried, from where to where.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DispatchRequest {
    pub tenant_id: TenantId,
    pub order_id: OrderId,
    pub pickup: Location,
    pub dropoff: Location,
    pub parcel: Parcel,
}

impl DispatchRequest {
    pub fn new(
        tenant_id: TenantId,
        order_id: OrderId,
        pickup: Location,
        dropoff: Location,
        parcel: Parcel,
    ) -> Self {
        Self {
            tenant_id,
            order_id,
            pickup,
            dropoff,
            parcel,
        }
    }

    pub fn trip_distance(&self) -> Distance {
        self.pickup.distance_to(&self.dropoff)
    }

    pub fn priority(&self) -> u8 {
        order_priority(self.pickup, self.dropoff)
    }
}

/// One ranked candidate for a delivery.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeliveryAssignment {
    pub courier_id: CourierId,
    pub distance_to_pickup: Distance,
    /// Courier utilization once this parcel is on board.
    pub utilization: f64,
    pub priority: u8,
    pub score: f64,
}

impl DeliveryAssignment {
    /// Scores the candidate against the radius it was searched within.
    pub fn new(
        courier_id: CourierId,
        distance_to_pickup: Distance,
        max_radius: Distance,
        utilization: f64,
        priority: u8,
    ) -> Self {
        let utilization = utilization.clamp(0.0, 1.0);
        Self {
            courier_id,
            distance_to_pickup,
            utilization,
            priority,
            score: assignment_score(distance_to_pickup, max_radius, utilization, priority),
        }
    }
}

/// Weighted score in `[0, 1]`: closer, emptier couriers and higher-priority
/// orders score higher. Distance counts relative to `max_radius`, so a
/// courier on the edge of the search area gets no distance credit.
pub fn assignment_score(
    distance_to_pickup: Distance,
    max_radius: Distance,
    utilization: f64,
    priority: u8,
) -> f64 {
    let distance_score = if max_radius.as_meters() > 0.0 {
        (1.0 - distance_to_pickup.as_meters() / max_radius.as_meters()).max(0.0)
    } else {
        0.0
    };
    let capacity_score = 1.0 - utilization.clamp(0.0, 1.0);
    let priority_score = f64::from(priority) / f64::from(MAX_PRIORITY);

    distance_score * DISTANCE_WEIGHT + capacity_score * CAPACITY_WEIGHT + priority_score * PRIORITY_WEIGHT
}

/// Short trips go first, long ones wait.
pub fn order_priority(pickup: Location, dropoff: Location) -> u8 {
    priority_for_trip(pickup.distance_to(&dropoff))
}

/// Both thresholds are exclusive: exactly 5 km or 20 km leaves the base
/// priority alone.
pub fn priority_for_trip(trip: Distance) -> u8 {
    let km = trip.as_km();
    let mut priority = i16::from(BASE_PRIORITY);
    if km < SHORT_TRIP_KM {
        priority += 2;
    }
    if km > LONG_TRIP_KM {
        priority -= 1;
    }
    priority.clamp(i16::from(MIN_PRIORITY), i16::from(MAX_PRIORITY)) as u8
}

/// Pre-flight check regardless of distance: the courier is approved,
/// available, and the parcel fits in what is left of its capacity.
pub fn can_handle_order(courier: &CourierProfile, parcel: Parcel) -> bool {
    courier.can_accept_delivery(parcel)
}

/// Filters `candidates` down to those that can take the request and ranks
/// them best first. Ties go to the lower courier id.
///
/// Couriers without a reported location or further than `max_radius` from
/// the pickup are dropped. An empty result is not an error.
pub fn rank_candidates<'a>(
    candidates: impl IntoIterator<Item = &'a CourierProfile>,
    request: &DispatchRequest,
    max_radius: Distance,
) -> Vec<DeliveryAssignment> {
    let priority = request.priority();

    let mut ranked: Vec<DeliveryAssignment> = candidates
        .into_iter()
        .filter(|courier| can_handle_order(courier, request.parcel))
        .filter_map(|courier| {
            let courier_id = courier.courier_id()?;
            let distance = courier.distance_to(&request.pickup)?;
            if distance > max_radius {
                return None;
            }
            let projected = courier
                .capacity()
                .utilization(courier.current_load().with(request.parcel));
            Some(DeliveryAssignment::new(courier_id, distance, max_radius, projected, priority))
        })
        .collect();

    ranked.sort_by(compare_assignments);
    ranked
}

fn compare_assignments(a: &DeliveryAssignment, b: &DeliveryAssignment) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.courier_id.cmp(&b.courier_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Aggregate;
    use crate::courier::{CourierStatus, DeliveryCapacity, RegisterCourier, VehicleInfo, VehicleType};
    use chrono::Utc;
    use common::DeliveryId;

    fn location(lat: f64, lon: f64) -> Location {
        Location::new(lat, lon).unwrap()
    }

    fn courier_at(at: Location, capacity: DeliveryCapacity) -> CourierProfile {
        let now = Utc::now();
        let vehicle =
            VehicleInfo::new(VehicleType::Bicycle, "Trek", "FX", "N/A", "Black", 2020).unwrap();
        let cmd = RegisterCourier::new(
            TenantId::new(),
            "Courier",
            "courier@example.com",
            "+258 84 111 1111",
            "Maputo",
            vehicle,
            at,
        )
        .with_capacity(capacity);

        let mut courier = CourierProfile::default();
        courier.apply_events(courier.register(&cmd, now).unwrap());
        courier.apply_events(courier.approve(None, now).unwrap());
        courier.apply_events(courier.update_status(CourierStatus::Available, now).unwrap());
        courier
    }

    fn request(pickup: Location, dropoff: Location, parcel: Parcel) -> DispatchRequest {
        DispatchRequest::new(TenantId::new(), OrderId::new(), pickup, dropoff, parcel)
    }

    fn km(v: f64) -> Distance {
        Distance::from_km(v).unwrap()
    }

    fn default_radius() -> Distance {
        km(MAX_ASSIGNMENT_RADIUS_KM)
    }

    #[test]
    fn test_priority_boundaries_are_open() {
        assert_eq!(priority_for_trip(km(0.0)), 7);
        assert_eq!(priority_for_trip(km(4.999)), 7);
        assert_eq!(priority_for_trip(km(5.0)), 5);
        assert_eq!(priority_for_trip(km(20.0)), 5);
        assert_eq!(priority_for_trip(km(20.001)), 4);
        assert_eq!(priority_for_trip(km(5_000.0)), 4);
    }

    #[test]
    fn test_priority_always_in_range() {
        for v in [0.0, 1.0, 5.0, 10.0, 20.0, 50.0, 1_000.0] {
            let p = priority_for_trip(km(v));
            assert!((MIN_PRIORITY..=MAX_PRIORITY).contains(&p));
        }
    }

    #[test]
    fn test_score_is_monotonic_in_distance() {
        let mut previous = f64::INFINITY;
        for v in [0.0, 1.0, 5.0, 25.0, 49.0, 50.0, 80.0] {
            let score = assignment_score(km(v), default_radius(), 0.4, 5);
            assert!(score <= previous, "{v} km scored higher than a closer courier");
            previous = score;
        }
    }

    #[test]
    fn test_distance_credit_scales_with_radius() {
        // 60 km is past the default radius but well inside a 120 km one.
        assert_eq!(
            assignment_score(km(60.0), default_radius(), 0.0, 0),
            assignment_score(km(500.0), default_radius(), 0.0, 0)
        );
        let wide = assignment_score(km(60.0), km(120.0), 0.0, 0);
        assert!((wide - (0.5 * DISTANCE_WEIGHT + CAPACITY_WEIGHT)).abs() < 1e-9);
        assert!(wide > assignment_score(km(90.0), km(120.0), 0.0, 0));
    }

    #[test]
    fn test_zero_radius_gives_no_distance_credit() {
        let score = assignment_score(Distance::ZERO, Distance::ZERO, 0.0, 0);
        assert!(score.is_finite());
        assert!((score - CAPACITY_WEIGHT).abs() < 1e-9);
    }

    #[test]
    fn test_score_prefers_spare_capacity_and_priority() {
        let d = km(3.0);
        let r = default_radius();
        assert!(assignment_score(d, r, 0.2, 5) > assignment_score(d, r, 0.8, 5));
        assert!(assignment_score(d, r, 0.5, 8) > assignment_score(d, r, 0.5, 3));
    }

    #[test]
    fn test_only_couriers_with_capacity_are_ranked() {
        let pickup = location(-25.9692, 32.5732);
        let dropoff = location(-25.9500, 32.5900);
        let parcel = Parcel::new(2_000, 5_000);

        let near = courier_at(location(-25.9700, 32.5740), DeliveryCapacity::default());
        let far = courier_at(location(-25.9000, 32.6000), DeliveryCapacity::default());
        let too_small = courier_at(
            location(-25.9693, 32.5733),
            DeliveryCapacity::new(3, 1_000, 50_000).unwrap(),
        );

        let ranked = rank_candidates(
            [&far, &too_small, &near],
            &request(pickup, dropoff, parcel),
            default_radius(),
        );

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].courier_id, near.courier_id().unwrap());
        assert_eq!(ranked[1].courier_id, far.courier_id().unwrap());
        assert!(ranked[0].score >= ranked[1].score);
    }

    #[test]
    fn test_couriers_beyond_radius_are_dropped() {
        let pickup = location(-25.9692, 32.5732);
        let beira = courier_at(location(-19.8436, 34.8389), DeliveryCapacity::default());

        let ranked = rank_candidates(
            [&beira],
            &request(pickup, pickup, Parcel::default()),
            default_radius(),
        );
        assert!(ranked.is_empty());
    }

    #[test]
    fn test_wider_radius_reaches_distant_couriers() {
        let pickup = location(-25.9692, 32.5732);
        // About 80 km north-east of the pickup.
        let distant = courier_at(location(-25.3000, 32.9000), DeliveryCapacity::default());
        let gap = distant.distance_to(&pickup).unwrap();
        assert!(gap.as_km() > MAX_ASSIGNMENT_RADIUS_KM && gap.as_km() < 100.0);

        let req = request(pickup, pickup, Parcel::default());
        assert!(rank_candidates([&distant], &req, default_radius()).is_empty());

        let ranked = rank_candidates([&distant], &req, km(100.0));
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].courier_id, distant.courier_id().unwrap());
        assert_eq!(
            ranked[0].score,
            assignment_score(gap, km(100.0), ranked[0].utilization, req.priority())
        );
        let cramped = assignment_score(gap, default_radius(), ranked[0].utilization, req.priority());
        assert!(ranked[0].score > cramped);
    }

    #[test]
    fn test_ties_break_on_courier_id() {
        let spot = location(-25.9692, 32.5732);
        let a = courier_at(spot, DeliveryCapacity::default());
        let b = courier_at(spot, DeliveryCapacity::default());

        let ranked = rank_candidates([&a, &b], &request(spot, spot, Parcel::default()), default_radius());
        let ids: Vec<_> = ranked.iter().map(|r| r.courier_id).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn test_loaded_courier_ranks_below_idle_one_at_same_spot() {
        let spot = location(-25.9692, 32.5732);
        let idle = courier_at(spot, DeliveryCapacity::default());
        let mut loaded = courier_at(spot, DeliveryCapacity::default());
        loaded.apply_events(
            loaded
                .assign_delivery(DeliveryId::new(), Parcel::new(4_000, 100), Utc::now())
                .unwrap(),
        );

        let ranked = rank_candidates(
            [&loaded, &idle],
            &request(spot, spot, Parcel::default()),
            default_radius(),
        );
        assert_eq!(ranked[0].courier_id, idle.courier_id().unwrap());
    }

    #[test]
    fn test_unavailable_courier_cannot_handle_order() {
        let courier = courier_at(location(0.0, 0.0), DeliveryCapacity::default());
        assert!(can_handle_order(&courier, Parcel::default()));

        let mut off = courier.clone();
        off.apply_events(off.update_status(CourierStatus::OffDuty, Utc::now()).unwrap());
        assert!(!can_handle_order(&off, Parcel::default()));
    }
}

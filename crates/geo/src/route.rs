use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::{AverageSpeed, Distance, GeoError, Location};

/// An ordered path through at least two waypoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RouteData", into = "RouteData")]
pub struct Route {
    waypoints: Vec<Location>,
    total_distance: Distance,
    estimated_minutes: i64,
}

/// Wire shape of [`Route`]; checked on the way in.
#[derive(Serialize, Deserialize)]
struct RouteData {
    waypoints: Vec<Location>,
    total_distance: Distance,
    estimated_minutes: i64,
}

impl TryFrom<RouteData> for Route {
    type Error = GeoError;

    fn try_from(data: RouteData) -> Result<Self, Self::Error> {
        if data.waypoints.len() < 2 {
            return Err(GeoError::TooFewWaypoints(data.waypoints.len()));
        }
        if data.estimated_minutes < 0 {
            return Err(GeoError::InvalidDuration(data.estimated_minutes));
        }
        Ok(Self {
            waypoints: data.waypoints,
            total_distance: data.total_distance,
            estimated_minutes: data.estimated_minutes,
        })
    }
}

impl From<Route> for RouteData {
    fn from(route: Route) -> Self {
        Self {
            waypoints: route.waypoints,
            total_distance: route.total_distance,
            estimated_minutes: route.estimated_minutes,
        }
    }
}

impl Route {
    /// Builds a route of straight legs travelled at `speed`.
    pub fn new(waypoints: Vec<Location>, speed: AverageSpeed) -> Result<Self, GeoError> {
        if waypoints.len() < 2 {
            return Err(GeoError::TooFewWaypoints(waypoints.len()));
        }
        let total_distance: Distance = waypoints
            .windows(2)
            .map(|leg| leg[0].distance_to(&leg[1]))
            .sum();
        Ok(Self {
            estimated_minutes: speed.travel_time(total_distance).num_minutes(),
            waypoints,
            total_distance,
        })
    }

    pub fn start(&self) -> Location {
        self.waypoints[0]
    }

    pub fn end(&self) -> Location {
        self.waypoints[self.waypoints.len() - 1]
    }

    pub fn waypoints(&self) -> &[Location] {
        &self.waypoints
    }

    /// Waypoints strictly between start and end.
    pub fn intermediate_stops(&self) -> &[Location] {
        &self.waypoints[1..self.waypoints.len() - 1]
    }

    pub fn total_distance(&self) -> Distance {
        self.total_distance
    }

    pub fn estimated_duration(&self) -> Duration {
        Duration::minutes(self.estimated_minutes)
    }
}

/// Produces a route from a start point through stops to a destination.
pub trait RoutePlanner: Send + Sync {
    fn plan(&self, start: Location, stops: &[Location], end: Location) -> Result<Route, GeoError>;
}

/// Visits stops in the order given.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectRoutePlanner {
    speed: AverageSpeed,
}

impl DirectRoutePlanner {
    pub fn new(speed: AverageSpeed) -> Self {
        Self { speed }
    }
}

impl RoutePlanner for DirectRoutePlanner {
    fn plan(&self, start: Location, stops: &[Location], end: Location) -> Result<Route, GeoError> {
        let mut waypoints = Vec::with_capacity(stops.len() + 2);
        waypoints.push(start);
        waypoints.extend_from_slice(stops);
        waypoints.push(end);
        Route::new(waypoints, self.speed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(lat: f64, lon: f64) -> Location {
        Location::new(lat, lon).unwrap()
    }

    #[test]
    fn single_waypoint_is_rejected() {
        let result = Route::new(vec![loc(0.0, 0.0)], AverageSpeed::default());
        assert!(matches!(result, Err(GeoError::TooFewWaypoints(1))));
    }

    #[test]
    fn total_distance_sums_legs() {
        let a = loc(0.0, 0.0);
        let b = loc(0.0, 0.1);
        let c = loc(0.0, 0.2);
        let route = Route::new(vec![a, b, c], AverageSpeed::default()).unwrap();

        let expected = a.distance_to(&b).as_meters() + b.distance_to(&c).as_meters();
        assert!((route.total_distance().as_meters() - expected).abs() < 1e-6);
        assert_eq!(route.start(), a);
        assert_eq!(route.end(), c);
        assert_eq!(route.intermediate_stops(), &[b]);
    }

    #[test]
    fn deserializing_a_short_route_fails() {
        let route = Route::new(vec![loc(0.0, 0.0), loc(0.0, 0.1)], AverageSpeed::default()).unwrap();
        let json = serde_json::to_string(&route).unwrap();
        let back: Route = serde_json::from_str(&json).unwrap();
        assert_eq!(back, route);

        let one_stop = r#"{"waypoints":[{"latitude":0.0,"longitude":0.0}],"total_distance":0.0,"estimated_minutes":0}"#;
        let err = serde_json::from_str::<Route>(one_stop).unwrap_err();
        assert!(err.to_string().contains("at least two waypoints"));

        // `start`/`end` would index out of bounds on an empty route.
        let empty = r#"{"waypoints":[],"total_distance":0.0,"estimated_minutes":0}"#;
        assert!(serde_json::from_str::<Route>(empty).is_err());
    }

    #[test]
    fn planner_keeps_stop_order() {
        let planner = DirectRoutePlanner::default();
        let route = planner
            .plan(loc(1.0, 1.0), &[loc(1.1, 1.1)], loc(1.2, 1.2))
            .unwrap();
        assert_eq!(route.waypoints().len(), 3);
        assert_eq!(route.waypoints()[1], loc(1.1, 1.1));
        assert!(route.estimated_duration() > Duration::zero());
    }
}

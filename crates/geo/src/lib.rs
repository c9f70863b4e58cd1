//! Geo primitives used by dispatch and delivery tracking.
//!
//! Distances are great-circle distances; routes are straight legs between
//! waypoints travelled at an assumed average speed. Road routing and route
//! optimisation are not provided.

pub mod distance;
pub mod error;
pub mod location;
pub mod route;

pub use distance::{AverageSpeed, Distance, DistanceCalculator, Haversine, MIN_SPEED_KMH};
pub use error::GeoError;
pub use location::Location;
pub use route::{DirectRoutePlanner, Route, RoutePlanner};

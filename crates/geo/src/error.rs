use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeoError {
    #[error("latitude {0} is outside [-90, 90]")]
    InvalidLatitude(f64),

    #[error("longitude {0} is outside [-180, 180]")]
    InvalidLongitude(f64),

    #[error("distance must be finite and non-negative, got {0}")]
    InvalidDistance(f64),

    #[error("average speed must be finite and at least 1 km/h, got {0} km/h")]
    InvalidSpeed(f64),

    #[error("a route needs at least two waypoints, got {0}")]
    TooFewWaypoints(usize),

    #[error("estimated duration must be non-negative, got {0} minutes")]
    InvalidDuration(i64),
}

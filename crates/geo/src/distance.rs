use std::cmp::Ordering;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::{GeoError, Location};

const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Slower than walking pace is treated as a configuration mistake.
pub const MIN_SPEED_KMH: f64 = 1.0;

/// Largest travel time `chrono::Duration` can hold in whole minutes.
const MAX_TRAVEL_MINUTES: i64 = i64::MAX / 60_000;

/// A non-negative length in meters.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Distance(f64);

impl Distance {
    pub const ZERO: Distance = Distance(0.0);

    pub fn from_meters(meters: f64) -> Result<Self, GeoError> {
        if !meters.is_finite() || meters < 0.0 {
            return Err(GeoError::InvalidDistance(meters));
        }
        Ok(Self(meters))
    }

    pub fn from_km(km: f64) -> Result<Self, GeoError> {
        Self::from_meters(km * 1_000.0)
    }

    pub fn as_meters(&self) -> f64 {
        self.0
    }

    pub fn as_km(&self) -> f64 {
        self.0 / 1_000.0
    }

    /// Total order; distances are never NaN.
    pub fn total_cmp(&self, other: &Distance) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl std::ops::Add for Distance {
    type Output = Distance;

    fn add(self, rhs: Distance) -> Distance {
        Distance(self.0 + rhs.0)
    }
}

impl std::iter::Sum for Distance {
    fn sum<I: Iterator<Item = Distance>>(iter: I) -> Self {
        iter.fold(Distance::ZERO, |acc, d| acc + d)
    }
}

impl std::fmt::Display for Distance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0 >= 1_000.0 {
            write!(f, "{:.2} km", self.as_km())
        } else {
            write!(f, "{:.0} m", self.0)
        }
    }
}

/// Computes the distance between two points.
pub trait DistanceCalculator: Send + Sync {
    fn distance(&self, from: &Location, to: &Location) -> Distance;
}

/// Great-circle distance on a spherical earth.
#[derive(Debug, Clone, Copy, Default)]
pub struct Haversine;

impl DistanceCalculator for Haversine {
    fn distance(&self, from: &Location, to: &Location) -> Distance {
        let lat1 = from.latitude().to_radians();
        let lat2 = to.latitude().to_radians();
        let delta_lat = (to.latitude() - from.latitude()).to_radians();
        let delta_lon = (to.longitude() - from.longitude()).to_radians();

        let sin_lat = (delta_lat / 2.0).sin();
        let sin_lon = (delta_lon / 2.0).sin();

        let haversine = sin_lat * sin_lat + lat1.cos() * lat2.cos() * sin_lon * sin_lon;
        let central_angle = 2.0 * haversine.sqrt().min(1.0).asin();

        Distance((EARTH_RADIUS_METERS * central_angle).max(0.0))
    }
}

/// Assumed travel speed used for durations and ETAs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SpeedData", into = "SpeedData")]
pub struct AverageSpeed {
    kmh: f64,
}

#[derive(Serialize, Deserialize)]
struct SpeedData {
    kmh: f64,
}

impl TryFrom<SpeedData> for AverageSpeed {
    type Error = GeoError;

    fn try_from(data: SpeedData) -> Result<Self, Self::Error> {
        Self::from_kmh(data.kmh)
    }
}

impl From<AverageSpeed> for SpeedData {
    fn from(speed: AverageSpeed) -> Self {
        Self { kmh: speed.kmh }
    }
}

impl AverageSpeed {
    /// Rejects non-finite speeds and anything below [`MIN_SPEED_KMH`].
    pub fn from_kmh(kmh: f64) -> Result<Self, GeoError> {
        if !kmh.is_finite() || kmh < MIN_SPEED_KMH {
            return Err(GeoError::InvalidSpeed(kmh));
        }
        Ok(Self { kmh })
    }

    pub fn kmh(&self) -> f64 {
        self.kmh
    }

    /// Travel time over `distance`, rounded to whole minutes. Saturates
    /// instead of overflowing on absurd distances.
    pub fn travel_time(&self, distance: Distance) -> Duration {
        let minutes = (distance.as_km() / self.kmh * 60.0).round() as i64;
        Duration::minutes(minutes.min(MAX_TRAVEL_MINUTES))
    }
}

impl Default for AverageSpeed {
    fn default() -> Self {
        Self { kmh: 30.0 }
    }
}

use serde::{Deserialize, Serialize};

use crate::GeoError;
use crate::distance::{Distance, DistanceCalculator, Haversine};

/// A validated WGS84 coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Coordinates", into = "Coordinates")]
pub struct Location {
    latitude: f64,
    longitude: f64,
}

#[derive(Serialize, Deserialize)]
struct Coordinates {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<Coordinates> for Location {
    type Error = GeoError;

    fn try_from(raw: Coordinates) -> Result<Self, Self::Error> {
        Self::new(raw.latitude, raw.longitude)
    }
}

impl From<Location> for Coordinates {
    fn from(location: Location) -> Self {
        Self {
            latitude: location.latitude,
            longitude: location.longitude,
        }
    }
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeoError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(GeoError::InvalidLatitude(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(GeoError::InvalidLongitude(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Great-circle distance to `other`.
    pub fn distance_to(&self, other: &Location) -> Distance {
        Haversine.distance(self, other)
    }

    pub fn is_within(&self, other: &Location, radius: Distance) -> bool {
        self.distance_to(other) <= radius
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_coordinates() {
        assert!(matches!(
            Location::new(91.0, 0.0),
            Err(GeoError::InvalidLatitude(_))
        ));
        assert!(matches!(
            Location::new(0.0, -180.5),
            Err(GeoError::InvalidLongitude(_))
        ));
        assert!(Location::new(-90.0, 180.0).is_ok());
    }

    #[test]
    fn deserialized_coordinates_are_range_checked() {
        let ok: Location = serde_json::from_str(r#"{"latitude":-25.9,"longitude":32.5}"#).unwrap();
        assert_eq!(ok, Location::new(-25.9, 32.5).unwrap());
        assert!(serde_json::from_str::<Location>(r#"{"latitude":120.0,"longitude":0.0}"#).is_err());
    }

    #[test]
    fn maputo_to_matola_is_roughly_twelve_km() {
        let maputo = Location::new(-25.9692, 32.5732).unwrap();
        let matola = Location::new(-25.9622, 32.4589).unwrap();
        let km = maputo.distance_to(&matola).as_km();
        assert!((km - 11.5).abs() < 1.0, "got {km}");
    }

    #[test]
    fn radius_check_is_inclusive() {
        let a = Location::new(0.0, 0.0).unwrap();
        let b = Location::new(0.0, 0.1).unwrap();
        let d = a.distance_to(&b);
        assert!(a.is_within(&b, d));
        assert!(!a.is_within(&b, Distance::from_meters(d.as_meters() - 1.0).unwrap()));
    }
}

use serde::{Deserialize, Serialize};

use super::CourierError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleType {
    Bicycle,
    Motorcycle,
    Car,
    Van,
}

const MIN_VEHICLE_YEAR: i32 = 1900;
const MAX_VEHICLE_YEAR: i32 = 2030;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleInfo {
    pub vehicle_type: VehicleType,
    pub make: String,
    pub model: String,
    pub license_plate: String,
    pub color: String,
    pub year: i32,
}

impl VehicleInfo {
    pub fn new(
        vehicle_type: VehicleType,
        make: impl Into<String>,
        model: impl Into<String>,
        license_plate: impl Into<String>,
        color: impl Into<String>,
        year: i32,
    ) -> Result<Self, CourierError> {
        let info = Self {
            vehicle_type,
            make: make.into(),
            model: model.into(),
            license_plate: license_plate.into(),
            color: color.into(),
            year,
        };
        info.validate()?;
        Ok(info)
    }

    pub fn validate(&self) -> Result<(), CourierError> {
        for (field, value) in [
            ("make", &self.make),
            ("model", &self.model),
            ("license plate", &self.license_plate),
            ("color", &self.color),
        ] {
            if value.trim().is_empty() {
                return Err(CourierError::InvalidVehicle(format!("{field} cannot be blank")));
            }
        }
        if !(MIN_VEHICLE_YEAR..=MAX_VEHICLE_YEAR).contains(&self.year) {
            return Err(CourierError::InvalidVehicle(format!(
                "invalid vehicle year: {}",
                self.year
            )));
        }
        Ok(())
    }

    /// e.g. `2021 Honda CG 150 (ABC-123-MP)`.
    pub fn display_name(&self) -> String {
        format!(
            "{} {} {} ({})",
            self.year, self.make, self.model, self.license_plate
        )
    }

    pub fn is_motorized(&self) -> bool {
        !matches!(self.vehicle_type, VehicleType::Bicycle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vehicle(year: i32) -> Result<VehicleInfo, CourierError> {
        VehicleInfo::new(VehicleType::Motorcycle, "Honda", "CG 150", "ABC-123-MP", "Red", year)
    }

    #[test]
    fn year_bounds_are_inclusive() {
        assert!(vehicle(1900).is_ok());
        assert!(vehicle(2030).is_ok());
        assert!(vehicle(1899).is_err());
        assert!(vehicle(2031).is_err());
    }

    #[test]
    fn blank_fields_are_rejected() {
        let result = VehicleInfo::new(VehicleType::Car, "Toyota", " ", "X", "White", 2020);
        assert!(matches!(result, Err(CourierError::InvalidVehicle(msg)) if msg.contains("model")));
    }

    #[test]
    fn display_name() {
        assert_eq!(vehicle(2021).unwrap().display_name(), "2021 Honda CG 150 (ABC-123-MP)");
        assert!(vehicle(2021).unwrap().is_motorized());
    }
}

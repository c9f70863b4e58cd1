use serde::{Deserialize, Serialize};

use super::CourierError;

/// Physical footprint of one delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Parcel {
    pub weight_grams: u32,
    pub volume_cm3: u32,
}

impl Parcel {
    pub fn new(weight_grams: u32, volume_cm3: u32) -> Self {
        Self {
            weight_grams,
            volume_cm3,
        }
    }
}

/// What a courier is carrying right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CurrentLoad {
    pub orders: u32,
    pub weight_grams: u32,
    pub volume_cm3: u32,
}

impl CurrentLoad {
    /// The load after picking up `parcel`.
    pub fn with(&self, parcel: Parcel) -> CurrentLoad {
        CurrentLoad {
            orders: self.orders.saturating_add(1),
            weight_grams: self.weight_grams.saturating_add(parcel.weight_grams),
            volume_cm3: self.volume_cm3.saturating_add(parcel.volume_cm3),
        }
    }

    /// The load after handing over `parcel`; never below zero.
    pub fn without(&self, parcel: Parcel) -> CurrentLoad {
        CurrentLoad {
            orders: self.orders.saturating_sub(1),
            weight_grams: self.weight_grams.saturating_sub(parcel.weight_grams),
            volume_cm3: self.volume_cm3.saturating_sub(parcel.volume_cm3),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.orders == 0
    }
}

/// Upper bounds on what a courier can carry at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryCapacity {
    max_orders: u32,
    max_weight_grams: u32,
    max_volume_cm3: u32,
}

impl DeliveryCapacity {
    pub fn new(
        max_orders: u32,
        max_weight_grams: u32,
        max_volume_cm3: u32,
    ) -> Result<Self, CourierError> {
        if max_orders == 0 || max_weight_grams == 0 || max_volume_cm3 == 0 {
            return Err(CourierError::InvalidCapacity);
        }
        Ok(Self {
            max_orders,
            max_weight_grams,
            max_volume_cm3,
        })
    }

    pub fn max_orders(&self) -> u32 {
        self.max_orders
    }

    pub fn max_weight_grams(&self) -> u32 {
        self.max_weight_grams
    }

    pub fn max_volume_cm3(&self) -> u32 {
        self.max_volume_cm3
    }

    pub fn can_accommodate(&self, load: CurrentLoad) -> bool {
        load.orders <= self.max_orders
            && load.weight_grams <= self.max_weight_grams
            && load.volume_cm3 <= self.max_volume_cm3
    }

    /// Fraction of the tightest dimension in use, in `[0, 1]` while the
    /// load fits.
    pub fn utilization(&self, load: CurrentLoad) -> f64 {
        let ratio = |used: u32, max: u32| f64::from(used) / f64::from(max);
        ratio(load.orders, self.max_orders)
            .max(ratio(load.weight_grams, self.max_weight_grams))
            .max(ratio(load.volume_cm3, self.max_volume_cm3))
    }
}

impl Default for DeliveryCapacity {
    /// Five orders, 10 kg, 50 litres.
    fn default() -> Self {
        Self {
            max_orders: 5,
            max_weight_grams: 10_000,
            max_volume_cm3: 50_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_limits_are_rejected() {
        assert!(DeliveryCapacity::new(0, 1, 1).is_err());
        assert!(DeliveryCapacity::new(1, 0, 1).is_err());
        assert!(DeliveryCapacity::new(1, 1, 0).is_err());
        assert!(DeliveryCapacity::new(1, 1, 1).is_ok());
    }

    #[test]
    fn accommodates_up_to_the_limit() {
        let capacity = DeliveryCapacity::new(2, 1_000, 1_000).unwrap();
        let load = CurrentLoad::default().with(Parcel::new(600, 100));

        assert!(capacity.can_accommodate(load));
        assert!(capacity.can_accommodate(load.with(Parcel::new(400, 100))));
        assert!(!capacity.can_accommodate(load.with(Parcel::new(401, 100))));
        assert!(!capacity.can_accommodate(load.with(Parcel::default()).with(Parcel::default())));
    }

    #[test]
    fn utilization_is_the_tightest_dimension() {
        let capacity = DeliveryCapacity::default();
        let load = CurrentLoad {
            orders: 1,
            weight_grams: 7_500,
            volume_cm3: 5_000,
        };
        assert!((capacity.utilization(load) - 0.75).abs() < 1e-9);
        assert_eq!(capacity.utilization(CurrentLoad::default()), 0.0);
    }

    #[test]
    fn release_saturates_at_zero() {
        let load = CurrentLoad::default().with(Parcel::new(100, 100));
        let emptied = load.without(Parcel::new(500, 500)).without(Parcel::default());
        assert_eq!(emptied, CurrentLoad::default());
        assert!(emptied.is_empty());
    }
}

//! Vehicles sent across the bridge, chosen by load weight.

use std::fmt;

use serde::Serialize;

/// Lightest load the player can select.
pub const MIN_LOAD_WEIGHT: f64 = 20.0;
/// Heaviest load the player can select.
pub const MAX_LOAD_WEIGHT: f64 = 100.0;

/// Clamp a requested load weight to the supported range.
#[must_use]
pub fn clamp_load_weight(weight: f64) -> f64 {
    if weight.is_nan() {
        MIN_LOAD_WEIGHT
    } else {
        weight.clamp(MIN_LOAD_WEIGHT, MAX_LOAD_WEIGHT)
    }
}

/// Kind of vehicle, in increasing order of weight.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleClass {
    /// Up to 30.
    Bike,
    /// Up to 45.
    Motorcycle,
    /// Up to 65.
    Car,
    /// Up to 85.
    Van,
    /// Anything heavier.
    Truck,
}

impl fmt::Display for VehicleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VehicleClass::Bike => "bike",
            VehicleClass::Motorcycle => "motorcycle",
            VehicleClass::Car => "car",
            VehicleClass::Van => "van",
            VehicleClass::Truck => "truck",
        };
        f.write_str(name)
    }
}

/// Size and mass of the vehicle body for a given load.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct VehicleSpec {
    /// Vehicle kind.
    pub class: VehicleClass,
    /// Load weight the vehicle was chosen for.
    pub load_weight: f64,
    /// Nominal width of the vehicle sprite.
    pub width: f64,
    /// Nominal height of the vehicle sprite.
    pub height: f64,
    /// Mass of the physics body.
    pub mass: f64,
}

impl VehicleSpec {
    /// Pick the vehicle for a load weight.
    ///
    /// # Examples
    /// ```
    /// use bridgesim::vehicle::{VehicleClass, VehicleSpec};
    ///
    /// let car = VehicleSpec::for_load(60.0);
    /// assert_eq!(car.class, VehicleClass::Car);
    /// assert_eq!(car.mass, 10.0);
    /// ```
    #[must_use]
    pub fn for_load(load_weight: f64) -> Self {
        let (class, width, height, divisor) = if load_weight <= 30.0 {
            (VehicleClass::Bike, 60.0, 30.0, 10.0)
        } else if load_weight <= 45.0 {
            (VehicleClass::Motorcycle, 70.0, 35.0, 8.0)
        } else if load_weight <= 65.0 {
            (VehicleClass::Car, 80.0, 40.0, 6.0)
        } else if load_weight <= 85.0 {
            (VehicleClass::Van, 90.0, 45.0, 5.0)
        } else {
            (VehicleClass::Truck, 100.0, 50.0, 4.0)
        };
        Self {
            class,
            load_weight,
            width,
            height,
            mass: load_weight / divisor,
        }
    }

    /// Width and height of the physics body, slightly smaller than the sprite.
    #[must_use]
    pub fn body_size(&self) -> (f64, f64) {
        (self.width * 0.8, self.height * 0.6)
    }

    /// Horizontal force applied on every push.
    #[must_use]
    pub fn push_force(&self, push_factor: f64) -> f64 {
        self.mass * push_factor
    }
}

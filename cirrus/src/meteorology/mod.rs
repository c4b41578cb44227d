//! Meteorological formulas.
//!
//! Every function here is pure and total: out-of-range inputs such as 0%
//! humidity are accepted and produce mathematically defined, if physically
//! odd, results. Temperatures are °C, humidity is relative percent and wind
//! speeds are m/s unless a function says otherwise.

pub mod daylight;
pub mod dew_point;
pub mod indices;
pub mod wind;

pub use daylight::{SpaCalculator, SunCalculator, SunError, SunTimes, is_daylight};
pub use dew_point::dew_point;
pub use indices::{apparent_temperature, cloud_base_m, heat_index, humidex};
pub use wind::{BeaufortForce, CardinalDirection};

/// Converts km/h to m/s.
pub fn kph_to_mps(kph: f64) -> f64 {
    kph / 3.6
}

/// Converts metres to feet.
pub fn metres_to_feet(metres: f64) -> f64 {
    metres / 0.3048
}

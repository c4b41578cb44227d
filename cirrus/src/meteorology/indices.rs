//! Comfort indices and cloud base.

use super::dew_point::dew_point;

/// Coefficients of the Celsius heat index polynomial, `c1` through `c9`.
const HEAT_INDEX_COEFFICIENTS: [f64; 9] = [
    -8.784_694_755_56,
    1.611_394_11,
    2.338_548_838_89,
    -0.146_116_05,
    -0.012_308_094,
    -0.016_424_827_777_8,
    0.002_211_732,
    0.000_725_46,
    -0.000_003_582,
];

/// Below this temperature the heat index is the air temperature.
const HEAT_INDEX_THRESHOLD_C: f64 = 27.0;

/// Metres of cloud base per °C of temperature/dew point spread.
const CLOUD_BASE_M_PER_C: f64 = 125.0;

/// Heat index in °C.
///
/// Returns `temp_c` unchanged below 27 °C, where the regression does not apply.
pub fn heat_index(temp_c: f64, rh: f64) -> f64 {
    if temp_c < HEAT_INDEX_THRESHOLD_C {
        return temp_c;
    }

    let [c1, c2, c3, c4, c5, c6, c7, c8, c9] = HEAT_INDEX_COEFFICIENTS;
    let t = temp_c;
    let r = rh;
    let t2 = t * t;
    let r2 = r * r;

    c1 + c2 * t + c3 * r + c4 * t * r + c5 * t2 + c6 * r2 + c7 * t2 * r + c8 * t * r2 + c9 * t2 * r2
}

/// Humidex in °C, computed from the dew point.
pub fn humidex(temp_c: f64, rh: f64) -> f64 {
    let dew = dew_point(temp_c, rh);
    let vapour_pressure = 6.11 * (5417.753 * (1.0 / 273.16 - 1.0 / (273.15 + dew))).exp();
    temp_c + (5.0 / 9.0) * (vapour_pressure - 10.0)
}

/// Australian apparent temperature in °C for wind speed `wind_mps`.
///
/// The same value serves as wind chill and feels-like temperature.
pub fn apparent_temperature(temp_c: f64, wind_mps: f64, rh: f64) -> f64 {
    let vapour_pressure = (rh / 100.0) * 6.105 * (17.27 * temp_c / (237.7 + temp_c)).exp();
    temp_c + 0.33 * vapour_pressure - 0.7 * wind_mps - 4.0
}

/// Estimated cumulus cloud base in metres above the station.
///
/// Clamped at zero when the dew point is above the air temperature.
pub fn cloud_base_m(temp_c: f64, dew_c: f64) -> f64 {
    ((temp_c - dew_c) * CLOUD_BASE_M_PER_C).max(0.0)
}

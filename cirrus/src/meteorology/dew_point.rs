//! Dew point.

/// Magnus coefficient `b` (Arden Buck).
const B: f64 = 18.678;

/// Magnus coefficient `c` in °C (Arden Buck).
const C: f64 = 257.14;

/// Buck enhancement coefficient `d` in °C.
const D: f64 = 234.5;

/// Dew point in °C of air at `temp_c` and relative humidity `rh` percent.
///
/// Uses the Magnus form with the Arden Buck constants:
///
/// ```text
/// γ  = ln(rh/100 · e^((b − T/d)(T/(c + T))))
/// Td = c·γ / (b − γ)
/// ```
pub fn dew_point(temp_c: f64, rh: f64) -> f64 {
    let gamma = (rh / 100.0 * ((B - temp_c / D) * (temp_c / (C + temp_c))).exp()).ln();
    C * gamma / (B - gamma)
}

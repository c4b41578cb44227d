//! Daylight test from sunrise and sunset.
//!
//! The solar position algorithm sits behind [`SunCalculator`] so it can be
//! swapped or stubbed. [`SpaCalculator`] is the default and uses the NREL
//! solar position algorithm from the `spa` crate.

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use spa::{SunriseAndSet, calc_sunrise_and_set};
use thiserror::Error;
use tracing::warn;

use crate::window::local_midnight;

/// Sunrise and sunset for one day at one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SunTimes {
    /// The sun rises and sets.
    Daylight {
        /// Sunrise instant.
        sunrise: DateTime<Utc>,
        /// Sunset instant.
        sunset: DateTime<Utc>,
    },
    /// The sun stays above the horizon all day.
    PolarDay,
    /// The sun stays below the horizon all day.
    PolarNight,
}

/// A sunrise/sunset computation failed.
#[derive(Error, Debug)]
#[error("sunrise/sunset calculation failed: {reason}")]
pub struct SunError {
    /// Description from the underlying algorithm.
    pub reason: String,
}

/// Computes sunrise and sunset.
pub trait SunCalculator: Send + Sync {
    /// Sun times for the day containing `day`, at the given WGS84 position.
    ///
    /// # Errors
    ///
    /// Returns [`SunError`] if the algorithm rejects its inputs.
    fn sun_times(&self, day: DateTime<Utc>, latitude: f64, longitude: f64)
    -> Result<SunTimes, SunError>;
}

/// [`SunCalculator`] backed by the `spa` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpaCalculator;

impl SunCalculator for SpaCalculator {
    fn sun_times(
        &self,
        day: DateTime<Utc>,
        latitude: f64,
        longitude: f64,
    ) -> Result<SunTimes, SunError> {
        let times = calc_sunrise_and_set(day, latitude, longitude).map_err(|e| SunError {
            reason: format!("{e:?}"),
        })?;

        Ok(match times {
            SunriseAndSet::Daylight(sunrise, sunset) => SunTimes::Daylight { sunrise, sunset },
            SunriseAndSet::PolarDay => SunTimes::PolarDay,
            SunriseAndSet::PolarNight => SunTimes::PolarNight,
        })
    }
}

/// Returns `true` if `now` falls strictly between sunrise and sunset of its
/// local calendar day at `latitude`/`longitude`.
///
/// Polar day counts as daylight and polar night does not. A calculator
/// failure is logged and reported as `false`.
pub fn is_daylight<Tz: TimeZone>(
    now: &DateTime<Tz>,
    latitude: f64,
    longitude: f64,
    calculator: &dyn SunCalculator,
) -> bool {
    let day = local_noon(now);

    match calculator.sun_times(day, latitude, longitude) {
        Ok(SunTimes::Daylight { sunrise, sunset }) => {
            let (sunrise, sunset) = around_noon(sunrise, sunset, day);
            let now = now.with_timezone(&Utc);
            sunrise < now && now < sunset
        }
        Ok(SunTimes::PolarDay) => true,
        Ok(SunTimes::PolarNight) => false,
        Err(e) => {
            warn!(latitude, longitude, error = %e, "daylight unknown, assuming night");
            false
        }
    }
}

/// Local noon of `now`'s calendar day as a UTC instant.
fn local_noon<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Utc> {
    local_midnight(now) + TimeDelta::hours(12)
}

/// Shifts sunrise into the 24 hours ending at `noon` and sunset into the 24
/// hours starting at it.
///
/// Calculators work on UTC dates, so far from Greenwich one of the two
/// events can land on the neighbouring local day.
fn around_noon(
    sunrise: DateTime<Utc>,
    sunset: DateTime<Utc>,
    noon: DateTime<Utc>,
) -> (DateTime<Utc>, DateTime<Utc>) {
    const DAY: i64 = 86_400;
    let rise_days = -(-(sunrise - noon).num_seconds()).div_euclid(DAY);
    let set_days = (sunset - noon).num_seconds().div_euclid(DAY);
    (
        sunrise - TimeDelta::days(rise_days),
        sunset - TimeDelta::days(set_days),
    )
}

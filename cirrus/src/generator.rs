//! Statistics generation.
//!
//! [`StatisticsGenerator::generate`] derives a full [`Statistics`] snapshot
//! for an instant `now` from one consistent view of the store. It never
//! writes to the store, so calling it again with the same `now` and no new
//! inserts yields an equal snapshot.
//!
//! # Windows
//!
//! ```text
//! current conditions    last observation at or before now
//! daily figures         [local midnight, next local midnight)
//! trends                [now - 3h, now)
//! ten-minute figures    [now - 10min, now)
//! rainfall last hour    the last completed local hour
//! yesterday's rainfall  the previous local day
//! ```
//!
//! Trailing windows end before `now`. A row stamped exactly at `now` is the
//! current observation and counts toward the daily figures, but not toward
//! the trends or the ten-minute gust and bearing average. Generating for the
//! timestamp of the latest row therefore leaves that row out of them.

use chrono::{DateTime, FixedOffset, TimeDelta, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GenerateError, Result};
use crate::meteorology::{
    BeaufortForce, CardinalDirection, SpaCalculator, SunCalculator, apparent_temperature,
    cloud_base_m, dew_point, heat_index, humidex, is_daylight, kph_to_mps, metres_to_feet,
};
use crate::observation::{Column, Observation};
use crate::query::{Extremum, least_squares_slope};
use crate::statistics::{CloudBaseUnit, Extreme, Statistics};
use crate::store::{ObservationStore, ObservationView};
use crate::window::{Window, local_midnight};

/// Length of the trailing trend window.
const TREND_WINDOW: TimeDelta = TimeDelta::hours(3);

/// Length of the trailing ten-minute window.
const TEN_MINUTES: TimeDelta = TimeDelta::minutes(10);

/// Which barometer reading feeds the pressure statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BarometricMeasurement {
    /// Station pressure.
    #[default]
    Absolute,
    /// Pressure reduced to sea level.
    Relative,
}

impl BarometricMeasurement {
    /// Store column holding this measurement.
    pub fn column(self) -> Column {
        match self {
            Self::Absolute => Column::BarometricAbs,
            Self::Relative => Column::BarometricRel,
        }
    }
}

/// Station and reporting settings the generator needs.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    /// Station latitude, WGS84 degrees.
    pub latitude: f64,
    /// Station longitude, WGS84 degrees.
    pub longitude: f64,
    /// Barometer reading used for pressure, trend and extremes.
    pub barometric_measurement: BarometricMeasurement,
    /// Age after which the latest observation counts as lost contact.
    pub contact_timeout: TimeDelta,
    /// Unit for cloud base height.
    pub cloud_base_units: CloudBaseUnit,
    /// Protocol version string.
    pub version: String,
    /// Protocol build number.
    pub build_number: u32,
    /// Wind speed unit label.
    pub wind_units: String,
    /// Temperature unit label.
    pub temp_units: String,
    /// Pressure unit label.
    pub pressure_units: String,
    /// Rainfall unit label.
    pub rain_units: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            latitude: 0.0,
            longitude: 0.0,
            barometric_measurement: BarometricMeasurement::Absolute,
            contact_timeout: TimeDelta::seconds(900),
            cloud_base_units: CloudBaseUnit::Metres,
            version: "1.8.2".to_string(),
            build_number: 1,
            wind_units: "km/h".to_string(),
            temp_units: "C".to_string(),
            pressure_units: "hPa".to_string(),
            rain_units: "mm".to_string(),
        }
    }
}

/// Builds [`Statistics`] snapshots from an observation store.
pub struct StatisticsGenerator<S> {
    store: S,
    config: GeneratorConfig,
    sun: Box<dyn SunCalculator>,
}

impl<S> std::fmt::Debug for StatisticsGenerator<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatisticsGenerator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<S: ObservationStore> StatisticsGenerator<S> {
    /// Creates a generator using the default sunrise/sunset calculator.
    pub fn new(store: S, config: GeneratorConfig) -> Self {
        Self {
            store,
            config,
            sun: Box::new(SpaCalculator),
        }
    }

    /// Replaces the sunrise/sunset calculator.
    #[must_use]
    pub fn with_sun_calculator(mut self, sun: Box<dyn SunCalculator>) -> Self {
        self.sun = sun;
        self
    }

    /// Returns the generator configuration.
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Generates the snapshot for `now`.
    ///
    /// Calendar windows use the timezone of `now`; every time in the result
    /// is expressed in it.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::NoObservation`] if nothing was recorded at or
    /// before `now`, or a store error if the store cannot be read.
    pub fn generate<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Result<Statistics> {
        let now_utc = now.with_timezone(&Utc);
        let view = self.store.view()?;

        // 1. Current conditions.
        let current = view
            .last_at_or_before(now_utc)?
            .ok_or(GenerateError::NoObservation { at: now_utc })?;

        let config = &self.config;
        let pressure = config.barometric_measurement.column();
        let humidity = f64::from(current.humidity_outdoor);

        let mut stats = Statistics::new(now.fixed_offset());
        self.copy_current(&mut stats, &current);
        stats.barometric_pressure = pressure.value(&current);

        // 2. Dew point.
        stats.dew_point = dew_point(current.temp_outdoor_c, humidity);

        // 3. Daily averages.
        let day = Window::local_day(now);
        stats.wind_speed_avg = view.average(Column::WindSpeed, &day)?;
        let bearing_avg = view.average(Column::WindDirection, &day)?;

        // 4. Compass points.
        stats.wind_direction = CardinalDirection::from_degrees(current.wind_dir_deg);
        stats.wind_direction_avg = CardinalDirection::from_degrees(bearing_avg);

        // 5. Beaufort force.
        stats.wind_force = BeaufortForce::from_speed(kph_to_mps(stats.wind_speed_avg));

        // 6. Wind run: km/h x s -> m -> km.
        let kph_seconds = view.delta_weighted_sum(Column::WindSpeed, &day)?;
        stats.wind_run = kph_to_mps(kph_seconds) / 1000.0;

        // 7. Trends.
        let trend = Window::trailing(now, TREND_WINDOW);
        stats.pressure_trend = trend_over(&view, pressure, &trend)?;
        stats.temp_trend = trend_over(&view, Column::TempOutdoor, &trend)?;

        // 8. Daily extremes.
        let midnight = local_midnight(now).with_timezone(&now.timezone()).fixed_offset();
        let extreme = |column, kind| daily_extreme(&view, now, column, kind, &day, midnight);
        stats.today_temp_hi = extreme(Column::TempOutdoor, Extremum::Max)?;
        stats.today_temp_lo = extreme(Column::TempOutdoor, Extremum::Min)?;
        stats.today_wind_hi = extreme(Column::WindSpeed, Extremum::Max)?;
        stats.today_gust_hi = extreme(Column::WindGust, Extremum::Max)?;
        stats.today_pressure_hi = extreme(pressure, Extremum::Max)?;
        stats.today_pressure_lo = extreme(pressure, Extremum::Min)?;

        // 9. Rainfall during the last completed hour.
        let last_hour = Window::previous_local_hour(now);
        stats.rainfall_last_hour = max_or_zero(&view, Column::HourlyRain, &last_hour)?;

        // 10. Ten-minute figures.
        let ten = Window::trailing(now, TEN_MINUTES);
        stats.ten_min_gust_hi = max_or_zero(&view, Column::WindGust, &ten)?;
        stats.ten_min_bearing_avg = view.average(Column::WindDirection, &ten)?;

        // 11. Comfort indices.
        stats.heat_index = heat_index(current.temp_outdoor_c, humidity);
        stats.humidex = humidex(current.temp_outdoor_c, humidity);

        // 12. Daylight.
        stats.is_daylight = is_daylight(now, config.latitude, config.longitude, self.sun.as_ref());

        // 13. Wind chill, apparent and feels-like temperature.
        let apparent = apparent_temperature(
            current.temp_outdoor_c,
            kph_to_mps(current.wind_speed_kph),
            humidity,
        );
        stats.wind_chill = apparent;
        stats.apparent_temperature = apparent;
        stats.feels_like = apparent;

        // Yesterday's rainfall: the daily counter peaks just before reset.
        let yesterday = Window::previous_local_day(now);
        stats.yesterday_rainfall = max_or_zero(&view, Column::DailyRain, &yesterday)?;

        stats.cloud_base = self.cloud_base(current.temp_outdoor_c, stats.dew_point);
        stats.sensor_contact_lost = now_utc - current.timestamp > config.contact_timeout;

        drop(view);

        debug!(
            now = %stats.timestamp,
            observation = current.id,
            wind_run_km = stats.wind_run,
            pressure_trend = stats.pressure_trend,
            temp_trend = stats.temp_trend,
            daylight = stats.is_daylight,
            "generated statistics"
        );

        Ok(stats)
    }

    /// Copies the fields taken verbatim from the latest observation.
    fn copy_current(&self, stats: &mut Statistics, current: &Observation) {
        let config = &self.config;

        stats.outdoor_temperature = current.temp_outdoor_c;
        stats.outdoor_humidity = current.humidity_outdoor;
        stats.indoor_temperature = current.temp_indoor_c;
        stats.indoor_humidity = current.humidity_indoor;
        stats.wind_speed_last = current.wind_speed_kph;
        stats.wind_bearing = current.wind_dir_deg;
        stats.rain_rate = current.rain_rate_mm;
        stats.rainfall_today = current.daily_rain_mm;
        stats.monthly_rainfall = current.monthly_rain_mm;
        stats.yearly_rainfall = current.total_rain_mm;
        stats.solar_radiation = current.solar_radiation_wm2;
        stats.uv_index = current.uv_index;

        stats.wind_units.clone_from(&config.wind_units);
        stats.temp_units.clone_from(&config.temp_units);
        stats.pressure_units.clone_from(&config.pressure_units);
        stats.rain_units.clone_from(&config.rain_units);
        stats.version.clone_from(&config.version);
        stats.build_number = config.build_number;
        stats.cloud_base_units = config.cloud_base_units;
    }

    /// Cloud base in the configured unit, rounded to whole units.
    // Clamped at zero and far below u32::MAX.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn cloud_base(&self, temp_c: f64, dew_c: f64) -> u32 {
        let metres = cloud_base_m(temp_c, dew_c);
        let height = match self.config.cloud_base_units {
            CloudBaseUnit::Metres => metres,
            CloudBaseUnit::Feet => metres_to_feet(metres),
        };
        height.round() as u32
    }
}

/// Change of `column` over `window` from the least-squares slope.
fn trend_over<V: ObservationView>(view: &V, column: Column, window: &Window) -> Result<f64> {
    let series = view.paired_series(column, window)?;
    let seconds = crate::query::seconds(window.length());
    Ok(least_squares_slope(&series).map_or(0.0, |slope| slope * seconds))
}

fn max_or_zero<V: ObservationView>(view: &V, column: Column, window: &Window) -> Result<f64> {
    Ok(view
        .extremum(column, Extremum::Max, window)?
        .map_or(0.0, |sample| sample.value))
}

/// Daily extreme in local time, or zero at local midnight when the day is empty.
fn daily_extreme<V: ObservationView, Tz: TimeZone>(
    view: &V,
    now: &DateTime<Tz>,
    column: Column,
    kind: Extremum,
    day: &Window,
    midnight: DateTime<FixedOffset>,
) -> Result<Extreme> {
    Ok(match view.extremum(column, kind, day)? {
        Some(sample) => Extreme {
            value: sample.value,
            time: sample.timestamp.with_timezone(&now.timezone()).fixed_offset(),
        },
        None => Extreme::empty(midnight),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meteorology::{SunError, SunTimes};
    use crate::store::Store;
    use std::sync::Arc;

    struct PolarDay;

    impl SunCalculator for PolarDay {
        fn sun_times(
            &self,
            _: DateTime<Utc>,
            _: f64,
            _: f64,
        ) -> std::result::Result<SunTimes, SunError> {
            Ok(SunTimes::PolarDay)
        }
    }

    fn generator(store: Arc<Store>, config: GeneratorConfig) -> StatisticsGenerator<Arc<Store>> {
        StatisticsGenerator::new(store, config).with_sun_calculator(Box::new(PolarDay))
    }

    fn obs(h: u32, m: u32, temp: f64) -> Observation {
        let mut o = Observation::new(Utc.with_ymd_and_hms(2008, 10, 18, h, m, 0).unwrap());
        o.temp_outdoor_c = temp;
        o.humidity_outdoor = 84;
        o.barometric_abs_hpa = 990.0 + f64::from(m) / 10.0;
        o.barometric_rel_hpa = 1015.0 + f64::from(m) / 10.0;
        o
    }

    #[test]
    fn test_no_observation_is_distinct_error() {
        let store = Arc::new(Store::in_memory());
        store.insert(obs(12, 0, 8.0)).unwrap();
        let generator = generator(store, GeneratorConfig::default());

        let before = Utc.with_ymd_and_hms(2008, 10, 18, 11, 59, 0).unwrap();
        let err = generator.generate(&before).unwrap_err();
        assert!(err.is_no_observation());
    }

    #[test]
    fn test_empty_day_extremes_are_zero_at_local_midnight() {
        let store = Arc::new(Store::in_memory());
        let mut late = Observation::new(Utc.with_ymd_and_hms(2008, 10, 17, 23, 0, 0).unwrap());
        late.temp_outdoor_c = 12.0;
        late.daily_rain_mm = 4.2;
        store.insert(late).unwrap();

        let generator = generator(store, GeneratorConfig::default());
        let now = Utc.with_ymd_and_hms(2008, 10, 18, 1, 0, 0).unwrap();
        let stats = generator.generate(&now).unwrap();

        let midnight = Utc.with_ymd_and_hms(2008, 10, 18, 0, 0, 0).unwrap().fixed_offset();
        assert_eq!(stats.today_temp_hi, Extreme { value: 0.0, time: midnight });
        assert_eq!(stats.today_pressure_lo, Extreme { value: 0.0, time: midnight });
        assert_eq!(stats.wind_speed_avg, 0.0);
        assert_eq!(stats.outdoor_temperature, 12.0);
        assert_eq!(stats.yesterday_rainfall, 4.2);
        assert!(stats.sensor_contact_lost);
    }

    #[test]
    fn test_relative_barometer_feeds_pressure_fields() {
        let store = Arc::new(Store::in_memory());
        store.insert(obs(12, 0, 8.0)).unwrap();
        store.insert(obs(12, 30, 8.0)).unwrap();

        let now = Utc.with_ymd_and_hms(2008, 10, 18, 12, 31, 0).unwrap();

        let absolute = generator(Arc::clone(&store), GeneratorConfig::default())
            .generate(&now)
            .unwrap();
        assert_eq!(absolute.barometric_pressure, 993.0);
        assert_eq!(absolute.today_pressure_lo.value, 990.0);

        let config = GeneratorConfig {
            barometric_measurement: BarometricMeasurement::Relative,
            ..GeneratorConfig::default()
        };
        let relative = generator(store, config).generate(&now).unwrap();
        assert_eq!(relative.barometric_pressure, 1018.0);
        assert_eq!(relative.today_pressure_hi.value, 1018.0);
        assert!((relative.pressure_trend - absolute.pressure_trend).abs() < 1e-9);
    }

    #[test]
    fn test_row_at_now_is_current_but_outside_trailing_windows() {
        let store = Arc::new(Store::in_memory());
        for (m, temp, gust) in [(0, 8.0, 10.0), (5, 8.0, 10.0), (10, 20.0, 50.0)] {
            let mut o = obs(12, m, temp);
            o.wind_gust_kph = gust;
            store.insert(o).unwrap();
        }

        let now = Utc.with_ymd_and_hms(2008, 10, 18, 12, 10, 0).unwrap();
        let stats = generator(store, GeneratorConfig::default()).generate(&now).unwrap();

        assert_eq!(stats.outdoor_temperature, 20.0);
        assert_eq!(stats.today_temp_hi.value, 20.0);
        assert_eq!(stats.today_gust_hi.value, 50.0);
        assert_eq!(stats.ten_min_gust_hi, 10.0);
        // Only the two flat 8.0 readings fall in [09:10, 12:10).
        assert_eq!(stats.temp_trend, 0.0);
    }

    #[test]
    fn test_trend_needs_two_timestamps() {
        let store = Arc::new(Store::in_memory());
        store.insert(obs(12, 0, 8.0)).unwrap();
        let now = Utc.with_ymd_and_hms(2008, 10, 18, 12, 5, 0).unwrap();

        let stats = generator(store, GeneratorConfig::default()).generate(&now).unwrap();
        assert_eq!(stats.pressure_trend, 0.0);
        assert_eq!(stats.temp_trend, 0.0);
    }

    #[test]
    fn test_linear_trend_scales_to_three_hours() {
        let store = Arc::new(Store::in_memory());
        // +0.5 °C every 30 minutes is +3 °C over three hours.
        for (h, m, t) in [(10, 0, 5.0), (10, 30, 5.5), (11, 0, 6.0), (11, 30, 6.5)] {
            store.insert(obs(h, m, t)).unwrap();
        }
        let now = Utc.with_ymd_and_hms(2008, 10, 18, 12, 0, 0).unwrap();

        let stats = generator(store, GeneratorConfig::default()).generate(&now).unwrap();
        assert!((stats.temp_trend - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_cloud_base_units() {
        let store = Arc::new(Store::in_memory());
        store.insert(obs(12, 0, 8.4)).unwrap();
        let now = Utc.with_ymd_and_hms(2008, 10, 18, 12, 1, 0).unwrap();

        let metres = generator(Arc::clone(&store), GeneratorConfig::default())
            .generate(&now)
            .unwrap();
        let config = GeneratorConfig {
            cloud_base_units: CloudBaseUnit::Feet,
            ..GeneratorConfig::default()
        };
        let feet = generator(store, config).generate(&now).unwrap();

        let expected_m = cloud_base_m(8.4, metres.dew_point).round();
        assert_eq!(f64::from(metres.cloud_base), expected_m);
        assert_eq!(feet.cloud_base_units, CloudBaseUnit::Feet);
        assert!(feet.cloud_base > metres.cloud_base);
    }

    #[test]
    fn test_labels_come_from_config() {
        let store = Arc::new(Store::in_memory());
        store.insert(obs(12, 0, 8.4)).unwrap();
        let now = Utc.with_ymd_and_hms(2008, 10, 18, 12, 1, 0).unwrap();

        let config = GeneratorConfig {
            wind_units: "kph".to_string(),
            version: "1.9.4".to_string(),
            build_number: 1099,
            ..GeneratorConfig::default()
        };
        let stats = generator(store, config).generate(&now).unwrap();
        assert_eq!(stats.wind_units, "kph");
        assert_eq!(stats.temp_units, "C");
        assert_eq!(stats.version, "1.9.4");
        assert_eq!(stats.build_number, 1099);
        assert!(stats.is_daylight);
    }
}

//! The statistics snapshot assembled by one generator run.
//!
//! Units are fixed per field: temperatures °C, pressures hPa, speeds km/h,
//! rainfall mm, wind run km, bearings degrees, irradiance W/m². Times are in
//! the UTC offset of the `now` the snapshot was generated for.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::meteorology::{BeaufortForce, CardinalDirection};

/// A daily extreme and the local time it occurred.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extreme {
    /// Extreme value.
    pub value: f64,
    /// When it was observed.
    pub time: DateTime<FixedOffset>,
}

impl Extreme {
    /// An extreme with no data: zero at `time`.
    pub fn empty(time: DateTime<FixedOffset>) -> Self {
        Self { value: 0.0, time }
    }
}

/// Unit for reporting cloud base height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CloudBaseUnit {
    /// Metres.
    #[default]
    #[serde(rename = "m")]
    Metres,
    /// Feet.
    #[serde(rename = "ft")]
    Feet,
}

impl CloudBaseUnit {
    /// Unit token used in the realtime record.
    pub fn code(self) -> &'static str {
        match self {
            Self::Metres => "m",
            Self::Feet => "ft",
        }
    }
}

impl fmt::Display for CloudBaseUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One snapshot of current conditions, trends and daily extremes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    /// Instant the snapshot describes.
    pub timestamp: DateTime<FixedOffset>,
    /// Outdoor temperature.
    pub outdoor_temperature: f64,
    /// Outdoor relative humidity, percent.
    pub outdoor_humidity: u8,
    /// Outdoor dew point.
    pub dew_point: f64,
    /// Average wind speed over the current local day.
    pub wind_speed_avg: f64,
    /// Latest wind speed reading.
    pub wind_speed_last: f64,
    /// Latest wind bearing.
    pub wind_bearing: f64,
    /// Current rain rate per hour.
    pub rain_rate: f64,
    /// Rain so far today.
    pub rainfall_today: f64,
    /// Station barometer.
    pub barometric_pressure: f64,
    /// Compass point of the latest wind bearing.
    pub wind_direction: CardinalDirection,
    /// Beaufort force of the daily average wind speed.
    pub wind_force: BeaufortForce,
    /// Wind speed unit label.
    pub wind_units: String,
    /// Temperature unit label.
    pub temp_units: String,
    /// Pressure unit label.
    pub pressure_units: String,
    /// Rainfall unit label.
    pub rain_units: String,
    /// Wind run over the current local day, km.
    pub wind_run: f64,
    /// Pressure change over the last three hours.
    pub pressure_trend: f64,
    /// Rain this month.
    pub monthly_rainfall: f64,
    /// Rain since the counter was reset.
    pub yearly_rainfall: f64,
    /// Rain during the previous local day.
    pub yesterday_rainfall: f64,
    /// Indoor temperature.
    pub indoor_temperature: f64,
    /// Indoor relative humidity, percent.
    pub indoor_humidity: u8,
    /// Wind chill.
    pub wind_chill: f64,
    /// Temperature change over the last three hours.
    pub temp_trend: f64,
    /// Today's highest outdoor temperature.
    pub today_temp_hi: Extreme,
    /// Today's lowest outdoor temperature.
    pub today_temp_lo: Extreme,
    /// Today's highest wind speed.
    pub today_wind_hi: Extreme,
    /// Today's highest gust.
    pub today_gust_hi: Extreme,
    /// Today's highest pressure.
    pub today_pressure_hi: Extreme,
    /// Today's lowest pressure.
    pub today_pressure_lo: Extreme,
    /// Protocol version string reported to consumers.
    pub version: String,
    /// Protocol build number reported to consumers.
    pub build_number: u32,
    /// Highest gust in the last ten minutes.
    pub ten_min_gust_hi: f64,
    /// Heat index.
    pub heat_index: f64,
    /// Humidex.
    pub humidex: f64,
    /// UV index.
    pub uv_index: u8,
    /// Evapotranspiration today. Not measured by the station.
    pub evapotranspiration: f64,
    /// Solar radiation.
    pub solar_radiation: f64,
    /// Average wind bearing over the last ten minutes.
    pub ten_min_bearing_avg: f64,
    /// Rain during the last completed local hour.
    pub rainfall_last_hour: f64,
    /// Zambretti forecast number. Not computed.
    pub forecast_code: u8,
    /// Whether the sun is up at the station.
    pub is_daylight: bool,
    /// Whether the latest observation is older than the contact timeout.
    pub sensor_contact_lost: bool,
    /// Compass point of the daily average bearing.
    pub wind_direction_avg: CardinalDirection,
    /// Estimated cloud base height.
    pub cloud_base: u32,
    /// Unit of [`Statistics::cloud_base`].
    pub cloud_base_units: CloudBaseUnit,
    /// Apparent temperature.
    pub apparent_temperature: f64,
    /// Sunshine so far today. Not measured by the station.
    pub sunshine_today: Duration,
    /// Theoretical clear-sky solar radiation. Not computed.
    pub current_solar_max: f64,
    /// Whether the sun is shining. Not measured by the station.
    pub is_sunny: bool,
    /// Feels-like temperature.
    pub feels_like: f64,
}

impl Statistics {
    /// A snapshot at `timestamp` with every value zeroed and empty labels.
    pub fn new(timestamp: DateTime<FixedOffset>) -> Self {
        Self {
            timestamp,
            outdoor_temperature: 0.0,
            outdoor_humidity: 0,
            dew_point: 0.0,
            wind_speed_avg: 0.0,
            wind_speed_last: 0.0,
            wind_bearing: 0.0,
            rain_rate: 0.0,
            rainfall_today: 0.0,
            barometric_pressure: 0.0,
            wind_direction: CardinalDirection::N,
            wind_force: BeaufortForce::Calm,
            wind_units: String::new(),
            temp_units: String::new(),
            pressure_units: String::new(),
            rain_units: String::new(),
            wind_run: 0.0,
            pressure_trend: 0.0,
            monthly_rainfall: 0.0,
            yearly_rainfall: 0.0,
            yesterday_rainfall: 0.0,
            indoor_temperature: 0.0,
            indoor_humidity: 0,
            wind_chill: 0.0,
            temp_trend: 0.0,
            today_temp_hi: Extreme::empty(timestamp),
            today_temp_lo: Extreme::empty(timestamp),
            today_wind_hi: Extreme::empty(timestamp),
            today_gust_hi: Extreme::empty(timestamp),
            today_pressure_hi: Extreme::empty(timestamp),
            today_pressure_lo: Extreme::empty(timestamp),
            version: String::new(),
            build_number: 0,
            ten_min_gust_hi: 0.0,
            heat_index: 0.0,
            humidex: 0.0,
            uv_index: 0,
            evapotranspiration: 0.0,
            solar_radiation: 0.0,
            ten_min_bearing_avg: 0.0,
            rainfall_last_hour: 0.0,
            forecast_code: 0,
            is_daylight: false,
            sensor_contact_lost: false,
            wind_direction_avg: CardinalDirection::N,
            cloud_base: 0,
            cloud_base_units: CloudBaseUnit::Metres,
            apparent_temperature: 0.0,
            sunshine_today: Duration::ZERO,
            current_solar_max: 0.0,
            is_sunny: false,
            feels_like: 0.0,
        }
    }
}

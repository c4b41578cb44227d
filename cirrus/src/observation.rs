//! Observation rows and the columns that windowed queries can address.
//!
//! An [`Observation`] is one immutable sensor reading. Units are fixed per
//! field and encoded in the field names: pressures in hPa, rainfall in mm,
//! speeds in km/h, temperatures in °C, irradiance in W/m².

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One timestamped weather station reading.
///
/// The `id` is assigned by the store on insert; any value present on an
/// observation passed to [`crate::store::ObservationStore::insert`] is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Surrogate identifier, monotonic and never reused.
    #[serde(default)]
    pub id: u64,
    /// Instant the reading was taken.
    pub timestamp: DateTime<Utc>,
    /// Absolute (station) barometric pressure.
    #[serde(default)]
    pub barometric_abs_hpa: f64,
    /// Relative (sea level) barometric pressure.
    #[serde(default)]
    pub barometric_rel_hpa: f64,
    /// Rain counter that resets every hour.
    #[serde(default)]
    pub hourly_rain_mm: f64,
    /// Rain counter that resets every day.
    #[serde(default)]
    pub daily_rain_mm: f64,
    /// Rain counter that resets every week.
    #[serde(default)]
    pub weekly_rain_mm: f64,
    /// Rain counter that resets every month.
    #[serde(default)]
    pub monthly_rain_mm: f64,
    /// Rain counter since the station was installed.
    #[serde(default)]
    pub total_rain_mm: f64,
    /// Rain counter for the current rain event.
    #[serde(default)]
    pub event_rain_mm: f64,
    /// Current rain rate per hour.
    #[serde(default)]
    pub rain_rate_mm: f64,
    /// Outdoor relative humidity, percent.
    #[serde(default)]
    pub humidity_outdoor: u8,
    /// Indoor relative humidity, percent.
    #[serde(default)]
    pub humidity_indoor: u8,
    /// Wind direction in degrees.
    #[serde(default)]
    pub wind_dir_deg: f64,
    /// Wind gust speed.
    #[serde(default)]
    pub wind_gust_kph: f64,
    /// Wind speed.
    #[serde(default)]
    pub wind_speed_kph: f64,
    /// Maximum gust reported by the station for the day.
    #[serde(default)]
    pub max_daily_gust_kph: f64,
    /// Solar radiation.
    #[serde(default)]
    pub solar_radiation_wm2: f64,
    /// Outdoor temperature.
    #[serde(default)]
    pub temp_outdoor_c: f64,
    /// Indoor temperature.
    #[serde(default)]
    pub temp_indoor_c: f64,
    /// UV index.
    #[serde(default)]
    pub uv_index: u8,
}

impl Observation {
    /// Creates an observation at `timestamp` with every measurement zeroed.
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            timestamp,
            barometric_abs_hpa: 0.0,
            barometric_rel_hpa: 0.0,
            hourly_rain_mm: 0.0,
            daily_rain_mm: 0.0,
            weekly_rain_mm: 0.0,
            monthly_rain_mm: 0.0,
            total_rain_mm: 0.0,
            event_rain_mm: 0.0,
            rain_rate_mm: 0.0,
            humidity_outdoor: 0,
            humidity_indoor: 0,
            wind_dir_deg: 0.0,
            wind_gust_kph: 0.0,
            wind_speed_kph: 0.0,
            max_daily_gust_kph: 0.0,
            solar_radiation_wm2: 0.0,
            temp_outdoor_c: 0.0,
            temp_indoor_c: 0.0,
            uv_index: 0,
        }
    }
}

/// A numeric observation field addressable by windowed queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    /// [`Observation::barometric_abs_hpa`].
    BarometricAbs,
    /// [`Observation::barometric_rel_hpa`].
    BarometricRel,
    /// [`Observation::hourly_rain_mm`].
    HourlyRain,
    /// [`Observation::daily_rain_mm`].
    DailyRain,
    /// [`Observation::weekly_rain_mm`].
    WeeklyRain,
    /// [`Observation::monthly_rain_mm`].
    MonthlyRain,
    /// [`Observation::total_rain_mm`].
    TotalRain,
    /// [`Observation::event_rain_mm`].
    EventRain,
    /// [`Observation::rain_rate_mm`].
    RainRate,
    /// [`Observation::humidity_outdoor`].
    HumidityOutdoor,
    /// [`Observation::humidity_indoor`].
    HumidityIndoor,
    /// [`Observation::wind_dir_deg`].
    WindDirection,
    /// [`Observation::wind_gust_kph`].
    WindGust,
    /// [`Observation::wind_speed_kph`].
    WindSpeed,
    /// [`Observation::max_daily_gust_kph`].
    MaxDailyGust,
    /// [`Observation::solar_radiation_wm2`].
    SolarRadiation,
    /// [`Observation::temp_outdoor_c`].
    TempOutdoor,
    /// [`Observation::temp_indoor_c`].
    TempIndoor,
    /// [`Observation::uv_index`].
    UvIndex,
}

impl Column {
    /// Reads this column from an observation.
    pub fn value(self, observation: &Observation) -> f64 {
        match self {
            Self::BarometricAbs => observation.barometric_abs_hpa,
            Self::BarometricRel => observation.barometric_rel_hpa,
            Self::HourlyRain => observation.hourly_rain_mm,
            Self::DailyRain => observation.daily_rain_mm,
            Self::WeeklyRain => observation.weekly_rain_mm,
            Self::MonthlyRain => observation.monthly_rain_mm,
            Self::TotalRain => observation.total_rain_mm,
            Self::EventRain => observation.event_rain_mm,
            Self::RainRate => observation.rain_rate_mm,
            Self::HumidityOutdoor => f64::from(observation.humidity_outdoor),
            Self::HumidityIndoor => f64::from(observation.humidity_indoor),
            Self::WindDirection => observation.wind_dir_deg,
            Self::WindGust => observation.wind_gust_kph,
            Self::WindSpeed => observation.wind_speed_kph,
            Self::MaxDailyGust => observation.max_daily_gust_kph,
            Self::SolarRadiation => observation.solar_radiation_wm2,
            Self::TempOutdoor => observation.temp_outdoor_c,
            Self::TempIndoor => observation.temp_indoor_c,
            Self::UvIndex => f64::from(observation.uv_index),
        }
    }

    /// Column name as it appears on [`Observation`] and in logs.
    pub fn name(self) -> &'static str {
        match self {
            Self::BarometricAbs => "barometric_abs_hpa",
            Self::BarometricRel => "barometric_rel_hpa",
            Self::HourlyRain => "hourly_rain_mm",
            Self::DailyRain => "daily_rain_mm",
            Self::WeeklyRain => "weekly_rain_mm",
            Self::MonthlyRain => "monthly_rain_mm",
            Self::TotalRain => "total_rain_mm",
            Self::EventRain => "event_rain_mm",
            Self::RainRate => "rain_rate_mm",
            Self::HumidityOutdoor => "humidity_outdoor",
            Self::HumidityIndoor => "humidity_indoor",
            Self::WindDirection => "wind_dir_deg",
            Self::WindGust => "wind_gust_kph",
            Self::WindSpeed => "wind_speed_kph",
            Self::MaxDailyGust => "max_daily_gust_kph",
            Self::SolarRadiation => "solar_radiation_wm2",
            Self::TempOutdoor => "temp_outdoor_c",
            Self::TempIndoor => "temp_indoor_c",
            Self::UvIndex => "uv_index",
        }
    }
}

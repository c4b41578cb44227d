//! TOML configuration.
//!
//! Every section and key is optional; missing values take the defaults
//! below.
//!
//! ```toml
//! database_path = "weather"
//!
//! [location]
//! latitude = -37.81
//! longitude = 144.96
//!
//! [reporting]
//! barometric_measurement = "absolute"   # or "relative"
//! contact_timeout_secs = 900
//! cloud_base_units = "m"                # or "ft"
//! version = "1.8.2"
//! build_number = 1
//!
//! [realtime]
//! interval_secs = 300
//! output_path = "realtime.txt"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, Result};
use crate::generator::{BarometricMeasurement, GeneratorConfig};
use crate::schedule::Schedule;
use crate::statistics::CloudBaseUnit;

/// Top-level configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory holding the observation journal.
    pub database_path: PathBuf,
    /// Station position.
    pub location: LocationConfig,
    /// Reporting options for the statistics snapshot.
    pub reporting: ReportingConfig,
    /// Realtime record publishing.
    pub realtime: RealtimeConfig,
}

/// Station position in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LocationConfig {
    /// Latitude, `-90.0` to `90.0`.
    pub latitude: f64,
    /// Longitude, `-180.0` to `180.0`.
    pub longitude: f64,
}

/// How statistics are reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportingConfig {
    /// Barometer reading used for pressure statistics.
    pub barometric_measurement: BarometricMeasurement,
    /// Seconds without an observation before contact counts as lost.
    pub contact_timeout_secs: u64,
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

impl Default for ReportingConfig {
    fn default() -> Self {
        let generator = GeneratorConfig::default();
        Self {
            barometric_measurement: generator.barometric_measurement,
            contact_timeout_secs: 900,
            cloud_base_units: generator.cloud_base_units,
            version: generator.version,
            build_number: generator.build_number,
            wind_units: generator.wind_units,
            temp_units: generator.temp_units,
            pressure_units: generator.pressure_units,
            rain_units: generator.rain_units,
        }
    }
}

/// Realtime record publishing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RealtimeConfig {
    /// Seconds between records, aligned to the local wall clock.
    pub interval_secs: u64,
    /// Where the record is written.
    pub output_path: PathBuf,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            interval_secs: 300,
            output_path: PathBuf::from("realtime.txt"),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("weather"),
            location: LocationConfig::default(),
            reporting: ReportingConfig::default(),
            realtime: RealtimeConfig::default(),
        }
    }
}

impl Config {
    /// Reads, parses and validates the configuration at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read,
    /// [`ConfigError::Parse`] if it is not valid for this schema, or
    /// [`ConfigError::InvalidValue`] if a value is out of range.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;

        let config: Self = toml::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            source: e,
        })?;
        config.validate()?;

        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first bad key.
    pub fn validate(&self) -> Result<()> {
        let LocationConfig {
            latitude,
            longitude,
        } = self.location;
        if !(-90.0..=90.0).contains(&latitude) {
            return invalid("location.latitude", format!("{latitude} is outside -90..=90"));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return invalid("location.longitude", format!("{longitude} is outside -180..=180"));
        }

        if self.realtime.interval_secs == 0 || self.realtime.interval_secs > 86_400 {
            return invalid(
                "realtime.interval_secs",
                format!("{} must be between 1 and 86400", self.realtime.interval_secs),
            );
        }

        let labels = [
            ("reporting.version", &self.reporting.version),
            ("reporting.wind_units", &self.reporting.wind_units),
            ("reporting.temp_units", &self.reporting.temp_units),
            ("reporting.pressure_units", &self.reporting.pressure_units),
            ("reporting.rain_units", &self.reporting.rain_units),
        ];
        for (key, value) in labels {
            if value.is_empty() || value.chars().any(char::is_whitespace) {
                return invalid(key, format!("{value:?} must be one non-empty token"));
            }
        }

        Ok(())
    }

    /// Generator settings derived from this configuration.
    pub fn generator_config(&self) -> GeneratorConfig {
        let reporting = &self.reporting;
        GeneratorConfig {
            latitude: self.location.latitude,
            longitude: self.location.longitude,
            barometric_measurement: reporting.barometric_measurement,
            contact_timeout: i64::try_from(reporting.contact_timeout_secs)
                .ok()
                .and_then(TimeDelta::try_seconds)
                .unwrap_or(TimeDelta::MAX),
            cloud_base_units: reporting.cloud_base_units,
            version: reporting.version.clone(),
            build_number: reporting.build_number,
            wind_units: reporting.wind_units.clone(),
            temp_units: reporting.temp_units.clone(),
            pressure_units: reporting.pressure_units.clone(),
            rain_units: reporting.rain_units.clone(),
        }
    }

    /// Publishing schedule for the realtime record.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if the interval is out of range.
    pub fn schedule(&self) -> Result<Schedule> {
        Schedule::every(Duration::from_secs(self.realtime.interval_secs))
    }
}

fn invalid(key: &'static str, reason: String) -> Result<()> {
    Err(ConfigError::InvalidValue { key, reason }.into())
}

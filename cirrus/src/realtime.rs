//! Realtime text record.
//!
//! [`marshal`] encodes a [`Statistics`] snapshot as the 59-field,
//! space-separated line read by weather display software. The layout is
//! fixed: consumers address fields by position.
//!
//! # Field Formats
//!
//! ```text
//! magnitudes          one decimal          8.4
//! bearings, counts    integer              261
//! trends              signed one decimal   +0.1  -0.7
//! times of day        HH:MM                14:41
//! record time         HH:MM:SS             16:03:45
//! record date         DD/MM/YY             18/10/08
//! flags               1 / 0
//! ```

use std::fmt::Write;

use chrono::{DateTime, FixedOffset};

use crate::statistics::Statistics;

/// Number of fields in a realtime record.
pub const FIELD_COUNT: usize = 59;

/// Encodes `stats` as a realtime record.
///
/// The output has no trailing separator or newline and is byte-identical
/// for equal inputs.
pub fn marshal(stats: &Statistics) -> Vec<u8> {
    let mut r = RecordWriter::with_capacity(512);

    r.date(&stats.timestamp); // 01
    r.time(&stats.timestamp); // 02
    r.decimal(stats.outdoor_temperature); // 03
    r.integer(stats.outdoor_humidity); // 04
    r.decimal(stats.dew_point); // 05
    r.decimal(stats.wind_speed_avg); // 06
    r.decimal(stats.wind_speed_last); // 07
    r.bearing(stats.wind_bearing); // 08
    r.decimal(stats.rain_rate); // 09
    r.decimal(stats.rainfall_today); // 10
    r.decimal(stats.barometric_pressure); // 11
    r.token(stats.wind_direction.code()); // 12
    r.integer(stats.wind_force.as_u8()); // 13
    r.token(&stats.wind_units); // 14
    r.token(&stats.temp_units); // 15
    r.token(&stats.pressure_units); // 16
    r.token(&stats.rain_units); // 17
    r.decimal(stats.wind_run); // 18
    r.signed(stats.pressure_trend); // 19
    r.decimal(stats.monthly_rainfall); // 20
    r.decimal(stats.yearly_rainfall); // 21
    r.decimal(stats.yesterday_rainfall); // 22
    r.decimal(stats.indoor_temperature); // 23
    r.integer(stats.indoor_humidity); // 24
    r.decimal(stats.wind_chill); // 25
    r.signed(stats.temp_trend); // 26
    r.decimal(stats.today_temp_hi.value); // 27
    r.short_time(&stats.today_temp_hi.time); // 28
    r.decimal(stats.today_temp_lo.value); // 29
    r.short_time(&stats.today_temp_lo.time); // 30
    r.decimal(stats.today_wind_hi.value); // 31
    r.short_time(&stats.today_wind_hi.time); // 32
    r.decimal(stats.today_gust_hi.value); // 33
    r.short_time(&stats.today_gust_hi.time); // 34
    r.decimal(stats.today_pressure_hi.value); // 35
    r.short_time(&stats.today_pressure_hi.time); // 36
    r.decimal(stats.today_pressure_lo.value); // 37
    r.short_time(&stats.today_pressure_lo.time); // 38
    r.token(&stats.version); // 39
    r.integer(stats.build_number); // 40
    r.decimal(stats.ten_min_gust_hi); // 41
    r.decimal(stats.heat_index); // 42
    r.decimal(stats.humidex); // 43
    r.integer(stats.uv_index); // 44
    r.decimal(stats.evapotranspiration); // 45
    r.decimal(stats.solar_radiation); // 46
    r.bearing(stats.ten_min_bearing_avg); // 47
    r.decimal(stats.rainfall_last_hour); // 48
    r.integer(stats.forecast_code); // 49
    r.flag(stats.is_daylight); // 50
    r.flag(stats.sensor_contact_lost); // 51
    r.token(stats.wind_direction_avg.code()); // 52
    r.integer(stats.cloud_base); // 53
    r.token(stats.cloud_base_units.code()); // 54
    r.decimal(stats.apparent_temperature); // 55
    r.decimal(stats.sunshine_today.as_secs_f64() / 3600.0); // 56
    r.truncated(stats.current_solar_max); // 57
    r.flag(stats.is_sunny); // 58
    r.decimal(stats.feels_like); // 59

    r.finish()
}

/// Accumulates space-terminated fields.
struct RecordWriter {
    buf: String,
}

impl RecordWriter {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: String::with_capacity(capacity),
        }
    }

    // `write!` into a String cannot fail.

    fn decimal(&mut self, value: f64) {
        let _ = write!(self.buf, "{value:.1} ");
    }

    fn signed(&mut self, value: f64) {
        // Negative zero reads as no change.
        let value = if value == 0.0 { 0.0 } else { value };
        if value >= 0.0 {
            self.buf.push('+');
        }
        self.decimal(value);
    }

    fn bearing(&mut self, degrees: f64) {
        let _ = write!(self.buf, "{degrees:.0} ");
    }

    fn integer(&mut self, value: impl Into<u64>) {
        let _ = write!(self.buf, "{} ", value.into());
    }

    fn truncated(&mut self, value: f64) {
        let _ = write!(self.buf, "{:.0} ", value.trunc());
    }

    fn flag(&mut self, value: bool) {
        self.buf.push_str(if value { "1 " } else { "0 " });
    }

    fn token(&mut self, token: &str) {
        self.buf.push_str(token);
        self.buf.push(' ');
    }

    fn date(&mut self, t: &DateTime<FixedOffset>) {
        let _ = write!(self.buf, "{} ", t.format("%d/%m/%y"));
    }

    fn time(&mut self, t: &DateTime<FixedOffset>) {
        let _ = write!(self.buf, "{} ", t.format("%H:%M:%S"));
    }

    fn short_time(&mut self, t: &DateTime<FixedOffset>) {
        let _ = write!(self.buf, "{} ", t.format("%H:%M"));
    }

    fn finish(mut self) -> Vec<u8> {
        if self.buf.ends_with(' ') {
            self.buf.pop();
        }
        self.buf.into_bytes()
    }
}

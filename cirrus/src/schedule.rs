//! Fixed-interval schedules aligned to the local wall clock.
//!
//! A five-minute schedule fires at :00, :05, :10 and so on in the timezone
//! of the instant it is asked about, counted from local midnight. Intervals
//! that do not divide a day evenly restart at each local midnight.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, TimeZone, Utc};

use crate::error::{ConfigError, Result};
use crate::window::Window;

/// A repeating wall-clock schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    interval: TimeDelta,
}

impl Schedule {
    /// A schedule firing every `interval`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if `interval` is zero or longer
    /// than a day.
    pub fn every(interval: Duration) -> Result<Self> {
        let interval = TimeDelta::from_std(interval)
            .ok()
            .filter(|d| *d > TimeDelta::zero() && *d <= TimeDelta::days(1))
            .ok_or_else(|| ConfigError::InvalidValue {
                key: "interval",
                reason: format!("{interval:?} must be positive and at most one day"),
            })?;
        Ok(Self { interval })
    }

    /// The interval between firings.
    pub fn interval(&self) -> TimeDelta {
        self.interval
    }

    /// First firing strictly after `after`.
    ///
    /// Firings are counted in elapsed time from local midnight and the last
    /// one of a day is cut short at the next local midnight, including on
    /// days when the clocks change.
    pub fn next_after<Tz: TimeZone>(&self, after: &DateTime<Tz>) -> DateTime<Utc> {
        let day = Window::local_day(after);
        let after = after.with_timezone(&Utc);
        let elapsed = (after - day.start).num_milliseconds();
        let step = self.interval.num_milliseconds().max(1);

        let next = day.start + TimeDelta::milliseconds((elapsed.div_euclid(step) + 1) * step);
        let next = next.min(day.end);
        if next > after {
            next
        } else {
            after + self.interval
        }
    }

    /// Time to wait from `now` until the next firing.
    pub fn delay_after<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Duration {
        (self.next_after(now) - now.with_timezone(&Utc))
            .to_std()
            .unwrap_or(Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::test_zones::OneTransition;
    use chrono::FixedOffset;

    fn five_minutes() -> Schedule {
        Schedule::every(Duration::from_secs(300)).unwrap()
    }

    #[test]
    fn test_next_after_rounds_up_to_interval() {
        let now = Utc.with_ymd_and_hms(2008, 10, 18, 16, 3, 45).unwrap();
        assert_eq!(
            five_minutes().next_after(&now),
            Utc.with_ymd_and_hms(2008, 10, 18, 16, 5, 0).unwrap()
        );
    }

    #[test]
    fn test_next_after_is_strict() {
        let now = Utc.with_ymd_and_hms(2008, 10, 18, 16, 5, 0).unwrap();
        assert_eq!(
            five_minutes().next_after(&now),
            Utc.with_ymd_and_hms(2008, 10, 18, 16, 10, 0).unwrap()
        );
    }

    #[test]
    fn test_aligns_to_local_wall_clock() {
        let adelaide = FixedOffset::east_opt(9 * 3600 + 1800).unwrap();
        let now = adelaide.with_ymd_and_hms(2008, 10, 18, 16, 3, 45).unwrap();
        let hourly = Schedule::every(Duration::from_secs(3600)).unwrap();

        let next = hourly.next_after(&now);
        assert_eq!(next, adelaide.with_ymd_and_hms(2008, 10, 18, 17, 0, 0).unwrap());
    }

    #[test]
    fn test_uneven_interval_restarts_at_midnight() {
        let seven = Schedule::every(Duration::from_secs(7 * 60)).unwrap();
        let now = Utc.with_ymd_and_hms(2008, 10, 18, 23, 58, 0).unwrap();
        assert_eq!(
            seven.next_after(&now),
            Utc.with_ymd_and_hms(2008, 10, 19, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_keeps_firing_through_the_long_day() {
        let zone = OneTransition::melbourne_autumn();
        // 23:30 +10:00, twenty four and a half hours after local midnight.
        let now = zone.with_ymd_and_hms(2024, 4, 7, 23, 30, 0).unwrap();

        let next = five_minutes().next_after(&now);
        assert_eq!(next, Utc.with_ymd_and_hms(2024, 4, 7, 13, 35, 0).unwrap());
        assert!(next > now.with_timezone(&Utc));
        assert_eq!(five_minutes().delay_after(&now), Duration::from_secs(300));
    }

    #[test]
    fn test_uneven_interval_restarts_at_midnight_after_the_long_day() {
        let zone = OneTransition::melbourne_autumn();
        let now = zone.with_ymd_and_hms(2024, 4, 7, 23, 58, 0).unwrap();
        let seven = Schedule::every(Duration::from_secs(7 * 60)).unwrap();

        assert_eq!(seven.next_after(&now), Utc.with_ymd_and_hms(2024, 4, 7, 14, 0, 0).unwrap());
    }

    #[test]
    fn test_short_day_ends_at_next_local_midnight() {
        let zone = OneTransition::melbourne_spring();
        let now = zone.with_ymd_and_hms(2024, 10, 6, 23, 59, 0).unwrap();
        let hourly = Schedule::every(Duration::from_secs(3600)).unwrap();

        // Midnight on the 7th is 13:00 UTC once daylight time has started.
        assert_eq!(hourly.next_after(&now), Utc.with_ymd_and_hms(2024, 10, 6, 13, 0, 0).unwrap());
    }

    #[test]
    fn test_delay_after() {
        let now = Utc.with_ymd_and_hms(2008, 10, 18, 16, 3, 45).unwrap();
        assert_eq!(five_minutes().delay_after(&now), Duration::from_secs(75));
    }

    #[test]
    fn test_rejects_zero_and_overlong_intervals() {
        assert!(Schedule::every(Duration::ZERO).is_err());
        assert!(Schedule::every(Duration::from_secs(86_401)).is_err());
        assert!(Schedule::every(Duration::from_secs(86_400)).is_ok());
    }
}

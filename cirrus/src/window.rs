//! Half-open time windows and local calendar boundaries.
//!
//! Every windowed query in cirrus covers `[start, end)` in UTC. Calendar
//! windows (the current day, the previous hour) are computed in the timezone
//! of the `now` the caller supplies and only then converted to UTC.
//!
//! # Window kinds
//!
//! ```text
//! local_day        [midnight, next midnight)
//! previous_day     [previous midnight, midnight)
//! previous_hour    [hour_start - 1h, hour_start)
//! trailing(d)      [now - d, now)
//! ```
//!
//! A local day is 23 or 25 hours long when the clocks change during it.

use chrono::{
    DateTime, LocalResult, NaiveDateTime, NaiveTime, Offset, TimeDelta, TimeZone, Timelike, Utc,
};

/// A half-open interval `[start, end)` of UTC instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Window {
    /// Inclusive lower bound.
    pub start: DateTime<Utc>,
    /// Exclusive upper bound.
    pub end: DateTime<Utc>,
}

impl Window {
    /// Creates a window from explicit bounds.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// The window of `length` ending (exclusively) at `end`.
    pub fn trailing<Tz: TimeZone>(end: &DateTime<Tz>, length: TimeDelta) -> Self {
        let end = end.with_timezone(&Utc);
        Self {
            start: end - length,
            end,
        }
    }

    /// The current local calendar day, from local midnight to the next.
    pub fn local_day<Tz: TimeZone>(now: &DateTime<Tz>) -> Self {
        let start = local_midnight(now);
        let end = now
            .date_naive()
            .succ_opt()
            .map_or(start + TimeDelta::hours(24), |date| {
                resolve_local(now, date.and_time(NaiveTime::MIN))
            });
        Self { start, end }
    }

    /// The local calendar day before `now`'s.
    pub fn previous_local_day<Tz: TimeZone>(now: &DateTime<Tz>) -> Self {
        let end = local_midnight(now);
        let start = now
            .date_naive()
            .pred_opt()
            .map_or(end - TimeDelta::hours(24), |date| {
                resolve_local(now, date.and_time(NaiveTime::MIN))
            });
        Self { start, end }
    }

    /// The last completed local hour.
    pub fn previous_local_hour<Tz: TimeZone>(now: &DateTime<Tz>) -> Self {
        let end = local_hour_start(now);
        Self {
            start: end - TimeDelta::hours(1),
            end,
        }
    }

    /// Returns `true` if `timestamp` falls inside the window.
    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        self.start <= timestamp && timestamp < self.end
    }

    /// Length of the window.
    pub fn length(&self) -> TimeDelta {
        self.end - self.start
    }

    /// Returns `true` if no instant can fall inside the window.
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// Local midnight at the start of `now`'s calendar day, as a UTC instant.
pub fn local_midnight<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Utc> {
    let midnight = now.date_naive().and_time(NaiveTime::MIN);
    resolve_local(now, midnight)
}

/// Start of `now`'s local wall-clock hour, as a UTC instant.
pub fn local_hour_start<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Utc> {
    let local = now.naive_local();
    let hour = NaiveTime::from_hms_opt(local.hour(), 0, 0).unwrap_or(NaiveTime::MIN);
    resolve_local(now, local.date().and_time(hour))
}

/// Maps a wall-clock time in `now`'s timezone to UTC.
///
/// Ambiguous times (clocks going back) resolve to the earlier instant. Times
/// skipped by a forward transition use the offset in effect at `now`.
fn resolve_local<Tz: TimeZone>(now: &DateTime<Tz>, local: NaiveDateTime) -> DateTime<Utc> {
    match now.timezone().from_local_datetime(&local) {
        LocalResult::Single(t) | LocalResult::Ambiguous(t, _) => t.with_timezone(&Utc),
        LocalResult::None => {
            let offset = now.offset().fix();
            (local - TimeDelta::seconds(i64::from(offset.local_minus_utc()))).and_utc()
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_zones::OneTransition;
    use super::*;
    use chrono::FixedOffset;

    fn adelaide() -> FixedOffset {
        FixedOffset::east_opt(9 * 3600 + 1800).unwrap()
    }

    #[test]
    fn test_local_day_uses_local_midnight() {
        // 08:15 local on the 18th is 22:45 UTC on the 17th.
        let now = adelaide().with_ymd_and_hms(2008, 10, 18, 8, 15, 0).unwrap();
        let window = Window::local_day(&now);

        assert_eq!(window.start, Utc.with_ymd_and_hms(2008, 10, 17, 14, 30, 0).unwrap());
        assert_eq!(window.end, Utc.with_ymd_and_hms(2008, 10, 18, 14, 30, 0).unwrap());
        assert!(window.contains(now.with_timezone(&Utc)));
    }

    #[test]
    fn test_previous_local_day_ends_at_midnight() {
        let now = Utc.with_ymd_and_hms(2008, 10, 18, 16, 3, 45).unwrap();
        let window = Window::previous_local_day(&now);

        assert_eq!(window.start, Utc.with_ymd_and_hms(2008, 10, 17, 0, 0, 0).unwrap());
        assert_eq!(window.end, Utc.with_ymd_and_hms(2008, 10, 18, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_previous_local_hour_half_hour_offset() {
        // 16:03 local in a +09:30 zone: the completed hour is 15:00..16:00 local.
        let now = adelaide().with_ymd_and_hms(2008, 10, 18, 16, 3, 45).unwrap();
        let window = Window::previous_local_hour(&now);

        assert_eq!(window.start, Utc.with_ymd_and_hms(2008, 10, 18, 5, 30, 0).unwrap());
        assert_eq!(window.end, Utc.with_ymd_and_hms(2008, 10, 18, 6, 30, 0).unwrap());
    }

    #[test]
    fn test_trailing_window_is_half_open() {
        let now = Utc.with_ymd_and_hms(2008, 10, 18, 16, 0, 0).unwrap();
        let window = Window::trailing(&now, TimeDelta::minutes(10));

        assert_eq!(window.length(), TimeDelta::minutes(10));
        assert!(window.contains(now - TimeDelta::minutes(10)));
        assert!(!window.contains(now));
        assert!(!window.is_empty());
    }

    #[test]
    fn test_empty_window() {
        let now = Utc.with_ymd_and_hms(2008, 10, 18, 16, 0, 0).unwrap();
        let window = Window::new(now, now);
        assert!(window.is_empty());
        assert!(!window.contains(now));
    }

    #[test]
    fn test_local_day_spans_clocks_going_back() {
        let zone = OneTransition::melbourne_autumn();
        let now = zone.with_ymd_and_hms(2024, 4, 7, 12, 0, 0).unwrap();
        let window = Window::local_day(&now);

        assert_eq!(window.start, Utc.with_ymd_and_hms(2024, 4, 6, 13, 0, 0).unwrap());
        assert_eq!(window.end, Utc.with_ymd_and_hms(2024, 4, 7, 14, 0, 0).unwrap());
        assert_eq!(window.length(), TimeDelta::hours(25));

        let late = zone.with_ymd_and_hms(2024, 4, 7, 23, 30, 0).unwrap();
        assert!(Window::local_day(&late).contains(late.with_timezone(&Utc)));
    }

    #[test]
    fn test_previous_local_day_after_clocks_go_back() {
        let zone = OneTransition::melbourne_autumn();
        let now = zone.with_ymd_and_hms(2024, 4, 8, 10, 0, 0).unwrap();
        let window = Window::previous_local_day(&now);

        assert_eq!(window.start, Utc.with_ymd_and_hms(2024, 4, 6, 13, 0, 0).unwrap());
        assert_eq!(window.end, Utc.with_ymd_and_hms(2024, 4, 7, 14, 0, 0).unwrap());
    }

    #[test]
    fn test_local_day_spans_clocks_going_forward() {
        let zone = OneTransition::melbourne_spring();
        let now = zone.with_ymd_and_hms(2024, 10, 6, 12, 0, 0).unwrap();
        let window = Window::local_day(&now);

        assert_eq!(window.start, Utc.with_ymd_and_hms(2024, 10, 5, 14, 0, 0).unwrap());
        assert_eq!(window.end, Utc.with_ymd_and_hms(2024, 10, 6, 13, 0, 0).unwrap());
        assert_eq!(window.length(), TimeDelta::hours(23));
    }

    #[test]
    fn test_repeated_wall_clock_hour_takes_earlier_instant() {
        let zone = OneTransition::melbourne_autumn();
        // 02:40 +10:00 is the second pass through 02:00..03:00 local.
        let now = zone.from_utc_datetime(&utc_naive(2024, 4, 6, 16, 40));
        assert_eq!(local_hour_start(&now), Utc.with_ymd_and_hms(2024, 4, 6, 15, 0, 0).unwrap());
    }

    fn utc_naive(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap().naive_utc()
    }
}

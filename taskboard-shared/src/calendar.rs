//! Calendar arithmetic in the deployment's display offset.
//!
//! Deadlines and creation timestamps are stored in UTC, but "today",
//! "this week" and "this month" are calendar notions. [`LocalClock`] maps an
//! instant to its local calendar date and a local date back to the UTC
//! instant of its midnight.

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Utc,
};

/// Converts between UTC instants and local calendar dates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalClock {
    offset: FixedOffset,
}

impl Default for LocalClock {
    fn default() -> Self {
        Self::utc()
    }
}

impl LocalClock {
    pub fn utc() -> Self {
        Self {
            offset: Utc.fix(),
        }
    }

    /// Clock for a fixed offset east of UTC, in minutes
    ///
    /// Returns `None` when the offset is outside ±24h.
    pub fn from_offset_minutes(minutes: i32) -> Option<Self> {
        FixedOffset::east_opt(minutes.checked_mul(60)?).map(|offset| Self { offset })
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Local calendar date of `now`
    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.offset).date_naive()
    }

    /// UTC instant of local midnight at the start of `date`
    pub fn start_of(&self, date: NaiveDate) -> DateTime<Utc> {
        let local_midnight = date.and_time(NaiveTime::MIN);
        let shift = Duration::seconds(i64::from(self.offset.local_minus_utc()));
        Utc.from_utc_datetime(&(local_midnight - shift))
    }

    /// Local midnight today
    pub fn day_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.start_of(self.today(now))
    }

    /// Local midnight of the most recent Monday (today if it is Monday)
    pub fn week_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let today = self.today(now);
        let since_monday = i64::from(today.weekday().num_days_from_monday());
        self.start_of(today - Duration::days(since_monday))
    }

    /// Local midnight of the first day of the current month
    pub fn month_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let today = self.today(now);
        self.start_of(today - Duration::days(i64::from(today.day0())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_utc_windows() {
        let clock = LocalClock::utc();
        // 2026-10-15 is a Thursday
        let now = at("2026-10-15T13:45:10Z");

        assert_eq!(clock.day_start(now), at("2026-10-15T00:00:00Z"));
        assert_eq!(clock.week_start(now), at("2026-10-12T00:00:00Z"));
        assert_eq!(clock.month_start(now), at("2026-10-01T00:00:00Z"));
    }

    #[test]
    fn test_week_start_on_monday_is_today() {
        let clock = LocalClock::utc();
        let now = at("2026-10-12T08:00:00Z");
        assert_eq!(clock.week_start(now), clock.day_start(now));
    }

    #[test]
    fn test_positive_offset_moves_calendar_date_forward() {
        let clock = LocalClock::from_offset_minutes(180).unwrap();
        // 22:30 UTC on the 31st is already 01:30 on Nov 1st at UTC+3
        let now = at("2026-10-31T22:30:00Z");

        assert_eq!(clock.today(now), NaiveDate::from_ymd_opt(2026, 11, 1).unwrap());
        assert_eq!(clock.day_start(now), at("2026-10-31T21:00:00Z"));
        assert_eq!(clock.month_start(now), at("2026-10-31T21:00:00Z"));
    }

    #[test]
    fn test_negative_offset() {
        let clock = LocalClock::from_offset_minutes(-300).unwrap();
        let now = at("2026-10-15T03:00:00Z");

        assert_eq!(clock.today(now), NaiveDate::from_ymd_opt(2026, 10, 14).unwrap());
        assert_eq!(clock.day_start(now), at("2026-10-14T05:00:00Z"));
    }

    #[test]
    fn test_offset_out_of_range() {
        assert!(LocalClock::from_offset_minutes(24 * 60).is_none());
        assert!(LocalClock::from_offset_minutes(i32::MAX).is_none());
        assert!(LocalClock::from_offset_minutes(-23 * 60).is_some());
    }
}

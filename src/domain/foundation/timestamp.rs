//! Timestamp value object for immutable points in time.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Immutable point in time, always UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a timestamp for the current moment.
    ///
    /// Domain code should take time from a `Clock` port instead; this is
    /// for adapters and tests.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a timestamp from a DateTime<Utc>.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the inner DateTime.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Checks if this timestamp is before another.
    pub fn is_before(&self, other: &Timestamp) -> bool {
        self.0 < other.0
    }

    /// Returns the duration from another timestamp to this one.
    ///
    /// Returns negative duration if other is after self.
    pub fn duration_since(&self, other: &Timestamp) -> Duration {
        self.0.signed_duration_since(other.0)
    }

    /// Creates a new timestamp by adding the specified number of days.
    pub fn plus_days(&self, days: i64) -> Self {
        Self(self.0 + Duration::days(days))
    }

    /// Creates a new timestamp by adding the specified number of hours.
    pub fn plus_hours(&self, hours: i64) -> Self {
        Self(self.0 + Duration::hours(hours))
    }

    /// Creates a new timestamp by adding the specified number of seconds.
    pub fn plus_secs(&self, secs: i64) -> Self {
        Self(self.0 + Duration::seconds(secs))
    }

    /// Creates a new timestamp by subtracting the specified number of seconds.
    pub fn minus_secs(&self, secs: i64) -> Self {
        Self(self.0 - Duration::seconds(secs))
    }

    /// Creates a new timestamp shifted by an arbitrary duration.
    pub fn plus(&self, duration: Duration) -> Self {
        Self(self.0 + duration)
    }

    /// Whole days from `self` until `later`, rounded up.
    ///
    /// Any partial day counts as a full day, so the result is only 0 once
    /// `later <= self`.
    pub fn ceil_days_until(&self, later: &Timestamp) -> u32 {
        let gap = later.duration_since(self);
        if gap <= Duration::zero() {
            return 0;
        }

        let whole = gap.num_days();
        let partial = gap - Duration::days(whole);
        let days = if partial > Duration::zero() { whole + 1 } else { whole };
        u32::try_from(days).unwrap_or(u32::MAX)
    }

    /// Creates a timestamp from Unix seconds.
    ///
    /// Returns `None` when the value is outside chrono's representable range.
    pub fn from_unix_secs(secs: i64) -> Option<Self> {
        Utc.timestamp_opt(secs, 0).single().map(Self)
    }

    /// Returns the timestamp as Unix seconds.
    pub fn as_unix_secs(&self) -> i64 {
        self.0.timestamp()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    fn base() -> Timestamp {
        Timestamp::from_unix_secs(1_705_276_800).unwrap() // 2024-01-15T00:00:00Z
    }

    #[test]
    fn timestamp_now_creates_current_time() {
        let before = Utc::now();
        let ts = Timestamp::now();
        let after = Utc::now();

        assert!(ts.as_datetime() >= &before);
        assert!(ts.as_datetime() <= &after);
    }

    #[test]
    fn timestamp_from_datetime_preserves_value() {
        let dt = Utc::now();
        let ts = Timestamp::from_datetime(dt);
        assert_eq!(ts.as_datetime(), &dt);
    }

    #[test]
    fn is_before_is_strict() {
        let ts1 = base();
        let ts2 = base().plus_secs(1);

        assert!(ts1.is_before(&ts2));
        assert!(!ts2.is_before(&ts1));
        assert!(!ts1.is_before(&ts1));
    }

    #[test]
    fn timestamp_serializes_to_rfc3339() {
        let json = serde_json::to_string(&base()).unwrap();
        assert!(json.contains("2024-01-15T00:00:00"));
    }

    #[test]
    fn timestamp_deserializes_from_json() {
        let ts: Timestamp = serde_json::from_str("\"2024-01-15T10:30:00Z\"").unwrap();
        assert_eq!(ts.as_datetime().year(), 2024);
    }

    #[test]
    fn from_unix_secs_roundtrips() {
        assert_eq!(base().as_unix_secs(), 1_705_276_800);
    }

    #[test]
    fn ceil_days_counts_partial_day_as_full() {
        let now = base();
        let later = now.plus_days(29).plus_hours(23);
        assert_eq!(now.ceil_days_until(&later), 30);
    }

    #[test]
    fn ceil_days_exact_days_are_not_rounded_up() {
        let now = base();
        assert_eq!(now.ceil_days_until(&now.plus_days(30)), 30);
    }

    #[test]
    fn ceil_days_one_second_left_is_one_day() {
        let now = base();
        assert_eq!(now.ceil_days_until(&now.plus_secs(1)), 1);
    }

    #[test]
    fn ceil_days_is_zero_at_and_after_target() {
        let now = base();
        assert_eq!(now.ceil_days_until(&now), 0);
        assert_eq!(now.ceil_days_until(&now.minus_secs(1)), 0);
    }

    #[test]
    fn ceil_days_sub_second_gap_is_one_day() {
        let now = base();
        let later = now.plus(Duration::milliseconds(1));
        assert_eq!(now.ceil_days_until(&later), 1);
    }
}

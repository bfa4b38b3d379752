//! The reference instant and timezone shared by one resolution call.
//!
//! Nothing in this crate reads the system clock on its own. A caller builds
//! an [`Anchor`] once per top-level invocation so that "now", "today" and
//! "tomorrow" mean the same thing in every step of that invocation.

use chrono::{
    DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc,
};
use chrono_tz::Tz;

use crate::error::ConfigError;

/// Longest stretch of skipped local time searched past (a whole skipped day
/// plus slack).
const MAX_GAP_MINUTES: i64 = 2 * 24 * 60;

/// A captured "now" plus the IANA timezone used for calendar-day math.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    now: DateTime<Utc>,
    timezone: Tz,
}

impl Anchor {
    pub fn new(now: DateTime<Utc>, timezone: Tz) -> Self {
        Self { now, timezone }
    }

    /// Build an anchor from an IANA timezone name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTimezone`] if the name is not a known zone.
    pub fn with_timezone_name(now: DateTime<Utc>, timezone: &str) -> Result<Self, ConfigError> {
        Ok(Self::new(now, parse_timezone(timezone)?))
    }

    /// Capture the current system time.
    pub fn now(timezone: Tz) -> Self {
        Self::new(Utc::now(), timezone)
    }

    pub fn instant(&self) -> DateTime<Utc> {
        self.now
    }

    /// "Now" as epoch milliseconds.
    pub fn now_ms(&self) -> i64 {
        self.now.timestamp_millis()
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// "Now" in the anchor's timezone.
    pub fn local_now(&self) -> DateTime<Tz> {
        self.now.with_timezone(&self.timezone)
    }

    pub fn today(&self) -> NaiveDate {
        self.local_now().date_naive()
    }

    /// The local date of an epoch-millisecond instant.
    pub fn local_date_of(&self, ms: i64) -> Option<NaiveDate> {
        self.to_local(ms).map(|dt| dt.date_naive())
    }

    pub fn to_local(&self, ms: i64) -> Option<DateTime<Tz>> {
        DateTime::<Utc>::from_timestamp_millis(ms).map(|dt| dt.with_timezone(&self.timezone))
    }

    /// Resolve a local wall-clock value to epoch milliseconds.
    ///
    /// A nonexistent local time (inside a DST gap) shifts forward to the
    /// first instant after the gap, so a midnight transition still has a
    /// start of day. Ambiguous times resolve to the earlier instant.
    pub fn local_ms(&self, naive: NaiveDateTime) -> Option<i64> {
        match self.timezone.from_local_datetime(&naive) {
            LocalResult::Single(dt) => Some(dt.timestamp_millis()),
            LocalResult::Ambiguous(earliest, _) => Some(earliest.timestamp_millis()),
            LocalResult::None => self.end_of_gap(naive),
        }
    }

    /// The first valid instant after the gap containing `naive`.
    fn end_of_gap(&self, naive: NaiveDateTime) -> Option<i64> {
        let mut candidate = naive.with_second(0)?.with_nanosecond(0)?;
        for _ in 0..MAX_GAP_MINUTES {
            candidate = candidate.checked_add_signed(Duration::minutes(1))?;
            if let Some(dt) = self.timezone.from_local_datetime(&candidate).earliest() {
                return Some(dt.timestamp_millis());
            }
        }
        None
    }

    pub fn local_ms_at(&self, date: NaiveDate, time: NaiveTime) -> Option<i64> {
        self.local_ms(date.and_time(time))
    }
}

/// Parse an IANA timezone string into `Tz`.
pub(crate) fn parse_timezone(s: &str) -> Result<Tz, ConfigError> {
    s.parse::<Tz>()
        .map_err(|_| ConfigError::InvalidTimezone(format!("'{}'", s)))
}

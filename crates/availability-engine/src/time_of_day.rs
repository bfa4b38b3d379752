//! Wall-clock time-of-day values.
//!
//! A [`TimeOfDay`] never carries a date. Arithmetic wraps around midnight;
//! callers that care about crossing a day boundary use
//! [`TimeOfDay::overflowing_add_duration`] and track the carry themselves.

use std::fmt;

use chrono::{NaiveTime, Timelike};
use serde::Serialize;

use crate::error::TimeError;
use crate::recognizer::{DateTimeRecognizer, MatchKind};

pub const MS_PER_SECOND: i64 = 1_000;
pub const MS_PER_MINUTE: i64 = 60_000;
pub const MS_PER_HOUR: i64 = 3_600_000;
pub const MS_PER_DAY: i64 = 86_400_000;

/// Longest duration read from a request (about a century). Longer amounts
/// are treated as unreadable.
pub const MAX_DURATION_MS: i64 = 100 * 366 * MS_PER_DAY;

/// An hour/minute/second/millisecond time of day.
///
/// Field order makes the derived `Ord` the lexicographic order over
/// `(hour, minute, second, millisecond)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TimeOfDay {
    hour: u32,
    minute: u32,
    second: u32,
    millisecond: u32,
}

impl TimeOfDay {
    pub const MIDNIGHT: TimeOfDay = TimeOfDay {
        hour: 0,
        minute: 0,
        second: 0,
        millisecond: 0,
    };

    /// 23:59, the latest minute-granular time.
    pub const LAST_MINUTE: TimeOfDay = TimeOfDay {
        hour: 23,
        minute: 59,
        second: 0,
        millisecond: 0,
    };

    /// The last representable millisecond of a day (23:59:59.999).
    pub const END_OF_DAY: TimeOfDay = TimeOfDay {
        hour: 23,
        minute: 59,
        second: 59,
        millisecond: 999,
    };

    /// Build a time of day, rejecting out-of-range components.
    pub fn new(hour: u32, minute: u32, second: u32, millisecond: u32) -> Option<Self> {
        (hour < 24 && minute < 60 && second < 60 && millisecond < 1_000).then_some(Self {
            hour,
            minute,
            second,
            millisecond,
        })
    }

    pub fn hms(hour: u32, minute: u32, second: u32) -> Option<Self> {
        Self::new(hour, minute, second, 0)
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }

    pub fn second(&self) -> u32 {
        self.second
    }

    pub fn millisecond(&self) -> u32 {
        self.millisecond
    }

    /// Parse an `HH:MM:SS` (or `HH:MM`) literal as produced by recognizers.
    ///
    /// Fractional seconds are accepted. Out-of-range values are rejected, not
    /// clamped.
    pub fn from_hhmmss(s: &str) -> Option<Self> {
        let mut parts = s.trim().split(':');
        let hour = parts.next()?.parse::<u32>().ok()?;
        let minute = parts.next()?.parse::<u32>().ok()?;
        let (second, millisecond) = match parts.next() {
            Some(sec) => match sec.split_once('.') {
                Some((whole, frac)) => (whole.parse::<u32>().ok()?, parse_fraction_ms(frac)?),
                None => (sec.parse::<u32>().ok()?, 0),
            },
            None => (0, 0),
        };
        if parts.next().is_some() {
            return None;
        }
        Self::new(hour, minute, second, millisecond)
    }

    /// The clock component of any chrono time value.
    pub fn of<T: Timelike>(time: &T) -> Self {
        Self {
            hour: time.hour(),
            minute: time.minute(),
            second: time.second(),
            // Leap-second nanos can exceed 999ms; fold them into the last millisecond.
            millisecond: (time.nanosecond() / 1_000_000).min(999),
        }
    }

    pub fn to_naive(&self) -> NaiveTime {
        NaiveTime::from_hms_milli_opt(self.hour, self.minute, self.second, self.millisecond)
            .unwrap_or(NaiveTime::MIN)
    }

    /// Strict lexicographic comparison.
    pub fn is_before(&self, other: &TimeOfDay) -> bool {
        self < other
    }

    /// Returns `true` if the clock time of `time` is before `self`.
    pub fn is_after_clock_of<T: Timelike>(&self, time: &T) -> bool {
        Self::of(time).is_before(self)
    }

    pub fn to_milliseconds(&self) -> i64 {
        i64::from(self.hour) * MS_PER_HOUR
            + i64::from(self.minute) * MS_PER_MINUTE
            + i64::from(self.second) * MS_PER_SECOND
            + i64::from(self.millisecond)
    }

    /// Add a (possibly negative) duration, wrapping around midnight.
    pub fn add_duration(&self, duration_ms: i64) -> TimeOfDay {
        self.overflowing_add_duration(duration_ms).0
    }

    /// Add a duration and report how many day boundaries were crossed.
    ///
    /// The carry is negative when the result lands on an earlier day.
    pub fn overflowing_add_duration(&self, duration_ms: i64) -> (TimeOfDay, i64) {
        let total = self.to_milliseconds().saturating_add(duration_ms);
        let days = total.div_euclid(MS_PER_DAY);
        (Self::from_day_offset(total.rem_euclid(MS_PER_DAY)), days)
    }

    fn from_day_offset(ms: i64) -> TimeOfDay {
        // `ms` is within [0, MS_PER_DAY), so every component fits its range.
        let millisecond = (ms % MS_PER_SECOND) as u32;
        let seconds = ms / MS_PER_SECOND;
        let second = (seconds % 60) as u32;
        let minutes = seconds / 60;
        let minute = (minutes % 60) as u32;
        let hour = (minutes / 60) as u32;
        TimeOfDay {
            hour,
            minute,
            second,
            millisecond,
        }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hour, self.minute, self.second)?;
        if self.millisecond != 0 {
            write!(f, ".{:03}", self.millisecond)?;
        }
        Ok(())
    }
}

/// Milliseconds from `start` to `end`; negative if `end` is earlier.
pub fn difference_ms(end: TimeOfDay, start: TimeOfDay) -> i64 {
    end.to_milliseconds() - start.to_milliseconds()
}

/// Read a time of day out of free text.
///
/// Delegates recognition to `recognizer` and accepts only a leading *time*
/// match whose value is a valid `HH:MM:SS` literal.
///
/// # Errors
///
/// Returns [`TimeError::InvalidTimeFormat`] if the text is not recognized as
/// a single time of day or its components are out of range.
pub fn parse_time_of_day(
    recognizer: &dyn DateTimeRecognizer,
    text: &str,
) -> Result<TimeOfDay, TimeError> {
    let invalid = || TimeError::InvalidTimeFormat(text.trim().to_string());
    let first = recognizer.parse(text).into_iter().next().ok_or_else(invalid)?;
    if MatchKind::from_type_name(&first.type_name) != Some(MatchKind::Time) {
        return Err(invalid());
    }
    first
        .resolution
        .as_deref()
        .and_then(|values| values.first())
        .and_then(|value| value.value.as_deref())
        .and_then(TimeOfDay::from_hhmmss)
        .ok_or_else(invalid)
}

fn parse_fraction_ms(frac: &str) -> Option<u32> {
    if frac.is_empty() || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let padded: String = frac.chars().chain("000".chars()).take(3).collect();
    padded.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchor::Anchor;
    use crate::recognizer::EnglishRecognizer;
    use chrono::{TimeZone, Utc};

    fn t(h: u32, m: u32) -> TimeOfDay {
        TimeOfDay::hms(h, m, 0).unwrap()
    }

    fn recognizer() -> EnglishRecognizer {
        let now = Utc.with_ymd_and_hms(2026, 2, 18, 14, 30, 0).unwrap();
        EnglishRecognizer::new(Anchor::new(now, chrono_tz::UTC))
    }

    #[test]
    fn test_new_rejects_out_of_range() {
        assert!(TimeOfDay::new(24, 0, 0, 0).is_none());
        assert!(TimeOfDay::new(23, 60, 0, 0).is_none());
        assert!(TimeOfDay::new(23, 59, 60, 0).is_none());
        assert!(TimeOfDay::new(23, 59, 59, 1_000).is_none());
        assert!(TimeOfDay::new(23, 59, 59, 999).is_some());
    }

    #[test]
    fn test_is_before_is_lexicographic() {
        assert!(t(9, 0).is_before(&t(9, 1)));
        assert!(t(8, 59).is_before(&t(9, 0)));
        assert!(!t(9, 0).is_before(&t(9, 0)));
        let a = TimeOfDay::new(9, 0, 0, 1).unwrap();
        assert!(t(9, 0).is_before(&a));
    }

    #[test]
    fn test_to_milliseconds() {
        let time = TimeOfDay::new(1, 2, 3, 4).unwrap();
        assert_eq!(time.to_milliseconds(), 3_600_000 + 120_000 + 3_000 + 4);
    }

    #[test]
    fn test_add_duration_wraps_past_midnight() {
        assert_eq!(t(23, 0).add_duration(2 * MS_PER_HOUR), t(1, 0));
        assert_eq!(t(23, 0).overflowing_add_duration(2 * MS_PER_HOUR), (t(1, 0), 1));
    }

    #[test]
    fn test_add_negative_duration_wraps_backwards() {
        assert_eq!(t(1, 0).overflowing_add_duration(-2 * MS_PER_HOUR), (t(23, 0), -1));
        assert_eq!(t(12, 0).overflowing_add_duration(-2 * MS_PER_HOUR), (t(10, 0), 0));
    }

    #[test]
    fn test_difference_ms() {
        assert_eq!(difference_ms(t(11, 0), t(9, 30)), 90 * MS_PER_MINUTE);
        assert_eq!(difference_ms(t(9, 30), t(11, 0)), -90 * MS_PER_MINUTE);
    }

    #[test]
    fn test_from_hhmmss() {
        assert_eq!(TimeOfDay::from_hhmmss("09:30:00"), Some(t(9, 30)));
        assert_eq!(TimeOfDay::from_hhmmss("09:30"), Some(t(9, 30)));
        assert_eq!(
            TimeOfDay::from_hhmmss("23:59:59.5"),
            TimeOfDay::new(23, 59, 59, 500)
        );
        assert_eq!(TimeOfDay::from_hhmmss("24:00:00"), None);
        assert_eq!(TimeOfDay::from_hhmmss("9am"), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(t(7, 5).to_string(), "07:05:00");
        assert_eq!(TimeOfDay::END_OF_DAY.to_string(), "23:59:59.999");
    }

    #[test]
    fn test_parse_time_of_day_meridiem() {
        let r = recognizer();
        assert_eq!(parse_time_of_day(&r, "9:00 AM").unwrap(), t(9, 0));
        assert_eq!(parse_time_of_day(&r, "5:30 PM").unwrap(), t(17, 30));
        assert_eq!(parse_time_of_day(&r, "12:00 AM").unwrap(), t(0, 0));
        assert_eq!(parse_time_of_day(&r, "noon").unwrap(), t(12, 0));
    }

    #[test]
    fn test_parse_time_of_day_rejects_non_times() {
        let r = recognizer();
        let err = parse_time_of_day(&r, "tomorrow").unwrap_err();
        assert!(err.to_string().contains("Invalid time format"), "got: {err}");
        assert!(parse_time_of_day(&r, "banana").is_err());
        assert!(parse_time_of_day(&r, "").is_err());
    }
}

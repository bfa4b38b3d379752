//! Interval value types shared by every stage of the engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A span of time as epoch milliseconds.
///
/// The end is exclusive for overlap tests and inclusive for subtraction
/// boundaries. Busy and free intervals are both expressed this way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeValueInterval {
    pub start: i64,
    pub end: i64,
}

impl TimeValueInterval {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    pub fn duration_ms(&self) -> i64 {
        self.end - self.start
    }

    /// Exclusive-end overlap test: touching intervals do not overlap.
    pub fn overlaps(&self, other: &TimeValueInterval) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains(&self, other: &TimeValueInterval) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// A candidate slot expressed as instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateInterval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Convert from epoch milliseconds; `None` if either end is out of range
    /// for `chrono`.
    pub fn from_values(interval: TimeValueInterval) -> Option<Self> {
        Some(Self {
            start: DateTime::from_timestamp_millis(interval.start)?,
            end: DateTime::from_timestamp_millis(interval.end)?,
        })
    }

    pub fn to_values(&self) -> TimeValueInterval {
        TimeValueInterval {
            start: self.start.timestamp_millis(),
            end: self.end.timestamp_millis(),
        }
    }

    pub fn duration_ms(&self) -> i64 {
        (self.end - self.start).num_milliseconds()
    }
}

impl From<DateInterval> for TimeValueInterval {
    fn from(interval: DateInterval) -> Self {
        interval.to_values()
    }
}

/// Index of the first interval in `intervals` that overlaps `candidate`.
pub(crate) fn first_overlap_index(
    candidate: &TimeValueInterval,
    intervals: &[TimeValueInterval],
) -> Option<usize> {
    intervals.iter().position(|interval| candidate.overlaps(interval))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_touching_intervals_do_not_overlap() {
        let a = TimeValueInterval::new(0, 10);
        let b = TimeValueInterval::new(10, 20);
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
        assert!(a.overlaps(&TimeValueInterval::new(9, 11)));
    }

    #[test]
    fn test_contains_is_inclusive() {
        let outer = TimeValueInterval::new(0, 10);
        assert!(outer.contains(&TimeValueInterval::new(0, 10)));
        assert!(outer.contains(&TimeValueInterval::new(2, 5)));
        assert!(!outer.contains(&TimeValueInterval::new(5, 11)));
    }

    #[test]
    fn test_date_interval_round_trip() {
        let start = Utc.with_ymd_and_hms(2026, 3, 16, 9, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 3, 16, 10, 30, 0).unwrap();
        let slot = DateInterval::new(start, end);
        assert_eq!(DateInterval::from_values(slot.to_values()), Some(slot));
        assert_eq!(slot.duration_ms(), 5_400_000);
    }

    #[test]
    fn test_date_interval_serializes_rfc3339() {
        let start = Utc.with_ymd_and_hms(2026, 3, 16, 9, 0, 0).unwrap();
        let slot = DateInterval::new(start, start);
        let json = serde_json::to_string(&slot).unwrap();
        assert_eq!(
            json,
            r#"{"start":"2026-03-16T09:00:00Z","end":"2026-03-16T09:00:00Z"}"#
        );
    }

    #[test]
    fn test_first_overlap_index() {
        let free = [TimeValueInterval::new(0, 10), TimeValueInterval::new(20, 30)];
        assert_eq!(first_overlap_index(&TimeValueInterval::new(25, 40), &free), Some(1));
        assert_eq!(first_overlap_index(&TimeValueInterval::new(10, 20), &free), None);
    }
}

//! Free-time computation from busy intervals and off hours.
//!
//! Busy calendar events and non-working intervals are pooled, sorted, and
//! subtracted from "now onward" in a single sweep. The sweep ends at the last
//! busy interval: it never emits an open-ended trailing free interval, so a
//! caller that wants "free until the end of the window" appends a sentinel
//! busy interval there (the off hours of the last day do this naturally).

use crate::interval::TimeValueInterval;

/// Compute sorted, disjoint free intervals starting at `now_ms`.
///
/// # Arguments
///
/// * `busy` — Calendar events, in any order, possibly overlapping
/// * `off_hours` — Non-working intervals (see [`crate::working_hours`])
/// * `now_ms` — The sweep starting point as epoch milliseconds
///
/// # Returns
///
/// Free intervals sorted ascending by start, pairwise non-overlapping, each
/// with a positive duration.
///
/// # Examples
///
/// ```
/// use availability_engine::{compute_available_times, TimeValueInterval};
///
/// let busy = [TimeValueInterval::new(30, 40)];
/// let off_hours = [TimeValueInterval::new(60, 100)];
/// let free = compute_available_times(&busy, &off_hours, 10);
/// assert_eq!(free, vec![TimeValueInterval::new(10, 30), TimeValueInterval::new(40, 60)]);
/// ```
pub fn compute_available_times(
    busy: &[TimeValueInterval],
    off_hours: &[TimeValueInterval],
    now_ms: i64,
) -> Vec<TimeValueInterval> {
    let mut unavailable: Vec<TimeValueInterval> =
        busy.iter().chain(off_hours.iter()).copied().collect();
    unavailable.sort_by_key(|interval| interval.start);

    let mut pointer = now_ms;
    let mut available = Vec::new();
    for interval in unavailable {
        if interval.end < pointer {
            continue;
        }
        if pointer < interval.start {
            available.push(TimeValueInterval::new(pointer, interval.start));
        }
        pointer = pointer.max(interval.end);
    }

    tracing::trace!(count = available.len(), "Computed available times");
    available
}

/// Union `current` into a sorted, disjoint free-time list.
///
/// Every element that overlaps or touches `current` is absorbed into one
/// interval, so the result keeps the ordering and disjointness of the input.
pub fn merge_interval(
    current: Option<TimeValueInterval>,
    available: &[TimeValueInterval],
) -> Vec<TimeValueInterval> {
    let Some(current) = current else {
        return available.to_vec();
    };

    let mut combined = Vec::with_capacity(available.len() + 1);
    let mut merged = current;
    let mut is_added = false;
    for &time in available {
        if is_added || time.end < merged.start {
            combined.push(time);
        } else if merged.end < time.start {
            combined.push(merged);
            combined.push(time);
            is_added = true;
        } else {
            merged = TimeValueInterval::new(merged.start.min(time.start), merged.end.max(time.end));
        }
    }
    if !is_added {
        combined.push(merged);
    }
    combined
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iv(start: i64, end: i64) -> TimeValueInterval {
        TimeValueInterval::new(start, end)
    }

    #[test]
    fn test_free_time_between_busy_blocks() {
        let busy = [iv(50, 60), iv(20, 30)];
        let off = [iv(80, 200)];
        assert_eq!(
            compute_available_times(&busy, &off, 0),
            vec![iv(0, 20), iv(30, 50), iv(60, 80)]
        );
    }

    #[test]
    fn test_past_intervals_are_skipped() {
        let busy = [iv(0, 5), iv(10, 20), iv(40, 50)];
        assert_eq!(compute_available_times(&busy, &[], 15), vec![iv(20, 40)]);
    }

    #[test]
    fn test_overlapping_busy_blocks_do_not_rewind() {
        // The second block ends before the first; the pointer must not move back.
        let busy = [iv(10, 50), iv(20, 30), iv(60, 70)];
        assert_eq!(
            compute_available_times(&busy, &[], 0),
            vec![iv(0, 10), iv(50, 60)]
        );
    }

    #[test]
    fn test_touching_blocks_leave_no_zero_length_gap() {
        let busy = [iv(10, 20), iv(20, 30)];
        assert_eq!(compute_available_times(&busy, &[], 0), vec![iv(0, 10)]);
    }

    #[test]
    fn test_no_trailing_open_interval() {
        assert!(compute_available_times(&[], &[], 0).is_empty());
        assert_eq!(compute_available_times(&[iv(10, 20)], &[], 0), vec![iv(0, 10)]);
    }

    #[test]
    fn test_merge_interval_none_is_identity() {
        let free = [iv(0, 10), iv(20, 30)];
        assert_eq!(merge_interval(None, &free), free.to_vec());
    }

    #[test]
    fn test_merge_interval_disjoint_insert_keeps_order() {
        let free = [iv(0, 10), iv(40, 50)];
        assert_eq!(
            merge_interval(Some(iv(20, 30)), &free),
            vec![iv(0, 10), iv(20, 30), iv(40, 50)]
        );
        assert_eq!(
            merge_interval(Some(iv(60, 70)), &free),
            vec![iv(0, 10), iv(40, 50), iv(60, 70)]
        );
    }

    #[test]
    fn test_merge_interval_unions_touching_and_overlapping() {
        let free = [iv(0, 10), iv(20, 30), iv(40, 50), iv(80, 90)];
        assert_eq!(
            merge_interval(Some(iv(10, 45)), &free),
            vec![iv(0, 50), iv(80, 90)]
        );
    }

    #[test]
    fn test_merge_interval_into_empty() {
        assert_eq!(merge_interval(Some(iv(5, 6)), &[]), vec![iv(5, 6)]);
    }
}

//! Expansion of daily working hours into concrete "closed" intervals.
//!
//! Given a start-of-day and end-of-day boundary, produces the intervals that
//! fall outside working hours within a date window: an optional leading
//! period before the first working period, plus every night between the end
//! of one working day and the start of the next. The result is not merged
//! with busy events; see [`crate::availability`].

use chrono::{Duration, NaiveDate};

use crate::anchor::Anchor;
use crate::error::ConfigError;
use crate::interval::TimeValueInterval;
use crate::recognizer::DateTimeRecognizer;
use crate::time_of_day::{parse_time_of_day, TimeOfDay};

/// End boundaries at or after this clock time close the day at midnight.
///
/// Preferences are minute-granular, so "11:59 PM" is the latest expressible
/// end of day and must not leave a one-minute night behind.
const END_OF_DAY_THRESHOLD: TimeOfDay = TimeOfDay::LAST_MINUTE;

/// Compute non-working intervals from textual working-hour preferences.
///
/// # Arguments
///
/// * `recognizer` — Used to read the two boundary strings (e.g. `"9:00 AM"`)
/// * `work_start` / `work_end` — The daily working-hours boundaries
/// * `window` — The outer window; one night is emitted per calendar day in it
/// * `anchor` — Supplies the timezone defining calendar days
///
/// # Errors
///
/// Returns [`ConfigError::MissingStart`] / [`ConfigError::MissingEnd`] for
/// blank preferences, [`ConfigError::UnparsableStart`] /
/// [`ConfigError::UnparsableEnd`] when a boundary is not a time of day, and
/// [`ConfigError::EndBeforeStart`] when the end precedes the start.
#[tracing::instrument(skip(recognizer, anchor))]
pub fn compute_off_hours(
    recognizer: &dyn DateTimeRecognizer,
    work_start: &str,
    work_end: &str,
    window: TimeValueInterval,
    anchor: &Anchor,
) -> Result<Vec<TimeValueInterval>, ConfigError> {
    if work_start.trim().is_empty() {
        return Err(ConfigError::MissingStart);
    }
    if work_end.trim().is_empty() {
        return Err(ConfigError::MissingEnd);
    }

    let start = parse_time_of_day(recognizer, work_start)
        .map_err(|_| ConfigError::UnparsableStart(work_start.to_string()))?;
    let end = parse_time_of_day(recognizer, work_end)
        .map_err(|_| ConfigError::UnparsableEnd(work_end.to_string()))?;

    off_hours_between(start, end, window, anchor)
}

/// Compute non-working intervals from already-parsed boundaries.
///
/// # Errors
///
/// Returns [`ConfigError::EndBeforeStart`] if `work_end` is before `work_start`.
pub fn off_hours_between(
    work_start: TimeOfDay,
    work_end: TimeOfDay,
    window: TimeValueInterval,
    anchor: &Anchor,
) -> Result<Vec<TimeValueInterval>, ConfigError> {
    if work_end.is_before(&work_start) {
        return Err(ConfigError::EndBeforeStart);
    }
    // Equal boundaries mean the day never closes.
    if work_start == work_end {
        return Ok(Vec::new());
    }

    let Some(window_start) = anchor.to_local(window.start) else {
        return Ok(Vec::new());
    };
    let first_day = window_start.date_naive();
    let last_day = anchor.local_date_of(window.end).unwrap_or(first_day);
    let closes_at_midnight = !work_end.is_before(&END_OF_DAY_THRESHOLD);

    let mut off_hours = Vec::new();

    if work_start.is_after_clock_of(&window_start) {
        if let Some(interval) = closed_between(
            anchor,
            (first_day, TimeOfDay::MIDNIGHT),
            (first_day, work_start),
        ) {
            off_hours.push(interval);
        }
    }

    let calendar_days = (last_day - first_day).num_days();
    for i in 0..=calendar_days {
        let day = first_day + Duration::days(i);
        let next_day = day + Duration::days(1);
        let closes = if closes_at_midnight {
            (next_day, TimeOfDay::MIDNIGHT)
        } else {
            (day, work_end)
        };
        if let Some(interval) = closed_between(anchor, closes, (next_day, work_start)) {
            off_hours.push(interval);
        }
    }

    tracing::trace!(count = off_hours.len(), "Expanded off hours");
    Ok(off_hours)
}

/// A closed interval between two local wall-clock points, if both exist and
/// the span is nonempty.
fn closed_between(
    anchor: &Anchor,
    (start_day, start_time): (NaiveDate, TimeOfDay),
    (end_day, end_time): (NaiveDate, TimeOfDay),
) -> Option<TimeValueInterval> {
    let start = anchor.local_ms_at(start_day, start_time.to_naive())?;
    let end = anchor.local_ms_at(end_day, end_time.to_naive())?;
    (start < end).then(|| TimeValueInterval::new(start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognizer::EnglishRecognizer;
    use chrono::{TimeZone, Utc};

    const HOUR: i64 = 3_600_000;

    fn ms(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> i64 {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0)
            .unwrap()
            .timestamp_millis()
    }

    fn utc_anchor() -> Anchor {
        Anchor::new(Utc.with_ymd_and_hms(2026, 3, 16, 7, 0, 0).unwrap(), chrono_tz::UTC)
    }

    fn off_hours(
        start: &str,
        end: &str,
        window: TimeValueInterval,
    ) -> Result<Vec<TimeValueInterval>, ConfigError> {
        let anchor = utc_anchor();
        let recognizer = EnglishRecognizer::new(anchor);
        compute_off_hours(&recognizer, start, end, window, &anchor)
    }

    #[test]
    fn test_leading_period_and_nights() {
        // Window: Monday 07:00 → Wednesday 12:00.
        let window = TimeValueInterval::new(ms(2026, 3, 16, 7, 0), ms(2026, 3, 18, 12, 0));
        let result = off_hours("9:00 AM", "5:00 PM", window).unwrap();
        assert_eq!(
            result,
            vec![
                TimeValueInterval::new(ms(2026, 3, 16, 0, 0), ms(2026, 3, 16, 9, 0)),
                TimeValueInterval::new(ms(2026, 3, 16, 17, 0), ms(2026, 3, 17, 9, 0)),
                TimeValueInterval::new(ms(2026, 3, 17, 17, 0), ms(2026, 3, 18, 9, 0)),
                TimeValueInterval::new(ms(2026, 3, 18, 17, 0), ms(2026, 3, 19, 9, 0)),
            ]
        );
    }

    #[test]
    fn test_no_leading_period_when_window_starts_during_work() {
        let window = TimeValueInterval::new(ms(2026, 3, 16, 10, 0), ms(2026, 3, 16, 12, 0));
        let result = off_hours("9:00 AM", "5:00 PM", window).unwrap();
        assert_eq!(
            result,
            vec![TimeValueInterval::new(ms(2026, 3, 16, 17, 0), ms(2026, 3, 17, 9, 0))]
        );
    }

    #[test]
    fn test_zero_length_window_still_emits_night() {
        let at = ms(2026, 3, 16, 10, 0);
        let result = off_hours("9:00 AM", "5:00 PM", TimeValueInterval::new(at, at)).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].duration_ms(), 16 * HOUR);
    }

    #[test]
    fn test_wide_open_hours_yield_nothing() {
        let window = TimeValueInterval::new(ms(2026, 3, 16, 7, 0), ms(2026, 3, 20, 7, 0));
        let result = off_hours("12:00 AM", "11:59 PM", window).unwrap();
        assert!(result.is_empty(), "got: {result:?}");
    }

    #[test]
    fn test_equal_boundaries_short_circuit() {
        let window = TimeValueInterval::new(ms(2026, 3, 16, 7, 0), ms(2026, 3, 20, 7, 0));
        let result = off_hours("9:00 AM", "9:00 AM", window).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_end_before_start_is_rejected() {
        let window = TimeValueInterval::new(ms(2026, 3, 16, 7, 0), ms(2026, 3, 17, 7, 0));
        let err = off_hours("5:00 PM", "9:00 AM", window).unwrap_err();
        assert_eq!(err, ConfigError::EndBeforeStart);
    }

    #[test]
    fn test_missing_and_unparsable_boundaries() {
        let window = TimeValueInterval::new(ms(2026, 3, 16, 7, 0), ms(2026, 3, 17, 7, 0));
        assert_eq!(off_hours("", "5:00 PM", window).unwrap_err(), ConfigError::MissingStart);
        assert_eq!(off_hours("9:00 AM", "  ", window).unwrap_err(), ConfigError::MissingEnd);
        assert_eq!(
            off_hours("soon", "5:00 PM", window).unwrap_err(),
            ConfigError::UnparsableStart("soon".to_string())
        );
        let err = off_hours("9:00 AM", "later", window).unwrap_err();
        assert_eq!(err, ConfigError::UnparsableEnd("later".to_string()));
        assert!(err.to_string().contains("Try \"h:mm PM\""), "got: {err}");
    }

    #[test]
    fn test_nights_follow_local_timezone() {
        let anchor = Anchor::with_timezone_name(
            Utc.with_ymd_and_hms(2026, 3, 16, 14, 0, 0).unwrap(),
            "America/New_York",
        )
        .unwrap();
        let start = TimeOfDay::hms(9, 0, 0).unwrap();
        let end = TimeOfDay::hms(17, 0, 0).unwrap();
        // 14:00 UTC = 10:00 EDT, inside working hours.
        let at = ms(2026, 3, 16, 14, 0);
        let result =
            off_hours_between(start, end, TimeValueInterval::new(at, at), &anchor).unwrap();
        // 17:00 EDT = 21:00 UTC; 09:00 EDT next day = 13:00 UTC.
        assert_eq!(
            result,
            vec![TimeValueInterval::new(ms(2026, 3, 16, 21, 0), ms(2026, 3, 17, 13, 0))]
        );
    }

    #[test]
    fn test_midnight_dst_transition_keeps_closed_time() {
        // Santiago skips 00:00 to 01:00 on Sunday, September 6, 2026.
        let anchor = Anchor::with_timezone_name(
            Utc.with_ymd_and_hms(2026, 9, 5, 14, 0, 0).unwrap(),
            "America/Santiago",
        )
        .unwrap();
        let nine = TimeOfDay::hms(9, 0, 0).unwrap();

        // 07:00 on the 6th: the leading period starts when the day does, at 01:00 -03.
        let at = ms(2026, 9, 6, 10, 0);
        let result = off_hours_between(
            nine,
            TimeOfDay::hms(17, 0, 0).unwrap(),
            TimeValueInterval::new(at, at),
            &anchor,
        )
        .unwrap();
        assert_eq!(result[0], TimeValueInterval::new(ms(2026, 9, 6, 4, 0), ms(2026, 9, 6, 12, 0)));

        // Closing at midnight on the 5th still leaves a night.
        let at = ms(2026, 9, 5, 14, 0);
        let result =
            off_hours_between(nine, TimeOfDay::LAST_MINUTE, TimeValueInterval::new(at, at), &anchor)
                .unwrap();
        assert_eq!(result, vec![TimeValueInterval::new(ms(2026, 9, 6, 4, 0), ms(2026, 9, 6, 12, 0))]);
    }
}

//! Resolution of a free-text scheduling request into candidate slots.
//!
//! The request is recognized, normalized, and then dispatched on the most
//! specific kind of expression it contains:
//!
//! | Expression | Candidates |
//! |---|---|
//! | date-time range ("tomorrow morning") | the range itself, split by any parsed duration |
//! | time range ("9-11am") | that window on the attached date, or on each upcoming free day |
//! | date range ("wed - fri") | free time within those days, split by duration |
//! | date-time ("in 45 mins") | one slot per duration starting there |
//! | time ("2pm") | one slot per duration at that time on each upcoming free day |
//! | date ("friday") | free time within that day, split by duration |
//!
//! Requests without any of these (a bare duration, or unrelated text) fall
//! back to splitting the caller's free time. That path always returns at
//! least one slot.

use std::cmp::Reverse;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::anchor::Anchor;
use crate::availability::merge_interval;
use crate::interval::{first_overlap_index, DateInterval, TimeValueInterval};
use crate::normalize::{normalize, Anchoring, RangeValue, TemporalResult};
use crate::recognizer::DateTimeRecognizer;
use crate::splitter::{round_to_grid, split_intervals, Rounding};
use crate::time_of_day::{difference_ms, TimeOfDay, MS_PER_DAY, MS_PER_HOUR};

/// Slot length used when neither the request nor the caller supplies one.
pub const FALLBACK_DURATION_MS: i64 = MS_PER_HOUR;

/// How many calendar days of one free interval a time-of-day search scans.
pub const MAX_SEARCH_CALENDAR_DAYS: i64 = 7;

/// Look-back window for full-day (reporting period) resolution.
pub const REPORTING_PERIOD_RANGE_MS: i64 = 7 * MS_PER_DAY;

/// Suggestions never start before "now" rounded up to this many minutes.
pub const EARLIEST_START_GRID_MINUTES: i64 = 5;

/// Length of the synthesized window, in slots, when no free time fits.
pub const FALLBACK_SLOT_COUNT: i64 = 5;

const OPEN_RANGE_FIRST_DAY: &str = "2001-01-01";
const OPEN_RANGE_LAST_DAY: &str = "2050-12-31";

/// Candidate slots for a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlotResolution {
    pub slots: Vec<DateInterval>,
    /// `true` if the request was understood as a date, time, or duration.
    pub is_recognized: bool,
}

/// Resolve `search_text` into candidate time slots.
///
/// # Arguments
///
/// * `recognizer` — Reads date/time expressions out of `search_text`
/// * `anchor` — "Now" and the timezone for calendar-day math
/// * `search_text` — The request, e.g. `"45 min this afternoon"`; may be empty
/// * `current` — The interval already selected, if any; its length becomes
///   the preferred duration and it is merged into the free time
/// * `available` — Sorted, disjoint free intervals
/// * `default_duration_ms` — Preferred slot length when `current` is absent
///
/// # Examples
///
/// ```
/// use availability_engine::{resolve_time_slots, Anchor, EnglishRecognizer, TimeValueInterval};
/// use chrono::{TimeZone, Utc};
///
/// let anchor = Anchor::new(Utc.with_ymd_and_hms(2026, 3, 16, 9, 58, 0).unwrap(), chrono_tz::UTC);
/// let recognizer = EnglishRecognizer::new(anchor);
/// let free = [TimeValueInterval::new(anchor.now_ms(), anchor.now_ms() + 4 * 3_600_000)];
///
/// let resolution = resolve_time_slots(&recognizer, &anchor, "2 hours", None, &free, 3_600_000);
/// assert!(resolution.is_recognized);
/// assert!(resolution.slots.iter().all(|s| s.duration_ms() == 2 * 3_600_000));
/// ```
#[tracing::instrument(skip(recognizer, anchor, available), fields(available = available.len()))]
pub fn resolve_time_slots(
    recognizer: &dyn DateTimeRecognizer,
    anchor: &Anchor,
    search_text: &str,
    current: Option<TimeValueInterval>,
    available: &[TimeValueInterval],
    default_duration_ms: i64,
) -> TimeSlotResolution {
    let preferred_duration = current.map_or(default_duration_ms, |c| c.duration_ms());
    let search_intervals = merge_interval(current, available);
    let result = normalize(&recognizer.parse(search_text));

    if let Some(result) = result.as_ref().filter(|r| r.has_date_or_time()) {
        let builder = SlotBuilder::new(anchor, &search_intervals, false);
        let slots = builder.build(result, Some(preferred_duration));
        if !slots.is_empty() {
            return TimeSlotResolution {
                slots: to_date_intervals(slots),
                is_recognized: true,
            };
        }
        tracing::debug!("Date/time expression matched no slots, splitting free time");
    }

    let parsed_duration = result.as_ref().and_then(TemporalResult::first_duration_ms);
    let duration = positive_or_fallback(parsed_duration.unwrap_or(preferred_duration));
    let earliest_start = round_to_grid(anchor.now_ms(), EARLIEST_START_GRID_MINUTES, Rounding::Up);

    let mut slots = split_intervals(&search_intervals, duration, Some(earliest_start));
    if let Some(current) = current {
        slots.retain(|slot| *slot != current);
    }

    if slots.is_empty() {
        let window = TimeValueInterval::new(
            earliest_start,
            earliest_start.saturating_add(duration.saturating_mul(FALLBACK_SLOT_COUNT)),
        );
        tracing::debug!(duration, "No free time fits, offering the next slots");
        slots = split_intervals(&[window], duration, Some(earliest_start));
    }

    TimeSlotResolution {
        slots: to_date_intervals(slots),
        is_recognized: parsed_duration.is_some(),
    }
}

/// Resolve `search_text` into whole-day (or explicit) intervals of the recent past.
///
/// Searches the [`REPORTING_PERIOD_RANGE_MS`] before "now". A bare duration
/// yields the interval of that length ending now; unrecognized text yields
/// nothing.
#[tracing::instrument(skip(recognizer, anchor))]
pub fn resolve_full_day_intervals(
    recognizer: &dyn DateTimeRecognizer,
    anchor: &Anchor,
    search_text: &str,
) -> Vec<DateInterval> {
    let result = normalize(&recognizer.parse(search_text));
    let now = anchor.now_ms();

    if let Some(result) = result.as_ref().filter(|r| r.has_date_or_time()) {
        let search_intervals = [TimeValueInterval::new(now - REPORTING_PERIOD_RANGE_MS, now)];
        let slots = SlotBuilder::new(anchor, &search_intervals, true).build(result, None);
        if !slots.is_empty() {
            return to_date_intervals(slots);
        }
    }

    match result.as_ref().and_then(TemporalResult::first_duration_ms) {
        Some(duration) => to_date_intervals(vec![TimeValueInterval::new(now - duration, now)]),
        None => Vec::new(),
    }
}

fn positive_or_fallback(duration_ms: i64) -> i64 {
    if duration_ms > 0 {
        duration_ms
    } else {
        FALLBACK_DURATION_MS
    }
}

fn to_date_intervals(intervals: Vec<TimeValueInterval>) -> Vec<DateInterval> {
    intervals
        .into_iter()
        .filter_map(DateInterval::from_values)
        .collect()
}

// ── Interval construction ───────────────────────────────────────────────────

/// A wall-clock time on a day relative to some base date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct DayClock {
    day: i64,
    time: TimeOfDay,
}

impl DayClock {
    fn of(time: TimeOfDay) -> Self {
        Self { day: 0, time }
    }

    fn add(self, duration_ms: i64) -> Self {
        let (time, carry) = self.time.overflowing_add_duration(duration_ms);
        Self {
            day: self.day + carry,
            time,
        }
    }

    fn ms_until(self, later: DayClock) -> i64 {
        (later.day - self.day) * MS_PER_DAY + difference_ms(later.time, self.time)
    }
}

/// Builds candidate intervals from a normalized result against a set of
/// search intervals.
struct SlotBuilder<'a> {
    anchor: &'a Anchor,
    search_intervals: &'a [TimeValueInterval],
    /// Ranges without a duration become whole days instead of slots.
    prefer_full_day: bool,
}

impl<'a> SlotBuilder<'a> {
    fn new(
        anchor: &'a Anchor,
        search_intervals: &'a [TimeValueInterval],
        prefer_full_day: bool,
    ) -> Self {
        Self {
            anchor,
            search_intervals,
            prefer_full_day,
        }
    }

    fn build(
        &self,
        result: &TemporalResult,
        preferred_duration: Option<i64>,
    ) -> Vec<TimeValueInterval> {
        let Some(anchoring) = result.anchoring() else {
            return Vec::new();
        };

        let parsed = result.durations_ms();
        let durations = parsed.clone().unwrap_or_else(|| {
            vec![positive_or_fallback(preferred_duration.unwrap_or(FALLBACK_DURATION_MS))]
        });
        let whole_days = self.prefer_full_day && parsed.is_none();
        let fill_durations = (!whole_days).then_some(durations.as_slice());
        tracing::debug!(?anchoring, ?durations, whole_days, "Building slots");

        match anchoring {
            Anchoring::DateTimeRanges(ranges) => {
                let mut intervals: Vec<_> = ranges
                    .iter()
                    .flat_map(|range| self.date_time_intervals(range, fill_durations))
                    .collect();
                self.sort_by_overlap(&mut intervals);
                match parsed {
                    // "45 minutes tomorrow morning"
                    Some(parsed) => parsed
                        .iter()
                        .flat_map(|&duration| split_intervals(&intervals, duration, None))
                        .collect(),
                    None => intervals,
                }
            }
            Anchoring::TimeRanges(ranges) => {
                let dates = if result.date_times.is_empty() {
                    &result.dates
                } else {
                    &result.date_times
                };
                let prefixes = date_prefixes(dates);
                if !prefixes.is_empty() {
                    // "friday 9:30-11", "9-10:30am tomorrow"
                    let mut intervals: Vec<_> = prefixes
                        .iter()
                        .flat_map(|prefix| ranges.iter().map(move |range| on_date(prefix, range)))
                        .flat_map(|range| self.date_time_intervals(&range, fill_durations))
                        .collect();
                    self.sort_by_overlap(&mut intervals);
                    intervals
                } else if whole_days {
                    ranges
                        .iter()
                        .flat_map(|range| {
                            let mut intervals = self.same_day_time_intervals(range);
                            intervals.sort_by_key(|interval| Reverse(interval.start));
                            intervals
                        })
                        .collect()
                } else {
                    let mut intervals: Vec<_> = ranges
                        .iter()
                        .flat_map(|range| self.time_intervals_with_durations(range, parsed.as_deref()))
                        .collect();
                    intervals.sort_by_key(|interval| interval.start);
                    intervals
                }
            }
            Anchoring::DateRanges(ranges) => {
                if whole_days {
                    ranges.iter().filter_map(|range| self.full_day_interval(range)).collect()
                } else {
                    let mut intervals: Vec<_> = ranges
                        .iter()
                        .flat_map(|range| self.free_times_within_dates(range, &durations))
                        .collect();
                    intervals.sort_by_key(|interval| interval.start);
                    intervals
                }
            }
            Anchoring::DateTimes(values) => {
                let mut intervals: Vec<_> = values
                    .iter()
                    .flat_map(|v| self.date_time_intervals(&RangeValue::starting(v), fill_durations))
                    .collect();
                self.sort_by_overlap(&mut intervals);
                intervals
            }
            Anchoring::Times(values) => values
                .iter()
                .map(|v| RangeValue::starting(v))
                .flat_map(|range| {
                    if whole_days {
                        self.same_day_time_intervals(&range)
                    } else {
                        self.time_intervals_with_durations(&range, Some(&durations))
                    }
                })
                .collect(),
            Anchoring::Dates(values) => {
                if whole_days {
                    values
                        .iter()
                        .filter_map(|v| self.full_day_interval(&RangeValue::starting(v)))
                        .collect()
                } else {
                    let mut intervals: Vec<_> = values
                        .iter()
                        .flat_map(|v| self.free_times_within_dates(&RangeValue::starting(v), &durations))
                        .collect();
                    intervals.sort_by_key(|interval| interval.start);
                    intervals
                }
            }
        }
    }

    /// Candidates that overlap an earlier free interval come first; those
    /// overlapping none come last.
    fn sort_by_overlap(&self, intervals: &mut [TimeValueInterval]) {
        intervals.sort_by_key(|candidate| {
            first_overlap_index(candidate, self.search_intervals).unwrap_or(usize::MAX)
        });
    }

    // ── date-time and date-time range ──

    /// An interval from explicit instants. A lone start (end) is extended by
    /// each duration, or to the end (start) of its day when `durations` is `None`.
    fn date_time_intervals(
        &self,
        range: &RangeValue,
        durations: Option<&[i64]>,
    ) -> Vec<TimeValueInterval> {
        let start = range.start.as_deref().and_then(|v| self.parse_instant(v));
        let end = range.end.as_deref().and_then(|v| self.parse_instant(v));
        match (start, end) {
            // Either order; recognizers do not guarantee start <= end ("tomorrow 9-8").
            (Some(lhs), Some(rhs)) => vec![TimeValueInterval::new(lhs.min(rhs), lhs.max(rhs))],
            // "1 hour starting in 45 mins"
            (Some(start), None) => match durations {
                Some(durations) => durations
                    .iter()
                    .map(|&d| TimeValueInterval::new(start, start + d))
                    .collect(),
                None => self
                    .end_of_day_containing(start)
                    .map(|end| TimeValueInterval::new(start, end))
                    .into_iter()
                    .collect(),
            },
            // "2 hours until noon tmr"
            (None, Some(end)) => match durations {
                Some(durations) => durations
                    .iter()
                    .map(|&d| TimeValueInterval::new(end - d, end))
                    .collect(),
                None => self
                    .start_of_day_containing(end)
                    .map(|start| TimeValueInterval::new(start, end))
                    .into_iter()
                    .collect(),
            },
            (None, None) => Vec::new(),
        }
    }

    // ── time and time range ──

    /// The `[lhs, rhs]` clock window on every day of every search interval
    /// that fully contains it, scanning at most [`MAX_SEARCH_CALENDAR_DAYS`]
    /// per interval.
    ///
    /// When no day fits, returns the window today, or tomorrow if the
    /// reference boundary (start or end) has already passed.
    fn time_intervals(
        &self,
        lhs: DayClock,
        rhs: DayClock,
        from_is_reference: bool,
    ) -> Vec<TimeValueInterval> {
        let (from, to) = if lhs <= rhs { (lhs, rhs) } else { (rhs, lhs) };
        let duration = from.ms_until(to);

        let mut found = Vec::new();
        for interval in self.search_intervals {
            if interval.duration_ms() < duration {
                continue;
            }
            let (Some(first_day), Some(last_day)) = (
                self.anchor.local_date_of(interval.start),
                self.anchor.local_date_of(interval.end),
            ) else {
                continue;
            };
            let days = (last_day - first_day).num_days().min(MAX_SEARCH_CALENDAR_DAYS);
            for i in 0..=days {
                let day = first_day + Duration::days(i);
                if let Some(candidate) = self.clock_window(day, from, to) {
                    if interval.contains(&candidate) {
                        found.push(candidate);
                    }
                }
            }
        }

        if found.is_empty() {
            let reference = if from_is_reference { from } else { to };
            let today = self.anchor.today();
            let day = if reference.time.is_after_clock_of(&self.anchor.local_now()) {
                today
            } else {
                today + Duration::days(1)
            };
            found.extend(self.clock_window(day, from, to));
        }
        found
    }

    fn time_intervals_with_durations(
        &self,
        range: &RangeValue,
        durations: Option<&[i64]>,
    ) -> Vec<TimeValueInterval> {
        let start = range.start.as_deref().and_then(TimeOfDay::from_hhmmss).map(DayClock::of);
        let end = range.end.as_deref().and_then(TimeOfDay::from_hhmmss).map(DayClock::of);
        match (start, end) {
            (Some(start), Some(end)) => {
                let intervals = self.time_intervals(start, end, true);
                match durations.filter(|d| !d.is_empty()) {
                    // "45 minutes between 9-11am"
                    Some(durations) => durations
                        .iter()
                        .flat_map(|&d| split_intervals(&intervals, d, None))
                        .collect(),
                    None => intervals,
                }
            }
            // "2h from 1p"
            (Some(start), None) => durations
                .unwrap_or_default()
                .iter()
                .flat_map(|&d| self.time_intervals(start, start.add(d), true))
                .collect(),
            // "2 hours until noon"
            (None, Some(end)) => durations
                .unwrap_or_default()
                .iter()
                .flat_map(|&d| self.time_intervals(end.add(-d), end, false))
                .collect(),
            (None, None) => Vec::new(),
        }
    }

    /// Like [`Self::time_intervals`], with a missing side extended to the
    /// start or end of the day.
    fn same_day_time_intervals(&self, range: &RangeValue) -> Vec<TimeValueInterval> {
        let start = range.start.as_deref().and_then(TimeOfDay::from_hhmmss);
        let end = range.end.as_deref().and_then(TimeOfDay::from_hhmmss);
        self.time_intervals(
            DayClock::of(start.unwrap_or(TimeOfDay::MIDNIGHT)),
            DayClock::of(end.unwrap_or(TimeOfDay::END_OF_DAY)),
            range.start.is_some(),
        )
    }

    fn clock_window(
        &self,
        day: NaiveDate,
        from: DayClock,
        to: DayClock,
    ) -> Option<TimeValueInterval> {
        let start_day = day.checked_add_signed(Duration::try_days(from.day)?)?;
        let end_day = day.checked_add_signed(Duration::try_days(to.day)?)?;
        let start = self.anchor.local_ms_at(start_day, from.time.to_naive())?;
        let end = self.anchor.local_ms_at(end_day, to.time.to_naive())?;
        (start <= end).then(|| TimeValueInterval::new(start, end))
    }

    // ── date and date range ──

    /// Free time clipped to `[start, end]`, split into slots of `duration`.
    fn free_times_between(&self, start: i64, end: i64, duration: i64) -> Vec<TimeValueInterval> {
        let mut clipped = Vec::new();
        for interval in self.search_intervals {
            if end < interval.start {
                break;
            }
            if interval.end <= start {
                continue;
            }
            clipped.push(TimeValueInterval::new(interval.start.max(start), interval.end.min(end)));
        }
        split_intervals(&clipped, duration, None)
    }

    /// Free slots within inclusive calendar days. A lone start is one day
    /// ("tomorrow", "from Tuesday"); a lone end runs from now ("until thursday").
    fn free_times_within_dates(
        &self,
        range: &RangeValue,
        durations: &[i64],
    ) -> Vec<TimeValueInterval> {
        let start = range.start.as_deref().and_then(parse_date);
        let end = range.end.as_deref().and_then(parse_date);
        let bounds = match (start, end) {
            (Some(start), Some(end)) => self.start_of_day(start).zip(self.end_of_day(end)),
            (Some(day), None) => self.start_of_day(day).zip(self.end_of_day(day)),
            (None, Some(end)) => self.end_of_day(end).map(|end| (self.anchor.now_ms(), end)),
            (None, None) => None,
        };
        let Some((start, end)) = bounds else {
            return Vec::new();
        };
        durations
            .iter()
            .flat_map(|&d| self.free_times_between(start, end, d))
            .collect()
    }

    /// Whole days from start to end; a missing side copies the other.
    fn full_day_interval(&self, range: &RangeValue) -> Option<TimeValueInterval> {
        let first = range
            .start
            .as_deref()
            .or(range.end.as_deref())
            .unwrap_or(OPEN_RANGE_FIRST_DAY);
        let last = range
            .end
            .as_deref()
            .or(range.start.as_deref())
            .unwrap_or(OPEN_RANGE_LAST_DAY);
        Some(TimeValueInterval::new(
            self.start_of_day(parse_date(first)?)?,
            self.end_of_day(parse_date(last)?)?,
        ))
    }

    // ── local calendar helpers ──

    fn start_of_day(&self, date: NaiveDate) -> Option<i64> {
        self.anchor.local_ms_at(date, NaiveTime::MIN)
    }

    fn end_of_day(&self, date: NaiveDate) -> Option<i64> {
        self.anchor.local_ms_at(date, TimeOfDay::END_OF_DAY.to_naive())
    }

    fn start_of_day_containing(&self, ms: i64) -> Option<i64> {
        self.start_of_day(self.anchor.local_date_of(ms)?)
    }

    fn end_of_day_containing(&self, ms: i64) -> Option<i64> {
        self.end_of_day(self.anchor.local_date_of(ms)?)
    }

    /// Read a date-time literal; values without an offset are local to the anchor.
    fn parse_instant(&self, value: &str) -> Option<i64> {
        let value = value.trim();
        if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
            return Some(instant.timestamp_millis());
        }
        for format in [
            "%Y-%m-%d %H:%M:%S%.f",
            "%Y-%m-%dT%H:%M:%S%.f",
            "%Y-%m-%d %H:%M",
            "%Y-%m-%dT%H:%M",
        ] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
                return self.anchor.local_ms(naive);
            }
        }
        self.start_of_day(parse_date(value)?)
    }
}

/// The `YYYY-MM-DD` prefix of a date or date-time literal.
fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim().get(..10)?, "%Y-%m-%d").ok()
}

/// Distinct date prefixes of date or date-time literals, first-seen order.
fn date_prefixes(values: &[String]) -> Vec<&str> {
    let mut prefixes: Vec<&str> = Vec::new();
    for prefix in values.iter().filter_map(|v| v.get(..10)) {
        if !prefixes.contains(&prefix) {
            prefixes.push(prefix);
        }
    }
    prefixes
}

/// Attach a date to both sides of a time range.
fn on_date(prefix: &str, range: &RangeValue) -> RangeValue {
    let attach = |time: &String| format!("{} {}", prefix, time);
    RangeValue::new(range.start.as_ref().map(attach), range.end.as_ref().map(attach))
}

//! Collapse loosely typed recognizer output into a typed result.
//!
//! A recognizer reports every expression it found as a [`RawMatch`] with a
//! string type tag and string payloads. [`normalize`] classifies each match
//! into a [`TemporalValue`] and pools repeated kinds into one
//! [`TemporalResult`], which the resolver then dispatches on.

use serde::{Deserialize, Serialize};

use crate::recognizer::{MatchKind, RawMatch, ResolutionValue};
use crate::time_of_day::{MAX_DURATION_MS, MS_PER_SECOND};

/// A `{start, end}` payload. At least one side is present in every stored range.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeValue {
    pub start: Option<String>,
    pub end: Option<String>,
}

impl RangeValue {
    pub fn new(start: Option<String>, end: Option<String>) -> Self {
        Self { start, end }
    }

    /// A range with only a start, as used for bare dates, times and date-times.
    pub fn starting(start: &str) -> Self {
        Self {
            start: Some(start.to_string()),
            end: None,
        }
    }
}

/// One normalized expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemporalValue {
    Date(String),
    Time(String),
    DateTime(String),
    Duration(String),
    DateRange(RangeValue),
    TimeRange(RangeValue),
    DateTimeRange(RangeValue),
}

impl TemporalValue {
    /// Classify one resolution payload; `None` if it lacks the fields its kind needs.
    fn from_resolution(kind: MatchKind, resolution: &ResolutionValue) -> Option<Self> {
        let scalar = || resolution.value.clone().filter(|v| !v.trim().is_empty());
        let range = || {
            let range = RangeValue::new(resolution.start.clone(), resolution.end.clone());
            (range.start.is_some() || range.end.is_some()).then_some(range)
        };
        match kind {
            MatchKind::Date => scalar().map(Self::Date),
            MatchKind::Time => scalar().map(Self::Time),
            MatchKind::DateTime => scalar().map(Self::DateTime),
            MatchKind::Duration => scalar().map(Self::Duration),
            MatchKind::DateRange => range().map(Self::DateRange),
            MatchKind::TimeRange => range().map(Self::TimeRange),
            MatchKind::DateTimeRange => range().map(Self::DateTimeRange),
        }
    }
}

/// Every recognized expression of an input, grouped by kind in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemporalResult {
    pub dates: Vec<String>,
    pub times: Vec<String>,
    pub date_times: Vec<String>,
    pub durations: Vec<String>,
    pub date_ranges: Vec<RangeValue>,
    pub time_ranges: Vec<RangeValue>,
    pub date_time_ranges: Vec<RangeValue>,
}

/// The expression kind that anchors interval construction, in dispatch priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchoring<'a> {
    DateTimeRanges(&'a [RangeValue]),
    TimeRanges(&'a [RangeValue]),
    DateRanges(&'a [RangeValue]),
    DateTimes(&'a [String]),
    Times(&'a [String]),
    Dates(&'a [String]),
}

impl TemporalResult {
    pub fn push(&mut self, value: TemporalValue) {
        match value {
            TemporalValue::Date(v) => self.dates.push(v),
            TemporalValue::Time(v) => self.times.push(v),
            TemporalValue::DateTime(v) => self.date_times.push(v),
            TemporalValue::Duration(v) => self.durations.push(v),
            TemporalValue::DateRange(r) => self.date_ranges.push(r),
            TemporalValue::TimeRange(r) => self.time_ranges.push(r),
            TemporalValue::DateTimeRange(r) => self.date_time_ranges.push(r),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.durations.is_empty() && !self.has_date_or_time()
    }

    /// Whether anything besides durations was recognized.
    pub fn has_date_or_time(&self) -> bool {
        self.anchoring().is_some()
    }

    /// The highest-priority kind present among date/time expressions.
    pub fn anchoring(&self) -> Option<Anchoring<'_>> {
        if !self.date_time_ranges.is_empty() {
            Some(Anchoring::DateTimeRanges(&self.date_time_ranges))
        } else if !self.time_ranges.is_empty() {
            Some(Anchoring::TimeRanges(&self.time_ranges))
        } else if !self.date_ranges.is_empty() {
            Some(Anchoring::DateRanges(&self.date_ranges))
        } else if !self.date_times.is_empty() {
            Some(Anchoring::DateTimes(&self.date_times))
        } else if !self.times.is_empty() {
            Some(Anchoring::Times(&self.times))
        } else if !self.dates.is_empty() {
            Some(Anchoring::Dates(&self.dates))
        } else {
            None
        }
    }

    /// Distinct positive durations in milliseconds, first-seen order.
    ///
    /// `None` when no duration value could be read.
    pub fn durations_ms(&self) -> Option<Vec<i64>> {
        let mut parsed: Vec<i64> = Vec::new();
        for ms in self.durations.iter().filter_map(|d| parse_duration_ms(d)) {
            if ms > 0 && !parsed.contains(&ms) {
                parsed.push(ms);
            }
        }
        (!parsed.is_empty()).then_some(parsed)
    }

    /// The first duration value, if it is readable and positive.
    ///
    /// Later values are not consulted, so an unreadable first duration
    /// leaves the request without a parsed duration.
    pub fn first_duration_ms(&self) -> Option<i64> {
        self.durations
            .first()
            .and_then(|d| parse_duration_ms(d))
            .filter(|ms| *ms > 0)
    }
}

/// Read a duration given in seconds; `None` if it is not a finite,
/// non-negative number no longer than [`MAX_DURATION_MS`].
pub fn parse_duration_ms(seconds: &str) -> Option<i64> {
    let seconds: f64 = seconds.trim().parse().ok()?;
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    let ms = (seconds * MS_PER_SECOND as f64).round();
    (ms <= MAX_DURATION_MS as f64).then_some(ms as i64)
}

/// Normalize a recognizer's matches.
///
/// Matches without a resolution, with an unrelated type tag, or with a
/// payload missing the fields its kind needs are skipped. Returns `None` if
/// nothing remains.
pub fn normalize(matches: &[RawMatch]) -> Option<TemporalResult> {
    let mut result = TemporalResult::default();
    for raw in matches {
        let Some(kind) = MatchKind::from_type_name(&raw.type_name) else {
            tracing::trace!(type_name = %raw.type_name, "Skipping unrelated match");
            continue;
        };
        let Some(values) = raw.resolution.as_deref().filter(|v| !v.is_empty()) else {
            tracing::trace!(text = %raw.text, "Skipping unresolved match");
            continue;
        };
        for resolution in values {
            match TemporalValue::from_resolution(kind, resolution) {
                Some(value) => result.push(value),
                None => tracing::warn!(
                    text = %raw.text,
                    kind = kind.sub_type(),
                    "Skipping malformed resolution"
                ),
            }
        }
    }
    (!result.is_empty()).then_some(result)
}

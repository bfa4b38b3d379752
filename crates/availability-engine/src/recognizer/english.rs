//! Built-in recognizer for English scheduling phrases.
//!
//! Scans the input left to right and, at each position, tries the most
//! specific expression shapes first: offsets from now, date ranges, dates
//! with a part of day, time ranges, dates (optionally with a time), times,
//! and finally durations. Each recognized span becomes one [`RawMatch`].
//!
//! Relative expressions are resolved against the [`Anchor`] passed at
//! construction; nothing reads the system clock.
//!
//! # Supported Expressions
//!
//! **Durations**: `"45 min"`, `"2 hours"`, `"an hour"`, `"half an hour"`,
//! `"1.5h"`, `"1h30m"`, `"90min"`
//!
//! **Times**: `"2pm"`, `"2:30 pm"`, `"14:00"`, `"1p"`, `"at 9"`, `"noon"`,
//! `"midnight"`, `"end of day"`
//!
//! **Time ranges**: `"9-11am"`, `"9:30-11"`, `"from 1pm to 3pm"`,
//! `"between 2 and 4pm"`, `"from 1pm"`, `"until noon"`, `"morning"`,
//! `"afternoon"`, `"evening"`, `"night"`
//!
//! **Dates**: `"today"`, `"tomorrow"`, `"next Monday"`, `"friday"`,
//! `"2026-03-15"`, `"march 15"`, `"15th of march 2026"`, `"3/15"`,
//! `"first Monday of March"`, `"last Friday of the month"`
//!
//! **Date ranges**: `"wed - fri"`, `"monday to thursday"`, `"next week"`,
//! `"last month"`, `"this weekend"`, `"past 7 days"`, `"until thursday"`,
//! `"from tuesday"`
//!
//! **Date-times**: `"tomorrow at 2pm"`, `"3pm friday"`, `"in 45 mins"`,
//! `"2 hours from now"`, `"now"`
//!
//! **Date-time ranges**: `"tomorrow morning"`, `"this afternoon"`, `"tonight"`
//!
//! Numeric ranges with neither a colon nor a meridiem (`"9-11"`) are
//! reported without a resolution, since they could as well be dates or
//! counts.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use super::{DateTimeRecognizer, MatchKind, RawMatch};
use crate::anchor::Anchor;
use crate::time_of_day::{TimeOfDay, MAX_DURATION_MS, MS_PER_SECOND};

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ── Configurable week start ─────────────────────────────────────────────────

/// Which day begins a week for period ranges ("this week", "next week").
///
/// Does **not** affect named-weekday expressions like "next Monday".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekStartDay {
    /// ISO 8601 standard (Monday = day 0 of the week).
    #[default]
    Monday,
    /// US/Canada convention (Sunday = day 0 of the week).
    Sunday,
}

/// How many days `weekday` is from the week-start day.
fn days_from_week_start(weekday: Weekday, week_start: WeekStartDay) -> i64 {
    match week_start {
        WeekStartDay::Monday => weekday.num_days_from_monday() as i64,
        WeekStartDay::Sunday => weekday.num_days_from_sunday() as i64,
    }
}

// ── EnglishRecognizer ───────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct EnglishRecognizer {
    anchor: Anchor,
    week_start: WeekStartDay,
}

type Scan = (usize, RawMatch);

impl EnglishRecognizer {
    pub fn new(anchor: Anchor) -> Self {
        Self {
            anchor,
            week_start: WeekStartDay::default(),
        }
    }

    pub fn with_week_start(mut self, week_start: WeekStartDay) -> Self {
        self.week_start = week_start;
        self
    }

    /// Try every expression shape at the head of `t`, most specific first.
    fn scan(&self, t: &[String]) -> Option<Scan> {
        self.scan_offset(t)
            .or_else(|| self.scan_date_range(t))
            .or_else(|| self.scan_date_time_range(t))
            .or_else(|| scan_time_range(t))
            .or_else(|| self.scan_date(t))
            .or_else(|| self.scan_time(t))
            .or_else(|| scan_duration(t))
    }

    /// "now", "in 45 mins", "2 hours from now", "30 minutes ago".
    fn scan_offset(&self, t: &[String]) -> Option<Scan> {
        if word(t, 0)? == "now" {
            return self.offset_match(t, 1, 0);
        }
        if word(t, 0)? == "in" {
            let (n, seconds) = parse_quantity(&t[1..])?;
            return self.offset_match(t, n + 1, seconds);
        }
        let (n, seconds) = parse_quantity(t)?;
        match (word(t, n), word(t, n + 1)) {
            (Some("from"), Some("now")) => self.offset_match(t, n + 2, seconds),
            (Some("ago"), _) => self.offset_match(t, n + 1, -seconds),
            _ => None,
        }
    }

    /// `None` when the offset leaves the representable calendar.
    fn offset_match(&self, t: &[String], consumed: usize, seconds: i64) -> Option<Scan> {
        let instant = self
            .anchor
            .instant()
            .checked_add_signed(Duration::try_seconds(seconds)?)?;
        let local = instant.with_timezone(&self.anchor.timezone()).naive_local();
        Some(scalar(
            MatchKind::DateTime,
            t,
            consumed,
            local.format(DATE_TIME_FORMAT).to_string(),
        ))
    }

    fn scan_date_range(&self, t: &[String]) -> Option<Scan> {
        let first = word(t, 0)?;

        if let Some(found) = self.scan_period(t) {
            return Some(found);
        }

        // "wed-fri", "3/15-3/20"
        if let Some((lhs, rhs)) = split_hyphenated(first) {
            let lhs = self.parse_date(&[lhs.to_string()]);
            let rhs = self.parse_date(&[rhs.to_string()]);
            if let (Some((1, start)), Some((1, end))) = (lhs, rhs) {
                let (start, end) = order_dates(start, end);
                return Some(date_range(t, 1, Some(start), Some(end)));
            }
        }

        // "from tuesday to thursday", "between mon and wed", "wed - fri"
        let lead = usize::from(matches!(first, "from" | "between"));
        let rest = &t[lead..];
        if let Some((n, start)) = self.parse_date(rest) {
            if word(rest, n).is_some_and(is_range_separator) {
                if let Some((m, end)) = self.parse_date(&rest[n + 1..]) {
                    let (start, end) = order_dates(start, end);
                    return Some(date_range(t, lead + n + 1 + m, Some(start), Some(end)));
                }
            }
            if first == "from" {
                return Some(date_range(t, lead + n, Some(start), None));
            }
        }

        match first {
            "since" | "starting" | "after" => {
                let (n, date) = self.parse_date(&t[1..])?;
                let start = if first == "after" { date.succ_opt()? } else { date };
                Some(date_range(t, n + 1, Some(start), None))
            }
            "until" | "till" | "til" | "through" | "by" | "before" => {
                let (n, date) = self.parse_date(&t[1..])?;
                let end = if first == "before" { date.pred_opt()? } else { date };
                Some(date_range(t, n + 1, None, Some(end)))
            }
            _ => None,
        }
    }

    /// Calendar periods: "next week", "last month", "this weekend", "past 7 days".
    fn scan_period(&self, t: &[String]) -> Option<Scan> {
        let today = self.anchor.today();
        let first = word(t, 0)?;

        if first == "weekend" {
            let (start, end) = weekend_of(today);
            return Some(date_range(t, 1, Some(start), Some(end)));
        }

        let shift: i64 = match first {
            "this" | "current" => 0,
            "next" | "coming" => 1,
            "last" | "previous" | "past" => -1,
            _ => return None,
        };
        let second = word(t, 1)?;

        // "past 7 days", "last 2 weeks", "next 3 days"
        if let Some(count) = second.parse::<i64>().ok().filter(|n| *n > 0) {
            let days = match word(t, 2)? {
                "day" | "days" => count,
                "week" | "weeks" => count.checked_mul(7)?,
                _ => return None,
            };
            let span = Duration::try_days(days - 1)?;
            let (start, end) = if shift > 0 {
                (today, today.checked_add_signed(span)?)
            } else {
                (today.checked_sub_signed(span)?, today)
            };
            return Some(date_range(t, 3, Some(start), Some(end)));
        }

        let (start, end) = match (first, second) {
            ("past", "week") => (today - Duration::days(6), today),
            (_, "week") => {
                let start = today - Duration::days(days_from_week_start(today.weekday(), self.week_start))
                    + Duration::weeks(shift);
                (start, start + Duration::days(6))
            }
            (_, "weekend") => {
                let (start, end) = weekend_of(today);
                (start + Duration::weeks(shift), end + Duration::weeks(shift))
            }
            (_, "month") => {
                let (y, m) = shift_month(today.year(), today.month(), shift);
                (NaiveDate::from_ymd_opt(y, m, 1)?, last_day_of_month(y, m)?)
            }
            (_, "year") => {
                let y = today.year() + shift as i32;
                (NaiveDate::from_ymd_opt(y, 1, 1)?, NaiveDate::from_ymd_opt(y, 12, 31)?)
            }
            _ => return None,
        };
        Some(date_range(t, 2, Some(start), Some(end)))
    }

    /// A date followed by a part of day: "tomorrow morning", "this afternoon", "tonight".
    fn scan_date_time_range(&self, t: &[String]) -> Option<Scan> {
        let today = self.anchor.today();
        let first = word(t, 0)?;
        if first == "tonight" {
            let (start, end) = part_of_day("night")?;
            return Some(date_time_range(t, 1, today, start, end));
        }
        if first == "this" {
            if let Some((start, end)) = word(t, 1).and_then(part_of_day) {
                return Some(date_time_range(t, 2, today, start, end));
            }
        }
        let (n, date) = self.parse_date(t)?;
        let skip = usize::from(word(t, n) == Some("in"));
        let (start, end) = word(t, n + skip).and_then(part_of_day)?;
        Some(date_time_range(t, n + skip + 1, date, start, end))
    }

    /// A date, optionally followed by a time: "friday", "tomorrow at 2pm".
    fn scan_date(&self, t: &[String]) -> Option<Scan> {
        let (n, date) = self.parse_date(t)?;
        let skip = usize::from(matches!(word(t, n), Some("at" | "@")));
        if let Some((m, clock)) = parse_clock(&t[n + skip..]) {
            if clock.explicit || skip == 1 {
                if let Some(time) = clock.to_time() {
                    let value = date.and_time(time.to_naive()).format(DATE_TIME_FORMAT);
                    return Some(scalar(MatchKind::DateTime, t, n + skip + m, value.to_string()));
                }
            }
        }
        Some(scalar(MatchKind::Date, t, n, date.format(DATE_FORMAT).to_string()))
    }

    /// A time, optionally followed by a date: "2pm", "at 9", "3pm on friday".
    fn scan_time(&self, t: &[String]) -> Option<Scan> {
        let skip = usize::from(matches!(word(t, 0), Some("at" | "@")));
        let (n, clock) = parse_clock(&t[skip..])?;
        if !clock.explicit && skip == 0 {
            return None;
        }
        let time = clock.to_time()?;
        if let Some((m, date)) = self.parse_date(&t[skip + n..]) {
            let value = date.and_time(time.to_naive()).format(DATE_TIME_FORMAT);
            return Some(scalar(MatchKind::DateTime, t, skip + n + m, value.to_string()));
        }
        Some(scalar(MatchKind::Time, t, skip + n, time.to_string()))
    }

    /// Parse a calendar date at the head of `t`, returning the tokens consumed.
    fn parse_date(&self, t: &[String]) -> Option<(usize, NaiveDate)> {
        let first = word(t, 0)?;
        if first == "on" {
            return self.parse_date(&t[1..]).map(|(n, date)| (n + 1, date));
        }

        let today = self.anchor.today();
        match (first, word(t, 1), word(t, 2)) {
            ("today", _, _) => return Some((1, today)),
            ("tomorrow" | "tmr" | "tmrw" | "tomorow", _, _) => return Some((1, today.succ_opt()?)),
            ("yesterday", _, _) => return Some((1, today.pred_opt()?)),
            ("day", Some("after"), Some("tomorrow")) => return Some((3, today + Duration::days(2))),
            ("day", Some("before"), Some("yesterday")) => return Some((3, today - Duration::days(2))),
            _ => {}
        }

        if let Some(found) = self.parse_ordinal_date(t) {
            return Some(found);
        }

        if matches!(first, "this" | "next" | "last") {
            let weekday = word(t, 1).and_then(parse_weekday)?;
            return Some((2, relative_weekday(today, first, weekday)));
        }

        if let Some(weekday) = parse_weekday(first) {
            return Some((1, upcoming_weekday(today, weekday)));
        }

        if let Ok(date) = NaiveDate::parse_from_str(first, DATE_FORMAT) {
            return Some((1, date));
        }

        if let Some(date) = parse_slash_date(first, today.year()) {
            return Some((1, date));
        }

        parse_month_day(t, today.year())
    }

    /// "first Monday of March", "last Friday of the month", "last day of next month".
    fn parse_ordinal_date(&self, t: &[String]) -> Option<(usize, NaiveDate)> {
        if word(t, 2)? != "of" {
            return None;
        }
        let ordinal = parse_ordinal(word(t, 0)?)?;
        let today = self.anchor.today();

        let (year, month, consumed) = match word(t, 3)? {
            "month" => (today.year(), today.month(), 4),
            "next" if word(t, 4) == Some("month") => {
                let (y, m) = shift_month(today.year(), today.month(), 1);
                (y, m, 5)
            }
            other => {
                let month = parse_month(other)?;
                match word(t, 4).and_then(parse_year) {
                    Some(year) => (year, month, 5),
                    None => (today.year(), month, 4),
                }
            }
        };

        let date = match word(t, 1)? {
            "day" if ordinal < 0 => last_day_of_month(year, month)?,
            "day" => NaiveDate::from_ymd_opt(year, month, ordinal as u32)?,
            weekday => find_nth_weekday_in_month(year, month, parse_weekday(weekday)?, ordinal)?,
        };
        Some((consumed, date))
    }
}

impl DateTimeRecognizer for EnglishRecognizer {
    fn parse(&self, text: &str) -> Vec<RawMatch> {
        let tokens = tokenize(text);
        let mut matches = Vec::new();
        let mut i = 0;
        while i < tokens.len() {
            match self.scan(&tokens[i..]) {
                Some((consumed, found)) => {
                    matches.push(found);
                    i += consumed.max(1);
                }
                None => i += 1,
            }
        }
        matches
    }
}

// ── Time ranges and durations ───────────────────────────────────────────────

fn scan_time_range(t: &[String]) -> Option<Scan> {
    let first = word(t, 0)?;

    // "9-11am", "9:30-11", "9am-11am", "9-11 am"
    if let Some((lhs, rhs)) = split_hyphenated(first) {
        if starts_with_digit(lhs) && starts_with_digit(rhs) {
            let trailing = word(t, 1).and_then(parse_meridiem);
            let consumed = if trailing.is_some() { 2 } else { 1 };
            let start = parse_clock_text(lhs);
            let end = parse_clock_text(rhs).map(|clock| match trailing {
                Some(meridiem) if clock.meridiem.is_none() => clock.with_meridiem(meridiem),
                _ => clock,
            });
            let resolved = start.zip(end).and_then(|(s, e)| resolve_clock_pair(s, e));
            return Some(time_range(t, consumed, resolved));
        }
    }

    if let Some((start, end)) = part_of_day(first) {
        return Some(time_range(t, 1, Some((start, end))));
    }

    // "from 1pm to 3pm", "between 2 and 4pm", "1pm - 3pm"
    let lead = usize::from(matches!(first, "from" | "between"));
    let rest = &t[lead..];
    if let Some((n, start)) = parse_clock(rest) {
        if word(rest, n).is_some_and(is_range_separator) {
            if let Some((m, end)) = parse_clock(&rest[n + 1..]) {
                return Some(time_range(t, lead + n + 1 + m, resolve_clock_pair(start, end)));
            }
        }
    }

    match first {
        // "2h from 1p"
        "from" | "after" | "since" | "starting" => {
            let skip = 1 + usize::from(word(t, 1) == Some("at"));
            let (n, clock) = parse_clock(&t[skip..]).filter(|(_, c)| c.explicit)?;
            let time = clock.to_time()?;
            Some(open_time_range(t, skip + n, Some(time), None))
        }
        // "2 hours until noon"
        "until" | "till" | "til" | "before" | "by" => {
            let (n, clock) = parse_clock(&t[1..]).filter(|(_, c)| c.explicit)?;
            let time = clock.to_time()?;
            Some(open_time_range(t, n + 1, None, Some(time)))
        }
        _ => None,
    }
}

fn scan_duration(t: &[String]) -> Option<Scan> {
    let (n, seconds) = parse_quantity(t)?;
    Some(scalar(MatchKind::Duration, t, n, seconds.to_string()))
}

/// Parse an amount of time at the head of `t` as whole seconds.
fn parse_quantity(t: &[String]) -> Option<(usize, i64)> {
    let first = word(t, 0)?;

    // "half an hour", "half hour"
    if first == "half" {
        return match (word(t, 1)?, word(t, 2)) {
            ("a" | "an", Some(unit)) => Some((3, unit_seconds(unit)? / 2)),
            (unit, _) => Some((2, unit_seconds(unit)? / 2)),
        };
    }

    if let Some(seconds) = parse_compact_duration(first) {
        return Some((1, seconds));
    }

    let amount = match first {
        "a" | "an" => 1.0,
        other => parse_number(other)?,
    };
    let unit = unit_seconds(word(t, 1)?)? as f64;
    let mut total = amount * unit;
    let mut consumed = 2;

    // "an hour and a half"
    if word(t, 2) == Some("and")
        && matches!(word(t, 3), Some("a" | "an"))
        && word(t, 4) == Some("half")
    {
        total += unit / 2.0;
        consumed = 5;
    }
    Some((consumed, bounded_seconds(total)?))
}

/// Parse compact durations like "2h", "45m", "90min", "1.5h", "1h30m".
fn parse_compact_duration(token: &str) -> Option<i64> {
    if !starts_with_digit(token) {
        return None;
    }
    let mut total = 0.0;
    let mut rest = token;
    while !rest.is_empty() {
        let num_len = rest.find(|c: char| !(c.is_ascii_digit() || c == '.'))?;
        if num_len == 0 {
            return None;
        }
        let amount: f64 = rest[..num_len].parse().ok()?;
        rest = &rest[num_len..];

        let unit_len = rest.find(|c: char| c.is_ascii_digit()).unwrap_or(rest.len());
        let unit = match &rest[..unit_len] {
            "m" => 60,
            "s" => 1,
            "d" => 86_400,
            "w" => 604_800,
            other => unit_seconds(other)?,
        };
        total += amount * unit as f64;
        rest = &rest[unit_len..];
    }
    bounded_seconds(total)
}

/// Round to whole seconds, rejecting amounts beyond [`MAX_DURATION_MS`].
fn bounded_seconds(total: f64) -> Option<i64> {
    let total = total.round();
    (total.is_finite() && total <= (MAX_DURATION_MS / MS_PER_SECOND) as f64)
        .then_some(total as i64)
}

/// Seconds per unit (case-insensitive input is lowered by the tokenizer).
fn unit_seconds(s: &str) -> Option<i64> {
    match s {
        "second" | "seconds" | "sec" | "secs" => Some(1),
        "minute" | "minutes" | "min" | "mins" => Some(60),
        "hour" | "hours" | "hr" | "hrs" | "h" => Some(3_600),
        "day" | "days" => Some(86_400),
        "week" | "weeks" | "wk" | "wks" => Some(604_800),
        _ => None,
    }
}

fn parse_number(s: &str) -> Option<f64> {
    let named = match s {
        "one" => 1.0,
        "two" => 2.0,
        "three" => 3.0,
        "four" => 4.0,
        "five" => 5.0,
        "six" => 6.0,
        "seven" => 7.0,
        "eight" => 8.0,
        "nine" => 9.0,
        "ten" => 10.0,
        "fifteen" => 15.0,
        "twenty" => 20.0,
        "thirty" => 30.0,
        "forty" => 40.0,
        "ninety" => 90.0,
        _ => {
            let n: f64 = s.parse().ok()?;
            return (n.is_finite() && n >= 0.0).then_some(n);
        }
    };
    Some(named)
}

// ── Clock parsing ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Meridiem {
    Am,
    Pm,
}

impl Meridiem {
    fn flip(self) -> Self {
        match self {
            Self::Am => Self::Pm,
            Self::Pm => Self::Am,
        }
    }
}

/// A clock reading before 12/24-hour resolution.
#[derive(Debug, Clone, Copy)]
struct Clock {
    hour: u32,
    minute: u32,
    second: u32,
    meridiem: Option<Meridiem>,
    /// Written unambiguously as a time (colon, meridiem, or a name like "noon").
    explicit: bool,
}

impl Clock {
    fn from_time(time: TimeOfDay) -> Self {
        Self {
            hour: time.hour(),
            minute: time.minute(),
            second: time.second(),
            meridiem: None,
            explicit: true,
        }
    }

    fn with_meridiem(self, meridiem: Meridiem) -> Self {
        Self {
            meridiem: Some(meridiem),
            explicit: true,
            ..self
        }
    }

    fn to_time(self) -> Option<TimeOfDay> {
        let hour = match self.meridiem {
            None => self.hour,
            Some(_) if self.hour == 0 || self.hour > 12 => return None,
            Some(Meridiem::Am) => self.hour % 12,
            Some(Meridiem::Pm) => self.hour % 12 + 12,
        };
        TimeOfDay::hms(hour, self.minute, self.second)
    }
}

/// Parse a clock at the head of `t`: a named time, or "2pm", "2:30 pm", "14:00", "9".
fn parse_clock(t: &[String]) -> Option<(usize, Clock)> {
    for len in (1..=3.min(t.len())).rev() {
        if let Some(time) = named_time(&t[..len].join(" ")) {
            return Some((len, Clock::from_time(time)));
        }
    }
    let clock = parse_clock_text(word(t, 0)?)?;
    if clock.meridiem.is_none() {
        if let Some(meridiem) = word(t, 1).and_then(parse_meridiem) {
            return Some((2, clock.with_meridiem(meridiem)));
        }
    }
    Some((1, clock))
}

/// Parse a single-token clock: "2pm", "2:30pm", "1p", "14:00", "14:30:00", "9".
fn parse_clock_text(s: &str) -> Option<Clock> {
    let (digits, meridiem) = if let Some(rest) = s.strip_suffix("am").or_else(|| s.strip_suffix('a')) {
        (rest, Some(Meridiem::Am))
    } else if let Some(rest) = s.strip_suffix("pm").or_else(|| s.strip_suffix('p')) {
        (rest, Some(Meridiem::Pm))
    } else {
        (s, None)
    };

    let parts: Vec<&str> = digits.split(':').collect();
    if parts.len() > 3 || parts.iter().any(|p| p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit())) {
        return None;
    }
    if parts[0].len() > 2 || parts[1..].iter().any(|p| p.len() != 2) {
        return None;
    }
    let hour: u32 = parts[0].parse().ok()?;
    let minute: u32 = parts.get(1).map_or(Some(0), |p| p.parse().ok())?;
    let second: u32 = parts.get(2).map_or(Some(0), |p| p.parse().ok())?;

    Some(Clock {
        hour,
        minute,
        second,
        meridiem,
        explicit: meridiem.is_some() || parts.len() > 1,
    })
}

fn parse_meridiem(s: &str) -> Option<Meridiem> {
    match s {
        "am" => Some(Meridiem::Am),
        "pm" => Some(Meridiem::Pm),
        _ => None,
    }
}

/// Resolve a start/end clock pair, sharing a meridiem written on only one side.
///
/// "9-11am" is 09:00-11:00, "11-1pm" is 11:00-13:00, "1-3pm" is 13:00-15:00.
/// Pairs where neither side is explicit are ambiguous and yield `None`.
fn resolve_clock_pair(start: Clock, end: Clock) -> Option<(TimeOfDay, TimeOfDay)> {
    if !start.explicit && !end.explicit {
        return None;
    }
    let (start, end) = match (start.meridiem, end.meridiem) {
        (None, Some(meridiem)) if (1..=12).contains(&start.hour) => {
            let same = start.with_meridiem(meridiem);
            match (same.to_time(), end.to_time()) {
                (Some(s), Some(e)) if !e.is_before(&s) => (same, end),
                _ => (start.with_meridiem(meridiem.flip()), end),
            }
        }
        (Some(meridiem), None) if (1..=12).contains(&end.hour) => {
            let same = end.with_meridiem(meridiem);
            match (start.to_time(), same.to_time()) {
                (Some(s), Some(e)) if !e.is_before(&s) => (start, same),
                _ => (start, end.with_meridiem(meridiem.flip())),
            }
        }
        _ => (start, end),
    };
    Some((start.to_time()?, end.to_time()?))
}

/// Map a named time to a clock value.
fn named_time(s: &str) -> Option<TimeOfDay> {
    match s {
        "noon" | "midday" | "lunch" => TimeOfDay::hms(12, 0, 0),
        "midnight" => Some(TimeOfDay::MIDNIGHT),
        "start of business" | "sob" => TimeOfDay::hms(9, 0, 0),
        "end of day" | "end of business" | "eod" | "eob" => TimeOfDay::hms(17, 0, 0),
        _ => None,
    }
}

/// Map a part of the day to its span.
fn part_of_day(s: &str) -> Option<(TimeOfDay, TimeOfDay)> {
    let (start, end) = match s {
        "morning" => (8, 12),
        "afternoon" => (12, 16),
        "evening" => (16, 20),
        "night" => return Some((TimeOfDay::hms(20, 0, 0)?, TimeOfDay::hms(23, 59, 59)?)),
        _ => return None,
    };
    Some((TimeOfDay::hms(start, 0, 0)?, TimeOfDay::hms(end, 0, 0)?))
}

// ── Date helpers ────────────────────────────────────────────────────────────

/// "this", "next" or "last" applied to a weekday.
fn relative_weekday(today: NaiveDate, modifier: &str, weekday: Weekday) -> NaiveDate {
    let current = today.weekday().num_days_from_monday() as i64;
    let target = weekday.num_days_from_monday() as i64;
    match modifier {
        // Always future: if today is the same weekday, go to next week
        "next" => {
            let days_ahead = (target - current + 7) % 7;
            today + Duration::days(if days_ahead == 0 { 7 } else { days_ahead })
        }
        // Always past: if today is the same weekday, go to last week
        "last" => {
            let days_back = (current - target + 7) % 7;
            today - Duration::days(if days_back == 0 { 7 } else { days_back })
        }
        // Same week: may be past or future
        _ => today + Duration::days(target - current),
    }
}

/// The next occurrence of `weekday`, today included.
fn upcoming_weekday(today: NaiveDate, weekday: Weekday) -> NaiveDate {
    let days_ahead = (weekday.num_days_from_monday() as i64
        - today.weekday().num_days_from_monday() as i64
        + 7)
        % 7;
    today + Duration::days(days_ahead)
}

/// The Saturday-Sunday pair of the current or upcoming weekend.
fn weekend_of(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let saturday = if today.weekday() == Weekday::Sun {
        today - Duration::days(1)
    } else {
        upcoming_weekday(today, Weekday::Sat)
    };
    (saturday, saturday + Duration::days(1))
}

/// Put a range in order; a weekday range like "fri - mon" wraps into the next week.
fn order_dates(start: NaiveDate, end: NaiveDate) -> (NaiveDate, NaiveDate) {
    if start <= end {
        (start, end)
    } else if end + Duration::days(7) > start {
        (start, end + Duration::days(7))
    } else {
        (end, start)
    }
}

fn shift_month(year: i32, month: u32, delta: i64) -> (i32, u32) {
    let index = i64::from(year) * 12 + i64::from(month) - 1 + delta;
    (index.div_euclid(12) as i32, index.rem_euclid(12) as u32 + 1)
}

fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (ny, nm) = shift_month(year, month, 1);
    NaiveDate::from_ymd_opt(ny, nm, 1)?.pred_opt()
}

/// Find the Nth weekday in a month. ordinal < 0 means "last" (-1).
fn find_nth_weekday_in_month(
    year: i32,
    month: u32,
    weekday: Weekday,
    ordinal: i32,
) -> Option<NaiveDate> {
    let target = if ordinal > 0 {
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        let diff = (weekday.num_days_from_monday() as i64
            - first.weekday().num_days_from_monday() as i64
            + 7)
            % 7;
        first + Duration::days(diff) + Duration::weeks(i64::from(ordinal) - 1)
    } else {
        let last = last_day_of_month(year, month)?;
        let diff = (last.weekday().num_days_from_monday() as i64
            - weekday.num_days_from_monday() as i64
            + 7)
            % 7;
        last - Duration::days(diff) - Duration::weeks(i64::from(-ordinal) - 1)
    };
    // Verify still in the same month
    (target.month() == month).then_some(target)
}

/// "march 15", "mar 15th 2026", "15 march", "15th of march".
fn parse_month_day(t: &[String], default_year: i32) -> Option<(usize, NaiveDate)> {
    let (month, day, mut consumed) = if let Some(month) = parse_month(word(t, 0)?) {
        (month, parse_day(word(t, 1)?)?, 2)
    } else {
        let day = parse_day(word(t, 0)?)?;
        let skip = usize::from(word(t, 1) == Some("of"));
        (parse_month(word(t, 1 + skip)?)?, day, 2 + skip)
    };
    let year = match word(t, consumed).and_then(parse_year) {
        Some(year) => {
            consumed += 1;
            year
        }
        None => default_year,
    };
    Some((consumed, NaiveDate::from_ymd_opt(year, month, day)?))
}

/// "3/15", "3/15/2026", "3/15/26" (month first).
fn parse_slash_date(s: &str, default_year: i32) -> Option<NaiveDate> {
    let parts: Vec<&str> = s.split('/').collect();
    if !(2..=3).contains(&parts.len()) {
        return None;
    }
    let month: u32 = parts[0].parse().ok()?;
    let day: u32 = parts[1].parse().ok()?;
    let year = match parts.get(2) {
        Some(y) if y.len() == 2 => 2000 + y.parse::<i32>().ok()?,
        Some(y) => y.parse::<i32>().ok()?,
        None => default_year,
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_day(s: &str) -> Option<u32> {
    let digits = s
        .strip_suffix("st")
        .or_else(|| s.strip_suffix("nd"))
        .or_else(|| s.strip_suffix("rd"))
        .or_else(|| s.strip_suffix("th"))
        .unwrap_or(s);
    let day: u32 = digits.parse().ok()?;
    (1..=31).contains(&day).then_some(day)
}

fn parse_year(s: &str) -> Option<i32> {
    let year: i32 = s.parse().ok()?;
    (s.len() == 4 && (1900..=2100).contains(&year)).then_some(year)
}

/// Parse a weekday name (full and abbreviated).
fn parse_weekday(s: &str) -> Option<Weekday> {
    match s {
        "monday" | "mon" => Some(Weekday::Mon),
        "tuesday" | "tue" | "tues" => Some(Weekday::Tue),
        "wednesday" | "wed" => Some(Weekday::Wed),
        "thursday" | "thu" | "thurs" => Some(Weekday::Thu),
        "friday" | "fri" => Some(Weekday::Fri),
        "saturday" | "sat" => Some(Weekday::Sat),
        "sunday" | "sun" => Some(Weekday::Sun),
        _ => None,
    }
}

/// Parse a month name to number (1-12).
fn parse_month(s: &str) -> Option<u32> {
    match s {
        "january" | "jan" => Some(1),
        "february" | "feb" => Some(2),
        "march" | "mar" => Some(3),
        "april" | "apr" => Some(4),
        "may" => Some(5),
        "june" | "jun" => Some(6),
        "july" | "jul" => Some(7),
        "august" | "aug" => Some(8),
        "september" | "sep" | "sept" => Some(9),
        "october" | "oct" => Some(10),
        "november" | "nov" => Some(11),
        "december" | "dec" => Some(12),
        _ => None,
    }
}

/// Parse an ordinal: "first"→1, "second"→2, ..., "last"→-1.
fn parse_ordinal(s: &str) -> Option<i32> {
    match s {
        "first" | "1st" => Some(1),
        "second" | "2nd" => Some(2),
        "third" | "3rd" => Some(3),
        "fourth" | "4th" => Some(4),
        "fifth" | "5th" => Some(5),
        "last" => Some(-1),
        _ => None,
    }
}

// ── Tokens and match builders ───────────────────────────────────────────────

/// Lowercase, unify dashes and meridiem spellings, strip punctuation and "the".
fn tokenize(text: &str) -> Vec<String> {
    let lowered = text
        .to_lowercase()
        .replace(['\u{2013}', '\u{2014}'], "-")
        .replace("a.m.", "am")
        .replace("p.m.", "pm");
    lowered
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| matches!(c, ',' | '.' | '!' | '?' | ';' | '(' | ')' | '"')))
        .filter(|w| !w.is_empty() && *w != "the")
        .map(str::to_string)
        .collect()
}

fn word(t: &[String], i: usize) -> Option<&str> {
    t.get(i).map(String::as_str)
}

fn starts_with_digit(s: &str) -> bool {
    s.starts_with(|c: char| c.is_ascii_digit())
}

fn split_hyphenated(token: &str) -> Option<(&str, &str)> {
    let (lhs, rhs) = token.split_once('-')?;
    (!lhs.is_empty() && !rhs.is_empty() && !rhs.contains('-')).then_some((lhs, rhs))
}

fn is_range_separator(s: &str) -> bool {
    matches!(s, "-" | "to" | "and" | "through" | "thru" | "until" | "till" | "til")
}

fn span(t: &[String], consumed: usize) -> String {
    t[..consumed.min(t.len())].join(" ")
}

fn scalar(kind: MatchKind, t: &[String], consumed: usize, value: String) -> Scan {
    (consumed, RawMatch::scalar(kind, span(t, consumed), value))
}

fn date_range(
    t: &[String],
    consumed: usize,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Scan {
    let format = |d: NaiveDate| d.format(DATE_FORMAT).to_string();
    (
        consumed,
        RawMatch::range(MatchKind::DateRange, span(t, consumed), start.map(format), end.map(format)),
    )
}

fn time_range(t: &[String], consumed: usize, resolved: Option<(TimeOfDay, TimeOfDay)>) -> Scan {
    match resolved {
        Some((start, end)) => open_time_range(t, consumed, Some(start), Some(end)),
        None => (consumed, RawMatch::unresolved(MatchKind::TimeRange, span(t, consumed))),
    }
}

fn open_time_range(
    t: &[String],
    consumed: usize,
    start: Option<TimeOfDay>,
    end: Option<TimeOfDay>,
) -> Scan {
    (
        consumed,
        RawMatch::range(
            MatchKind::TimeRange,
            span(t, consumed),
            start.map(|s| s.to_string()),
            end.map(|e| e.to_string()),
        ),
    )
}

fn date_time_range(
    t: &[String],
    consumed: usize,
    date: NaiveDate,
    start: TimeOfDay,
    end: TimeOfDay,
) -> Scan {
    let format = |time: TimeOfDay| {
        date.and_time(time.to_naive())
            .format(DATE_TIME_FORMAT)
            .to_string()
    };
    (
        consumed,
        RawMatch::range(
            MatchKind::DateTimeRange,
            span(t, consumed),
            Some(format(start)),
            Some(format(end)),
        ),
    )
}

// ── Tests ───────────────────────────────────────────────────────────────────

//! # availability-engine
//!
//! Deterministic scheduling computation for calendar and to-do tools.
//!
//! The engine expands daily working hours into closed intervals, subtracts
//! them and busy calendar events from the time ahead, and resolves a free-text
//! request ("9-11am tomorrow", "45 min this afternoon", or nothing at all)
//! into a bounded list of concrete candidate slots.
//!
//! Every function is pure: "now" and the timezone come in through an
//! [`Anchor`], and natural-language recognition goes through the
//! [`DateTimeRecognizer`] trait.
//!
//! ## Modules
//!
//! - [`anchor`] — The reference instant and timezone of one invocation
//! - [`time_of_day`] — Wall-clock time-of-day values and arithmetic
//! - [`interval`] — Epoch-millisecond and instant intervals
//! - [`working_hours`] — Working-hour boundaries → nightly off-hours intervals
//! - [`availability`] — Busy + off hours → sorted, disjoint free intervals
//! - [`splitter`] — Free intervals → grid-aligned, capped candidate slots
//! - [`recognizer`] — Recognizer contract and the built-in English recognizer
//! - [`normalize`] — Raw recognizer matches → typed temporal result
//! - [`resolver`] — Free-text request → candidate slots
//! - [`preferences`] — Working hours, default duration, timezone
//! - [`error`] — Error types

pub mod anchor;
pub mod availability;
pub mod error;
pub mod interval;
pub mod normalize;
pub mod preferences;
pub mod recognizer;
pub mod resolver;
pub mod splitter;
pub mod time_of_day;
pub mod working_hours;

pub use anchor::Anchor;
pub use availability::{compute_available_times, merge_interval};
pub use error::{ConfigError, EngineError, TimeError};
pub use interval::{DateInterval, TimeValueInterval};
pub use normalize::{normalize, RangeValue, TemporalResult, TemporalValue};
pub use preferences::Preferences;
pub use recognizer::{
    DateTimeRecognizer, EnglishRecognizer, MatchKind, RawMatch, ResolutionValue, WeekStartDay,
};
pub use resolver::{resolve_full_day_intervals, resolve_time_slots, TimeSlotResolution};
pub use splitter::{round_to_grid, split_intervals, Rounding, MAX_SLOTS};
pub use time_of_day::{parse_time_of_day, TimeOfDay};
pub use working_hours::{compute_off_hours, off_hours_between};

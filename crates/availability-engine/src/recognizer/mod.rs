//! The boundary to natural-language date/time recognition.
//!
//! Recognizers report what they found in free text as a list of loosely
//! typed [`RawMatch`] values: a type tag such as `datetimeV2.daterange` plus
//! string payloads. This mirrors the output of common recognizer libraries,
//! so a host can plug in any of them by implementing [`DateTimeRecognizer`]
//! (or by deserializing their JSON into `RawMatch`). The engine turns these
//! into typed values in [`crate::normalize`].
//!
//! [`EnglishRecognizer`] is the built-in implementation.

mod english;

pub use english::{EnglishRecognizer, WeekStartDay};

use serde::{Deserialize, Serialize};

/// Prefix of the type tags produced by [`EnglishRecognizer`].
pub const TYPE_NAME_PREFIX: &str = "datetimeV2";

/// Recognizes date/time expressions in free text.
///
/// Implementations must be side-effect free: the engine may call `parse`
/// several times within one invocation.
pub trait DateTimeRecognizer {
    fn parse(&self, text: &str) -> Vec<RawMatch>;
}

impl<R: DateTimeRecognizer + ?Sized> DateTimeRecognizer for &R {
    fn parse(&self, text: &str) -> Vec<RawMatch> {
        (**self).parse(text)
    }
}

/// One match reported by a recognizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMatch {
    /// The matched span of the input.
    #[serde(default)]
    pub text: String,
    /// Type tag, e.g. `datetimeV2.timerange`.
    pub type_name: String,
    /// `None` for syntactic matches that could not be resolved to a value.
    #[serde(default)]
    pub resolution: Option<Vec<ResolutionValue>>,
}

/// A single resolved payload. Scalars use `value`; ranges use `start`/`end`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

impl RawMatch {
    pub fn scalar(kind: MatchKind, text: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            type_name: kind.type_name(),
            resolution: Some(vec![ResolutionValue {
                value: Some(value.into()),
                ..Default::default()
            }]),
        }
    }

    pub fn range(
        kind: MatchKind,
        text: impl Into<String>,
        start: Option<String>,
        end: Option<String>,
    ) -> Self {
        Self {
            text: text.into(),
            type_name: kind.type_name(),
            resolution: Some(vec![ResolutionValue {
                start,
                end,
                ..Default::default()
            }]),
        }
    }

    pub fn unresolved(kind: MatchKind, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            type_name: kind.type_name(),
            resolution: None,
        }
    }
}

/// The expression kinds the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchKind {
    Date,
    Time,
    DateTime,
    Duration,
    DateRange,
    TimeRange,
    DateTimeRange,
}

impl MatchKind {
    /// Classify a type tag; tags for unrelated entities return `None`.
    ///
    /// Only the segment after the last `.` is significant, so both
    /// `datetimeV2.daterange` and `daterange` are accepted.
    pub fn from_type_name(type_name: &str) -> Option<Self> {
        let sub_type = type_name.rsplit('.').next().unwrap_or(type_name);
        match sub_type {
            "date" => Some(Self::Date),
            "time" => Some(Self::Time),
            "datetime" => Some(Self::DateTime),
            "duration" => Some(Self::Duration),
            "daterange" => Some(Self::DateRange),
            "timerange" => Some(Self::TimeRange),
            "datetimerange" => Some(Self::DateTimeRange),
            _ => None,
        }
    }

    pub fn sub_type(&self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Time => "time",
            Self::DateTime => "datetime",
            Self::Duration => "duration",
            Self::DateRange => "daterange",
            Self::TimeRange => "timerange",
            Self::DateTimeRange => "datetimerange",
        }
    }

    pub fn type_name(&self) -> String {
        format!("{}.{}", TYPE_NAME_PREFIX, self.sub_type())
    }
}

//! User scheduling preferences.
//!
//! Hosts usually store these as JSON next to their other settings:
//!
//! ```json
//! {
//!   "working_hours_start": "9:00 AM",
//!   "working_hours_end": "5:00 PM",
//!   "default_duration_minutes": 45,
//!   "timezone": "America/New_York",
//!   "week_start": "sunday"
//! }
//! ```
//!
//! Every field is optional. Working hours stay as the user typed them and
//! are only read when off hours are computed, so a bad value surfaces as a
//! [`ConfigError`] at that point.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::anchor::{parse_timezone, Anchor};
use crate::error::ConfigError;
use crate::interval::TimeValueInterval;
use crate::recognizer::{EnglishRecognizer, WeekStartDay};
use crate::time_of_day::MS_PER_MINUTE;
use crate::working_hours::compute_off_hours;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    /// e.g. `"9:00 AM"`.
    #[serde(default)]
    pub working_hours_start: Option<String>,
    /// e.g. `"5:00 PM"`.
    #[serde(default)]
    pub working_hours_end: Option<String>,
    #[serde(default = "default_duration_minutes")]
    pub default_duration_minutes: u32,
    /// IANA zone defining calendar days.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default)]
    pub week_start: WeekStartDay,
}

fn default_duration_minutes() -> u32 {
    60
}

fn default_timezone() -> String {
    "UTC".to_string()
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            working_hours_start: None,
            working_hours_end: None,
            default_duration_minutes: default_duration_minutes(),
            timezone: default_timezone(),
            week_start: WeekStartDay::default(),
        }
    }
}

impl Preferences {
    /// Parse preferences from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Malformed`] if the JSON does not describe
    /// preferences, and [`ConfigError::InvalidTimezone`] for an unknown zone.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let preferences: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Malformed(e.to_string()))?;
        parse_timezone(&preferences.timezone)?;
        Ok(preferences)
    }

    /// Capture `now` in the preferred timezone.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTimezone`] for an unknown zone.
    pub fn anchor_at(&self, now: DateTime<Utc>) -> Result<Anchor, ConfigError> {
        Anchor::with_timezone_name(now, &self.timezone)
    }

    /// The built-in recognizer configured with these preferences.
    pub fn recognizer(&self, anchor: Anchor) -> EnglishRecognizer {
        EnglishRecognizer::new(anchor).with_week_start(self.week_start)
    }

    pub fn default_duration_ms(&self) -> i64 {
        i64::from(self.default_duration_minutes) * MS_PER_MINUTE
    }

    /// Non-working intervals within `window`.
    ///
    /// # Errors
    ///
    /// See [`compute_off_hours`]; unset working hours are reported as missing.
    pub fn off_hours(
        &self,
        anchor: &Anchor,
        window: TimeValueInterval,
    ) -> Result<Vec<TimeValueInterval>, ConfigError> {
        compute_off_hours(
            &self.recognizer(*anchor),
            self.working_hours_start.as_deref().unwrap_or_default(),
            self.working_hours_end.as_deref().unwrap_or_default(),
            window,
            anchor,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let preferences = Preferences::from_json("{}").unwrap();
        assert_eq!(preferences, Preferences::default());
        assert_eq!(preferences.default_duration_ms(), 3_600_000);
        assert_eq!(preferences.week_start, WeekStartDay::Monday);
    }

    #[test]
    fn test_full_document() {
        let json = r#"{
            "working_hours_start": "9:00 AM",
            "working_hours_end": "5:00 PM",
            "default_duration_minutes": 45,
            "timezone": "America/New_York",
            "week_start": "sunday"
        }"#;
        let preferences = Preferences::from_json(json).unwrap();
        assert_eq!(preferences.working_hours_start.as_deref(), Some("9:00 AM"));
        assert_eq!(preferences.default_duration_ms(), 45 * 60_000);
        assert_eq!(preferences.week_start, WeekStartDay::Sunday);
    }

    #[test]
    fn test_malformed_and_bad_timezone() {
        assert!(matches!(
            Preferences::from_json("{\"default_duration_minutes\": \"lots\"}"),
            Err(ConfigError::Malformed(_))
        ));
        assert!(matches!(
            Preferences::from_json("not json"),
            Err(ConfigError::Malformed(_))
        ));
        assert!(matches!(
            Preferences::from_json("{\"timezone\": \"Mars/Olympus\"}"),
            Err(ConfigError::InvalidTimezone(_))
        ));
    }

    #[test]
    fn test_off_hours_in_preferred_timezone() {
        let preferences = Preferences {
            working_hours_start: Some("9:00 AM".to_string()),
            working_hours_end: Some("5:00 PM".to_string()),
            timezone: "Europe/Berlin".to_string(),
            ..Default::default()
        };
        // 10:00 in Berlin (UTC+1 in March before DST).
        let now = Utc.with_ymd_and_hms(2026, 3, 16, 9, 0, 0).unwrap();
        let anchor = preferences.anchor_at(now).unwrap();
        let at = now.timestamp_millis();
        let off = preferences
            .off_hours(&anchor, TimeValueInterval::new(at, at))
            .unwrap();
        let expected_start = Utc.with_ymd_and_hms(2026, 3, 16, 16, 0, 0).unwrap();
        let expected_end = Utc.with_ymd_and_hms(2026, 3, 17, 8, 0, 0).unwrap();
        assert_eq!(
            off,
            vec![TimeValueInterval::new(
                expected_start.timestamp_millis(),
                expected_end.timestamp_millis()
            )]
        );
    }

    #[test]
    fn test_unset_working_hours_are_missing() {
        let preferences = Preferences::default();
        let anchor = preferences
            .anchor_at(Utc.with_ymd_and_hms(2026, 3, 16, 9, 0, 0).unwrap())
            .unwrap();
        let window = TimeValueInterval::new(0, 0);
        assert_eq!(
            preferences.off_hours(&anchor, window),
            Err(ConfigError::MissingStart)
        );
    }
}

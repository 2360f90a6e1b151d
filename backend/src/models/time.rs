//! Eclipse clock times and the reference calendar date they are anchored to.
//!
//! The city dataset stores each eclipse phase as a bare `HH:MM:SS` string in
//! UTC. Combining it with the event date yields an absolute instant.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// An absolute point in time, independent of timezone.
pub type Instant = DateTime<Utc>;

/// Error returned when a time-of-day string is not a valid `HH:MM:SS` value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedTimeError {
    #[error("expected HH:MM:SS with three components, got {found} in '{input}'")]
    ComponentCount { input: String, found: usize },

    #[error("non-numeric {component} component '{value}' in '{input}'")]
    NotNumeric {
        input: String,
        component: &'static str,
        value: String,
    },

    #[error("{component} {value} out of range in '{input}'")]
    OutOfRange {
        input: String,
        component: &'static str,
        value: u32,
    },
}

/// Calendar date every eclipse time is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventDate(NaiveDate);

impl EventDate {
    /// Build from year, month (1-12) and day; `None` when the date does not exist.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Parse a UTC `HH:MM:SS` string and place it on this date.
    pub fn instant_at(&self, time: &str) -> Result<Instant, MalformedTimeError> {
        let time = parse_time_of_day(time)?;
        Ok(Utc.from_utc_datetime(&self.0.and_time(time)))
    }
}

impl Default for EventDate {
    /// The 8 April 2024 total solar eclipse.
    fn default() -> Self {
        Self(NaiveDate::from_ymd_opt(2024, 4, 8).unwrap_or_default())
    }
}

impl std::str::FromStr for EventDate {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map(Self)
    }
}

impl std::fmt::Display for EventDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// Parse a strict `HH:MM:SS` clock value.
///
/// Each component must be one or more ASCII digits; hours are 0-23 and
/// minutes/seconds 0-59. Leap seconds are rejected.
pub fn parse_time_of_day(input: &str) -> Result<NaiveTime, MalformedTimeError> {
    let parts: Vec<&str> = input.split(':').collect();
    if parts.len() != 3 {
        return Err(MalformedTimeError::ComponentCount {
            input: input.to_string(),
            found: parts.len(),
        });
    }

    let hour = component(input, "hour", parts[0], 23)?;
    let minute = component(input, "minute", parts[1], 59)?;
    let second = component(input, "second", parts[2], 59)?;

    NaiveTime::from_hms_opt(hour, minute, second).ok_or_else(|| MalformedTimeError::OutOfRange {
        input: input.to_string(),
        component: "time",
        value: hour,
    })
}

fn component(
    input: &str,
    name: &'static str,
    raw: &str,
    max: u32,
) -> Result<u32, MalformedTimeError> {
    let not_numeric = || MalformedTimeError::NotNumeric {
        input: input.to_string(),
        component: name,
        value: raw.to_string(),
    };

    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(not_numeric());
    }
    let value: u32 = raw.parse().map_err(|_| not_numeric())?;
    if value > max {
        return Err(MalformedTimeError::OutOfRange {
            input: input.to_string(),
            component: name,
            value,
        });
    }
    Ok(value)
}

/// Instant from epoch milliseconds, as stored in feature attributes.
pub fn instant_from_millis(millis: i64) -> Option<Instant> {
    DateTime::from_timestamp_millis(millis)
}

#[cfg(test)]
#[path = "time_tests.rs"]
mod time_tests;

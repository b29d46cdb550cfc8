//! Wall-clock time model for timetable entries.
//!
//! Timetable entries are expressed as a teaching day plus a `[start, end)`
//! range of "HH:MM" times. Internally a time of day is stored as minutes
//! since midnight so comparisons are numeric rather than lexicographic.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Errors produced while parsing or validating time values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeError {
    #[error("expected a time in HH:MM format, got '{0}'")]
    Format(String),
    #[error("time '{0}' is out of range (00:00-23:59)")]
    OutOfRange(String),
    #[error("unknown teaching day '{0}' (expected Monday to Friday)")]
    UnknownDay(String),
    #[error("start time {start} must be earlier than end time {end}")]
    EmptyRange { start: TimeOfDay, end: TimeOfDay },
}

/// A time of day with minute resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay(u16);

impl TimeOfDay {
    /// Build a time from hour and minute components.
    pub fn from_hm(hour: u8, minute: u8) -> Result<Self, TimeError> {
        if hour > 23 || minute > 59 {
            return Err(TimeError::OutOfRange(format!("{:02}:{:02}", hour, minute)));
        }
        Ok(Self(hour as u16 * 60 + minute as u16))
    }

    /// Minutes elapsed since midnight.
    pub fn minutes(&self) -> u16 {
        self.0
    }

    pub fn hour(&self) -> u8 {
        (self.0 / 60) as u8
    }

    pub fn minute(&self) -> u8 {
        (self.0 % 60) as u8
    }
}

impl FromStr for TimeOfDay {
    type Err = TimeError;

    /// Parse a strict, zero-padded "HH:MM" string.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (h, m) = trimmed
            .split_once(':')
            .ok_or_else(|| TimeError::Format(s.to_string()))?;

        let is_two_digits = |part: &str| part.len() == 2 && part.bytes().all(|b| b.is_ascii_digit());
        if !is_two_digits(h) || !is_two_digits(m) {
            return Err(TimeError::Format(s.to_string()));
        }

        let hour: u8 = h.parse().map_err(|_| TimeError::Format(s.to_string()))?;
        let minute: u8 = m.parse().map_err(|_| TimeError::Format(s.to_string()))?;
        Self::from_hm(hour, minute).map_err(|_| TimeError::OutOfRange(s.to_string()))
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// Teaching days of the week.
///
/// Serialized capitalized; deserialized through `FromStr`, so any casing
/// is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
}

impl Weekday {
    pub const ALL: [Weekday; 5] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
        }
    }
}

impl FromStr for Weekday {
    type Err = TimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Weekday::ALL
            .into_iter()
            .find(|day| day.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| TimeError::UnknownDay(s.to_string()))
    }
}

impl<'de> Deserialize<'de> for Weekday {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A half-open `[start, end)` range on a teaching day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TimeSlot {
    pub day: Weekday,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

impl TimeSlot {
    /// Create a slot, rejecting empty or inverted ranges.
    pub fn new(day: Weekday, start: TimeOfDay, end: TimeOfDay) -> Result<Self, TimeError> {
        if start >= end {
            return Err(TimeError::EmptyRange { start, end });
        }
        Ok(Self { day, start, end })
    }

    /// Length of the slot in minutes.
    pub fn duration_minutes(&self) -> u16 {
        self.end.minutes() - self.start.minutes()
    }

    /// Whether two slots intersect.
    ///
    /// Slots on different days never overlap. Adjacent slots
    /// (`self.end == other.start`) do not overlap.
    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        self.day == other.day
            && self.start.minutes() < other.end.minutes()
            && self.end.minutes() > other.start.minutes()
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}-{}", self.day, self.start, self.end)
    }
}

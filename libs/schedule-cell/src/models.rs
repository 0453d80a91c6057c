use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

pub const MINUTES_PER_DAY: u16 = 24 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
        DayOfWeek::Saturday,
        DayOfWeek::Sunday,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DayOfWeek::Monday => "MONDAY",
            DayOfWeek::Tuesday => "TUESDAY",
            DayOfWeek::Wednesday => "WEDNESDAY",
            DayOfWeek::Thursday => "THURSDAY",
            DayOfWeek::Friday => "FRIDAY",
            DayOfWeek::Saturday => "SATURDAY",
            DayOfWeek::Sunday => "SUNDAY",
        }
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
            Weekday::Sun => DayOfWeek::Sunday,
        }
    }
}

impl FromStr for DayOfWeek {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim();
        DayOfWeek::ALL
            .into_iter()
            .find(|day| day.as_str().eq_ignore_ascii_case(tag))
            .ok_or_else(|| ScheduleError::InvalidDayOfWeek(s.to_string()))
    }
}

// Accepts any casing, so rows written as "monday" still load
impl<'de> Deserialize<'de> for DayOfWeek {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Local wall-clock time of day, held as minutes since midnight.
///
/// Parsed from `"HH:MM"` (a trailing `":SS"` as returned by Postgres `time`
/// columns is accepted and truncated). `"24:00"` is allowed so a shift can
/// end exactly at midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime(u16);

impl ClockTime {
    pub fn from_minutes(minutes: u16) -> Result<Self, ScheduleError> {
        if minutes > MINUTES_PER_DAY {
            return Err(ScheduleError::InvalidTime(format!("{} minutes", minutes)));
        }
        Ok(Self(minutes))
    }

    pub fn from_hm(hours: u16, minutes: u16) -> Result<Self, ScheduleError> {
        if minutes > 59 || hours > 24 || (hours == 24 && minutes > 0) {
            return Err(ScheduleError::InvalidTime(format!("{:02}:{:02}", hours, minutes)));
        }
        Ok(Self(hours * 60 + minutes))
    }

    pub fn minutes(&self) -> u16 {
        self.0
    }
}

fn parse_clock_field(field: &str, max_len: usize) -> Option<u16> {
    if field.is_empty() || field.len() > max_len || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}

impl FromStr for ClockTime {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ScheduleError::InvalidTime(s.to_string());

        let mut parts = s.trim().split(':');
        let hours = parts.next().and_then(|h| parse_clock_field(h, 2)).ok_or_else(invalid)?;
        let minutes = parts
            .next()
            .filter(|m| m.len() == 2)
            .and_then(|m| parse_clock_field(m, 2))
            .ok_or_else(invalid)?;

        if let Some(seconds) = parts.next() {
            match parse_clock_field(seconds, 2) {
                Some(sec) if seconds.len() == 2 && sec < 60 => {}
                _ => return Err(invalid()),
            }
        }
        if parts.next().is_some() {
            return Err(invalid());
        }

        Self::from_hm(hours, minutes).map_err(|_| invalid())
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

impl Serialize for ClockTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClockTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// One recurring working interval for a weekday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyScheduleEntry {
    pub day_of_week: DayOfWeek,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
}

impl WeeklyScheduleEntry {
    pub fn new(day_of_week: DayOfWeek, start_time: ClockTime, end_time: ClockTime) -> Self {
        Self { day_of_week, start_time, end_time }
    }

    pub fn duration_minutes(&self) -> u16 {
        self.end_time.minutes().saturating_sub(self.start_time.minutes())
    }
}

/// Row shape of the `doctor_schedules` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleRow {
    pub doctor_id: String,
    pub day_of_week: DayOfWeek,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
}

impl ScheduleRow {
    pub fn from_entry(doctor_id: &str, entry: &WeeklyScheduleEntry) -> Self {
        Self {
            doctor_id: doctor_id.to_string(),
            day_of_week: entry.day_of_week,
            start_time: entry.start_time,
            end_time: entry.end_time,
        }
    }
}

impl From<ScheduleRow> for WeeklyScheduleEntry {
    fn from(row: ScheduleRow) -> Self {
        Self::new(row.day_of_week, row.start_time, row.end_time)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub time: ClockTime,
    pub available: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictReason {
    NoSchedule,
    OutsideHours,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictCheckResult {
    pub available: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<ConflictReason>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableDay {
    pub date: NaiveDate,
    pub day_of_week: DayOfWeek,
    pub is_today: bool,
    pub display: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkStats {
    pub total_hours_per_week: f64,
    pub days_per_week: u32,
    pub average_hours_per_day: f64,
    pub hours_per_day: BTreeMap<DayOfWeek, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorSchedule {
    pub doctor_id: String,
    pub entries: Vec<WeeklyScheduleEntry>,
    pub slot_duration_minutes: u32,
}

// Request payloads

#[derive(Debug, Clone, Deserialize)]
pub struct ReplaceScheduleRequest {
    pub entries: Vec<WeeklyScheduleEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictCheckRequest {
    pub time: ClockTime,
    pub day_of_week: DayOfWeek,
    pub slot_duration_minutes: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("Invalid time '{0}', expected HH:MM")]
    InvalidTime(String),

    #[error("Invalid day of week '{0}'")]
    InvalidDayOfWeek(String),

    #[error("Start time {start} must be before end time {end} on {day}")]
    InvalidTimeRange {
        day: DayOfWeek,
        start: ClockTime,
        end: ClockTime,
    },

    #[error("Slot duration must be between 1 and {max} minutes, got {got}")]
    InvalidSlotDuration { got: u32, max: u32 },

    #[error("More than one schedule entry for {0}")]
    DuplicateDay(DayOfWeek),

    #[error("Horizon must be between 1 and {max} days, got {got}")]
    InvalidHorizon { got: u32, max: u32 },
}

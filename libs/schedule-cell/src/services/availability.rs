//! Availability calculations over a doctor's recurring weekly schedule.
//!
//! Everything here is a pure function of its arguments. Reading "today" goes
//! through an injected [`Clock`] so callers and tests decide what the current
//! date is.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate};
use mockable::Clock;

use crate::models::{
    AvailableDay, ClockTime, ConflictCheckResult, ConflictReason, DayOfWeek, ScheduleError,
    Slot, WeeklyScheduleEntry, WorkStats, MINUTES_PER_DAY,
};

pub const DISPLAY_DATE_FORMAT: &str = "%d/%m/%Y";
pub const MAX_HORIZON_DAYS: u32 = 366;

/// Entries of `schedules` that apply to `day`, in input order.
pub fn entries_for_day(
    schedules: &[WeeklyScheduleEntry],
    day: DayOfWeek,
) -> Vec<WeeklyScheduleEntry> {
    schedules
        .iter()
        .filter(|entry| entry.day_of_week == day)
        .cloned()
        .collect()
}

/// Decide whether a slot of `slot_duration_minutes` starting at `time` fits
/// inside the doctor's working hours on `day`.
///
/// The slot may start exactly at opening and end exactly at closing. When
/// several entries exist for the day, fitting inside any one of them is
/// enough.
pub fn check_schedule_conflict(
    time: ClockTime,
    day: DayOfWeek,
    schedules: &[WeeklyScheduleEntry],
    slot_duration_minutes: u32,
) -> ConflictCheckResult {
    let day_entries = entries_for_day(schedules, day);

    if day_entries.is_empty() {
        return ConflictCheckResult {
            available: false,
            message: format!("Doctor does not work on {}", day),
            reason: Some(ConflictReason::NoSchedule),
        };
    }

    let slot_start = u32::from(time.minutes());
    // An end past u32::MAX cannot fit in any working day
    let slot_end = slot_start.checked_add(slot_duration_minutes);

    let fits = slot_duration_minutes > 0
        && slot_end.is_some_and(|slot_end| {
            day_entries.iter().any(|entry| {
                slot_start >= u32::from(entry.start_time.minutes())
                    && slot_end <= u32::from(entry.end_time.minutes())
            })
        });

    if fits {
        return ConflictCheckResult {
            available: true,
            message: format!("{} on {} is available", time, day),
            reason: None,
        };
    }

    let hours = day_entries
        .iter()
        .map(|entry| format!("{} - {}", entry.start_time, entry.end_time))
        .collect::<Vec<_>>()
        .join(", ");

    ConflictCheckResult {
        available: false,
        message: format!("Selected time is outside working hours ({})", hours),
        reason: Some(ConflictReason::OutsideHours),
    }
}

/// Enumerate bookable start times for one day's entries.
///
/// Each entry is expanded on its own and the results are concatenated in
/// input order; nothing is sorted or de-duplicated. A zero duration yields
/// no slots.
pub fn generate_available_slots(
    day_schedules: &[WeeklyScheduleEntry],
    slot_duration_minutes: u32,
) -> Vec<Slot> {
    if slot_duration_minutes == 0 {
        return Vec::new();
    }

    let mut slots = Vec::new();

    for entry in day_schedules {
        let end = u32::from(entry.end_time.minutes());
        let mut current = u32::from(entry.start_time.minutes());

        while let Some(slot_end) = current.checked_add(slot_duration_minutes) {
            if slot_end > end {
                break;
            }
            // current < end <= MINUTES_PER_DAY here, so the conversion holds
            if let Ok(time) = ClockTime::from_minutes(current as u16) {
                slots.push(Slot { time, available: true });
            }
            current = slot_end;
        }
    }

    slots
}

/// Walk `horizon_days` calendar days forward from `today` (inclusive) and
/// keep the ones whose weekday has a schedule entry.
pub fn available_days_from(
    today: NaiveDate,
    schedules: &[WeeklyScheduleEntry],
    horizon_days: u32,
) -> Vec<AvailableDay> {
    let working_days: BTreeSet<DayOfWeek> =
        schedules.iter().map(|entry| entry.day_of_week).collect();

    today
        .iter_days()
        .take(horizon_days as usize)
        .enumerate()
        .filter_map(|(index, date)| {
            let day_of_week = DayOfWeek::from(date.weekday());
            working_days.contains(&day_of_week).then(|| AvailableDay {
                date,
                day_of_week,
                is_today: index == 0,
                display: date.format(DISPLAY_DATE_FORMAT).to_string(),
            })
        })
        .collect()
}

/// [`available_days_from`] anchored at the clock's local date.
pub fn get_available_days(
    clock: &dyn Clock,
    schedules: &[WeeklyScheduleEntry],
    horizon_days: u32,
) -> Vec<AvailableDay> {
    available_days_from(clock.local().date_naive(), schedules, horizon_days)
}

pub fn calculate_work_stats(schedules: &[WeeklyScheduleEntry]) -> WorkStats {
    let mut hours_per_day: BTreeMap<DayOfWeek, f64> = BTreeMap::new();
    let mut total_hours_per_week = 0.0;

    for entry in schedules {
        let hours = f64::from(entry.duration_minutes()) / 60.0;
        *hours_per_day.entry(entry.day_of_week).or_insert(0.0) += hours;
        total_hours_per_week += hours;
    }

    let days_per_week = hours_per_day.len() as u32;
    let average_hours_per_day = if days_per_week == 0 {
        0.0
    } else {
        total_hours_per_week / f64::from(days_per_week)
    };

    WorkStats {
        total_hours_per_week,
        days_per_week,
        average_hours_per_day,
        hours_per_day,
    }
}

/// Boundary check for schedules coming from clients: every entry must have
/// `start < end` and each weekday may appear at most once.
pub fn validate_schedule(entries: &[WeeklyScheduleEntry]) -> Result<(), ScheduleError> {
    let mut seen = BTreeSet::new();

    for entry in entries {
        if entry.start_time >= entry.end_time {
            return Err(ScheduleError::InvalidTimeRange {
                day: entry.day_of_week,
                start: entry.start_time,
                end: entry.end_time,
            });
        }
        if !seen.insert(entry.day_of_week) {
            return Err(ScheduleError::DuplicateDay(entry.day_of_week));
        }
    }

    Ok(())
}

pub fn validate_slot_duration(minutes: u32) -> Result<u32, ScheduleError> {
    let max = u32::from(MINUTES_PER_DAY);
    if minutes == 0 || minutes > max {
        return Err(ScheduleError::InvalidSlotDuration { got: minutes, max });
    }
    Ok(minutes)
}

pub fn validate_horizon_days(days: u32) -> Result<u32, ScheduleError> {
    if days == 0 || days > MAX_HORIZON_DAYS {
        return Err(ScheduleError::InvalidHorizon { got: days, max: MAX_HORIZON_DAYS });
    }
    Ok(days)
}

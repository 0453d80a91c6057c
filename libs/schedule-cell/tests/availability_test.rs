// libs/schedule-cell/tests/availability_test.rs

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use mockable::Clock;
use regex::Regex;

use schedule_cell::models::{ClockTime, ConflictReason, DayOfWeek, WeeklyScheduleEntry};
use schedule_cell::services::availability::{
    available_days_from, calculate_work_stats, check_schedule_conflict,
    generate_available_slots, get_available_days,
};

struct FixedClock {
    today: NaiveDate,
}

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        let noon = self.today.and_hms_opt(12, 0, 0).expect("valid time");
        Local
            .from_local_datetime(&noon)
            .earliest()
            .expect("noon exists in every timezone")
    }

    fn utc(&self) -> DateTime<Utc> {
        self.local().with_timezone(&Utc)
    }
}

fn t(raw: &str) -> ClockTime {
    raw.parse().expect("valid clock time")
}

fn entry(day: DayOfWeek, start: &str, end: &str) -> WeeklyScheduleEntry {
    WeeklyScheduleEntry::new(day, t(start), t(end))
}

fn monday_schedule() -> Vec<WeeklyScheduleEntry> {
    vec![entry(DayOfWeek::Monday, "08:00", "17:00")]
}

fn four_day_schedule() -> Vec<WeeklyScheduleEntry> {
    vec![
        entry(DayOfWeek::Monday, "08:00", "17:00"),
        entry(DayOfWeek::Tuesday, "08:00", "17:00"),
        entry(DayOfWeek::Wednesday, "08:00", "17:00"),
        entry(DayOfWeek::Thursday, "08:00", "17:00"),
    ]
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

#[test]
fn test_thirty_minute_slots_cover_full_day() {
    let slots = generate_available_slots(&monday_schedule(), 30);

    assert_eq!(slots.len(), 18);
    assert_eq!(slots.first().unwrap().time.to_string(), "08:00");
    assert_eq!(slots.last().unwrap().time.to_string(), "16:30");
    assert!(slots.iter().all(|slot| slot.available));
}

#[test]
fn test_hourly_slots() {
    let times: Vec<String> = generate_available_slots(&monday_schedule(), 60)
        .iter()
        .map(|slot| slot.time.to_string())
        .collect();

    assert_eq!(
        times,
        vec!["08:00", "09:00", "10:00", "11:00", "12:00", "13:00", "14:00", "15:00", "16:00"]
    );
}

#[test]
fn test_empty_day_has_no_slots() {
    assert!(generate_available_slots(&[], 30).is_empty());
}

#[test]
fn test_slots_serialize_as_time_objects() {
    let slots = generate_available_slots(&monday_schedule(), 60);
    let json = serde_json::to_value(&slots[0]).unwrap();
    assert_eq!(json, serde_json::json!({ "time": "08:00", "available": true }));
}

#[test]
fn test_conflict_check_boundaries() {
    let schedule = monday_schedule();

    let opening = check_schedule_conflict(t("08:00"), DayOfWeek::Monday, &schedule, 30);
    assert!(opening.available);
    assert_eq!(opening.reason, None);

    let closing = check_schedule_conflict(t("16:30"), DayOfWeek::Monday, &schedule, 30);
    assert!(closing.available);

    let overrun = check_schedule_conflict(t("16:45"), DayOfWeek::Monday, &schedule, 30);
    assert!(!overrun.available);
    assert_eq!(overrun.reason, Some(ConflictReason::OutsideHours));

    let early = check_schedule_conflict(t("07:45"), DayOfWeek::Monday, &schedule, 30);
    assert!(!early.available);
    assert_eq!(early.reason, Some(ConflictReason::OutsideHours));
}

#[test]
fn test_conflict_check_without_schedule_for_day() {
    let result = check_schedule_conflict(t("09:00"), DayOfWeek::Saturday, &monday_schedule(), 30);

    assert!(!result.available);
    assert_eq!(result.reason, Some(ConflictReason::NoSchedule));
    assert!(result.message.contains("SATURDAY"));

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["reason"], "NO_SCHEDULE");
}

#[test]
fn test_work_stats_for_four_day_week() {
    let stats = calculate_work_stats(&four_day_schedule());

    assert_eq!(stats.total_hours_per_week, 36.0);
    assert_eq!(stats.days_per_week, 4);
    assert_eq!(stats.average_hours_per_day, 9.0);
    assert_eq!(stats.hours_per_day.get(&DayOfWeek::Monday), Some(&9.0));
    assert_eq!(stats.hours_per_day.get(&DayOfWeek::Friday), None);

    let json = serde_json::to_value(&stats).unwrap();
    assert_eq!(json["totalHoursPerWeek"], 36.0);
    assert_eq!(json["hoursPerDay"]["THURSDAY"], 9.0);
    assert!(json["hoursPerDay"].get("FRIDAY").is_none());
}

#[test]
fn test_work_stats_for_empty_schedule() {
    let stats = calculate_work_stats(&[]);

    assert_eq!(stats.total_hours_per_week, 0.0);
    assert_eq!(stats.days_per_week, 0);
    assert_eq!(stats.average_hours_per_day, 0.0);
    assert!(stats.hours_per_day.is_empty());
}

#[test]
fn test_operations_are_idempotent() {
    let schedule = four_day_schedule();
    let today = date(2026, 10, 19);

    assert_eq!(generate_available_slots(&schedule, 45), generate_available_slots(&schedule, 45));
    assert_eq!(
        check_schedule_conflict(t("10:15"), DayOfWeek::Tuesday, &schedule, 30),
        check_schedule_conflict(t("10:15"), DayOfWeek::Tuesday, &schedule, 30)
    );
    assert_eq!(calculate_work_stats(&schedule), calculate_work_stats(&schedule));
    assert_eq!(
        available_days_from(today, &schedule, 14),
        available_days_from(today, &schedule, 14)
    );
}

#[test]
fn test_available_days_starting_on_working_day() {
    let clock = FixedClock { today: date(2026, 10, 19) }; // Monday
    let days = get_available_days(&clock, &four_day_schedule(), 7);

    assert_eq!(days.len(), 4);
    assert!(days[0].is_today);
    assert!(days[1..].iter().all(|day| !day.is_today));
    assert_eq!(days[0].display, "19/10/2026");
    assert_eq!(days[3].date, date(2026, 10, 22));
    assert_eq!(days[3].day_of_week, DayOfWeek::Thursday);
}

#[test]
fn test_available_days_skip_non_working_days() {
    let clock = FixedClock { today: date(2026, 10, 17) }; // Saturday
    let schedule = four_day_schedule();
    let days = get_available_days(&clock, &schedule, 7);
    let display_format = Regex::new(r"^\d{2}/\d{2}/\d{4}$").unwrap();

    assert_eq!(days.len(), 4);
    assert!(days.iter().all(|day| !day.is_today));
    for day in &days {
        assert!(schedule.iter().any(|entry| entry.day_of_week == day.day_of_week));
        assert!(display_format.is_match(&day.display), "{}", day.display);
    }
}

#[test]
fn test_available_days_respects_horizon() {
    let today = date(2026, 10, 19);

    assert!(available_days_from(today, &four_day_schedule(), 0).is_empty());
    assert_eq!(available_days_from(today, &four_day_schedule(), 1).len(), 1);
    assert_eq!(available_days_from(today, &four_day_schedule(), 28).len(), 16);
    assert!(available_days_from(today, &[], 28).is_empty());
}

use anyhow::{Result, anyhow};
use chrono::{Datelike, NaiveDate};
use reqwest::Method;
use tracing::{debug, error, info, warn};

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{DayOfWeek, ScheduleRow, Slot, WeeklyScheduleEntry};
use crate::services::availability::{entries_for_day, generate_available_slots, validate_schedule};

const SCHEDULE_TABLE: &str = "/rest/v1/doctor_schedules";

/// PostgREST filter selecting one doctor's rows; the id is percent-encoded so
/// it cannot smuggle extra filters into the query string.
fn doctor_filter(doctor_id: &str) -> String {
    format!("{}?doctor_id=eq.{}", SCHEDULE_TABLE, urlencoding::encode(doctor_id))
}

/// Loads and stores a doctor's weekly schedule and feeds it to the calculator.
pub struct ScheduleService {
    supabase: SupabaseClient,
}

impl ScheduleService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Weekly entries for a doctor, ordered by weekday then start time.
    pub async fn get_weekly_schedule(
        &self,
        doctor_id: &str,
        auth_token: Option<&str>,
    ) -> Result<Vec<WeeklyScheduleEntry>> {
        debug!("Fetching weekly schedule for doctor: {}", doctor_id);

        let path = doctor_filter(doctor_id);
        let rows: Vec<ScheduleRow> = self.supabase.request(
            Method::GET,
            &path,
            auth_token,
            None,
        ).await?;

        let mut entries: Vec<WeeklyScheduleEntry> = rows.into_iter().map(Into::into).collect();
        entries.sort_by_key(|entry| (entry.day_of_week, entry.start_time));

        debug!("Doctor {} has {} schedule entries", doctor_id, entries.len());
        Ok(entries)
    }

    /// Replace every entry of a doctor's weekly schedule.
    ///
    /// Rejects invalid schedules with a [`crate::models::ScheduleError`] before
    /// touching storage. If the insert fails after the old rows were deleted,
    /// the old rows are written back and the insert error is returned.
    pub async fn replace_weekly_schedule(
        &self,
        doctor_id: &str,
        entries: Vec<WeeklyScheduleEntry>,
        auth_token: &str,
    ) -> Result<Vec<WeeklyScheduleEntry>> {
        validate_schedule(&entries)?;

        let removed: Vec<ScheduleRow> = self.supabase.request_with_headers(
            Method::DELETE,
            &doctor_filter(doctor_id),
            Some(auth_token),
            None,
            Some(SupabaseClient::return_representation()),
        ).await?;
        debug!("Removed {} schedule rows for doctor {}", removed.len(), doctor_id);

        if entries.is_empty() {
            info!("Cleared weekly schedule for doctor {}", doctor_id);
            return Ok(entries);
        }

        let rows: Vec<ScheduleRow> = entries
            .iter()
            .map(|entry| ScheduleRow::from_entry(doctor_id, entry))
            .collect();

        let inserted = match self.insert_rows(&rows, auth_token).await {
            Ok(inserted) => inserted,
            Err(e) => {
                warn!("Inserting schedule for doctor {} failed, restoring previous rows: {}", doctor_id, e);
                self.restore_rows(doctor_id, &removed, auth_token).await;
                return Err(e);
            }
        };

        if inserted.len() != rows.len() {
            return Err(anyhow!(
                "Expected {} schedule rows to be stored, got {}",
                rows.len(),
                inserted.len()
            ));
        }

        info!("Stored {} schedule entries for doctor {}", inserted.len(), doctor_id);

        let mut stored: Vec<WeeklyScheduleEntry> = inserted.into_iter().map(Into::into).collect();
        stored.sort_by_key(|entry| (entry.day_of_week, entry.start_time));
        Ok(stored)
    }

    async fn insert_rows(&self, rows: &[ScheduleRow], auth_token: &str) -> Result<Vec<ScheduleRow>> {
        self.supabase.request_with_headers(
            Method::POST,
            SCHEDULE_TABLE,
            Some(auth_token),
            Some(serde_json::to_value(rows)?),
            Some(SupabaseClient::return_representation()),
        ).await
    }

    async fn restore_rows(&self, doctor_id: &str, removed: &[ScheduleRow], auth_token: &str) {
        if removed.is_empty() {
            return;
        }

        // Re-insert only the columns we own; ids and timestamps are regenerated
        let previous: Vec<ScheduleRow> = removed
            .iter()
            .map(|row| ScheduleRow::from_entry(doctor_id, &row.clone().into()))
            .collect();

        match self.insert_rows(&previous, auth_token).await {
            Ok(restored) => info!("Restored {} schedule rows for doctor {}", restored.len(), doctor_id),
            Err(e) => error!("Failed to restore schedule for doctor {}: {}", doctor_id, e),
        }
    }

    /// Bookable start times on `date`, derived from the entries for its weekday.
    pub async fn get_available_slots(
        &self,
        doctor_id: &str,
        date: NaiveDate,
        slot_duration_minutes: u32,
        auth_token: Option<&str>,
    ) -> Result<Vec<Slot>> {
        let day = DayOfWeek::from(date.weekday());
        debug!("Calculating {}-minute slots for doctor {} on {} ({})",
               slot_duration_minutes, doctor_id, date, day);

        let schedules = self.get_weekly_schedule(doctor_id, auth_token).await?;
        let slots = generate_available_slots(&entries_for_day(&schedules, day), slot_duration_minutes);

        debug!("Found {} available slots", slots.len());
        Ok(slots)
    }
}

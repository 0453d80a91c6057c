use std::sync::Arc;

use axum::{
    extract::{Path, Query, State, Extension},
    Json,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{info, warn};

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{
    AvailableDay, ConflictCheckRequest, ConflictCheckResult, DoctorSchedule,
    ReplaceScheduleRequest, ScheduleError, Slot, WorkStats,
};
use crate::services::availability::{
    calculate_work_stats, check_schedule_conflict, get_available_days,
    validate_horizon_days, validate_slot_duration,
};
use crate::services::schedule::ScheduleService;
use crate::SharedClock;

impl From<ScheduleError> for AppError {
    fn from(err: ScheduleError) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

fn upstream_error(err: anyhow::Error) -> AppError {
    AppError::ExternalService(err.to_string())
}

/// Validation failures raised by the service keep their 400; anything else
/// came from storage.
fn replace_error(err: anyhow::Error) -> AppError {
    match err.downcast::<ScheduleError>() {
        Ok(invalid) => invalid.into(),
        Err(err) => upstream_error(err),
    }
}

#[derive(Debug, Deserialize)]
pub struct AvailableSlotsQuery {
    pub date: NaiveDate,
    pub slot_duration: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct AvailableDaysQuery {
    pub horizon_days: Option<u32>,
}

// ==============================================================================
// PUBLIC HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_schedule(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<String>,
) -> Result<Json<DoctorSchedule>, AppError> {
    let schedule_service = ScheduleService::new(&state);

    let entries = schedule_service.get_weekly_schedule(&doctor_id, None).await
        .map_err(upstream_error)?;

    Ok(Json(DoctorSchedule {
        doctor_id,
        entries,
        slot_duration_minutes: state.default_slot_duration_minutes,
    }))
}

#[axum::debug_handler]
pub async fn get_available_slots(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<String>,
    Query(query): Query<AvailableSlotsQuery>,
) -> Result<Json<Vec<Slot>>, AppError> {
    let duration = validate_slot_duration(
        query.slot_duration.unwrap_or(state.default_slot_duration_minutes),
    )?;

    let schedule_service = ScheduleService::new(&state);

    let slots = schedule_service.get_available_slots(&doctor_id, query.date, duration, None).await
        .map_err(upstream_error)?;

    Ok(Json(slots))
}

#[axum::debug_handler]
pub async fn check_conflict(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<String>,
    Json(request): Json<ConflictCheckRequest>,
) -> Result<Json<ConflictCheckResult>, AppError> {
    let duration = validate_slot_duration(
        request.slot_duration_minutes.unwrap_or(state.default_slot_duration_minutes),
    )?;

    let schedule_service = ScheduleService::new(&state);
    let schedules = schedule_service.get_weekly_schedule(&doctor_id, None).await
        .map_err(upstream_error)?;

    Ok(Json(check_schedule_conflict(request.time, request.day_of_week, &schedules, duration)))
}

#[axum::debug_handler]
pub async fn get_doctor_available_days(
    State(state): State<Arc<AppConfig>>,
    Extension(clock): Extension<SharedClock>,
    Path(doctor_id): Path<String>,
    Query(query): Query<AvailableDaysQuery>,
) -> Result<Json<Vec<AvailableDay>>, AppError> {
    let horizon = validate_horizon_days(
        query.horizon_days.unwrap_or(state.availability_horizon_days),
    )?;

    let schedule_service = ScheduleService::new(&state);
    let schedules = schedule_service.get_weekly_schedule(&doctor_id, None).await
        .map_err(upstream_error)?;

    Ok(Json(get_available_days(clock.as_ref(), &schedules, horizon)))
}

#[axum::debug_handler]
pub async fn get_work_stats(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<String>,
) -> Result<Json<WorkStats>, AppError> {
    let schedule_service = ScheduleService::new(&state);
    let schedules = schedule_service.get_weekly_schedule(&doctor_id, None).await
        .map_err(upstream_error)?;

    Ok(Json(calculate_work_stats(&schedules)))
}

// ==============================================================================
// PROTECTED HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn replace_schedule(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(doctor_id): Path<String>,
    Json(request): Json<ReplaceScheduleRequest>,
) -> Result<Json<DoctorSchedule>, AppError> {
    let is_owner = user.has_role("doctor") && user.id == doctor_id;
    if !is_owner && !user.is_admin() {
        warn!("User {} attempted to edit schedule of doctor {}", user.id, doctor_id);
        return Err(AppError::Forbidden(
            "Only the doctor or an administrator can change this schedule".to_string(),
        ));
    }

    let schedule_service = ScheduleService::new(&state);
    let entries = schedule_service
        .replace_weekly_schedule(&doctor_id, request.entries, auth.token()).await
        .map_err(replace_error)?;

    info!("User {} replaced weekly schedule of doctor {}", user.id, doctor_id);
    Ok(Json(DoctorSchedule {
        doctor_id,
        entries,
        slot_duration_minutes: state.default_slot_duration_minutes,
    }))
}

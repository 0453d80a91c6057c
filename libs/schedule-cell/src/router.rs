use std::sync::Arc;

use axum::{
    Extension,
    Router,
    routing::{get, post, put},
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::SharedClock;

pub fn schedule_routes(state: Arc<AppConfig>, clock: SharedClock) -> Router {
    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/{doctor_id}/schedule", get(handlers::get_schedule))
        .route("/{doctor_id}/available-slots", get(handlers::get_available_slots))
        .route("/{doctor_id}/available-days", get(handlers::get_doctor_available_days))
        .route("/{doctor_id}/conflict-check", post(handlers::check_conflict))
        .route("/{doctor_id}/work-stats", get(handlers::get_work_stats));

    // Protected routes (authentication required)
    let protected_routes = Router::new()
        .route("/{doctor_id}/schedule", put(handlers::replace_schedule))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(Extension(clock))
        .with_state(state)
}

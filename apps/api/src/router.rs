use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use schedule_cell::router::schedule_routes;
use schedule_cell::SharedClock;
use shared_config::AppConfig;

pub fn create_router(state: Arc<AppConfig>, clock: SharedClock) -> Router {
    Router::new()
        .route("/", get(|| async { "Clinic Scheduling API is running!" }))
        .nest("/doctors", schedule_routes(state, clock))
}

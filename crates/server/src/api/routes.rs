use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{fhir, handlers};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // FHIR surface
        .route("/fhir/Bundle", post(fhir::submit_bundle))
        .route("/fhir/Task", get(fhir::list_tasks))
        .route("/fhir/Task/{id}", get(fhir::get_task))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::cases::handlers as cases;
use crate::session::handlers as sessions;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/debug/status", get(health::debug_status_handler))
        // Catalog
        .route("/api/v1/cases", get(cases::handle_list_cases))
        .route("/api/v1/levels", get(cases::handle_list_levels))
        // Wizard
        .route("/api/v1/sessions", post(sessions::handle_create_session))
        .route(
            "/api/v1/sessions/:id",
            get(sessions::handle_get_session).delete(sessions::handle_delete_session),
        )
        .route(
            "/api/v1/sessions/:id/transcript",
            post(sessions::handle_upload_transcript),
        )
        .route("/api/v1/sessions/:id/case", post(sessions::handle_select_case))
        .route("/api/v1/sessions/:id/evaluate", post(sessions::handle_evaluate))
        .route("/api/v1/sessions/:id/back", post(sessions::handle_go_back))
        .route("/api/v1/sessions/:id/reset", post(sessions::handle_reset))
        .route("/api/v1/sessions/:id/export", get(sessions::handle_export))
        .with_state(state)
}

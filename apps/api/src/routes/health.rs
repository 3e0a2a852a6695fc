use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns a simple status object with service version.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "interview-analyzer"
    }))
}

/// GET /api/v1/debug/status
/// Active feature flags, model, catalog size and live sessions.
pub async fn debug_status_handler(State(state): State<AppState>) -> Json<Value> {
    let flags = state.config.flags;
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_seconds": state.started_at.elapsed().as_secs(),
        "model": state.config.openai_model,
        "feature_flags": {
            "generative_expert_solution": flags.generative_expert_solution,
            "log_level": flags.log_level,
            "wizard_variant": flags.wizard_variant,
        },
        "expert_solution_backend": state.expert_provider.backend_name(),
        "retry": {
            "max_attempts": state.gateway.policy().max_attempts,
        },
        "cases_loaded": state.catalog.len(),
        "active_sessions": state.sessions.len().await,
    }))
}

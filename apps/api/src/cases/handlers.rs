use axum::{extract::State, Json};
use serde::Serialize;

use crate::evaluation::models::ProficiencyLevel;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CaseSummary {
    pub key: String,
    pub name: String,
    pub objective: String,
    pub expert_steps: usize,
}

#[derive(Debug, Serialize)]
pub struct LevelSummary {
    pub level: ProficiencyLevel,
    pub expectations: &'static str,
}

/// GET /api/v1/cases
pub async fn handle_list_cases(State(state): State<AppState>) -> Json<Vec<CaseSummary>> {
    let cases = state
        .catalog
        .iter()
        .map(|case| CaseSummary {
            key: case.key.clone(),
            name: case.name.clone(),
            objective: case.objective.clone(),
            expert_steps: case
                .process_answer
                .len()
                .min(case.key_considerations_answer.len()),
        })
        .collect();
    Json(cases)
}

/// GET /api/v1/levels
pub async fn handle_list_levels() -> Json<Vec<LevelSummary>> {
    Json(
        ProficiencyLevel::ALL
            .into_iter()
            .map(|level| LevelSummary {
                level,
                expectations: level.expectations(),
            })
            .collect(),
    )
}

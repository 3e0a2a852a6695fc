//! Axum route handlers for the wizard.
//!
//! Every step locks its session for the whole operation and answers with the
//! new snapshot plus the notices collected along the way. A failed step
//! answers with the error and those same notices.

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{AppError, StepError};
use crate::evaluation::models::ProficiencyLevel;
use crate::notices::{Notice, Notifier};
use crate::session::controller::{self, RubricChoice};
use crate::session::{Session, SessionSnapshot, WizardStage};
use crate::state::AppState;
use crate::transcript::RawUpload;

const EXPORT_FILENAME: &str = "interview_evaluation.csv";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct StepResponse {
    pub session: SessionSnapshot,
    pub notices: Vec<Notice>,
}

#[derive(Debug, Deserialize)]
pub struct SelectCaseRequest {
    pub case_key: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct EvaluateRequest {
    #[serde(default)]
    pub level: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BackRequest {
    pub stage: WizardStage,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<SessionSnapshot>) {
    let session = state
        .sessions
        .create(state.config.flags.wizard_variant)
        .await;
    let snapshot = session.lock().await.snapshot();
    tracing::info!("Created {} session {}", snapshot.variant, snapshot.id);
    (StatusCode::CREATED, Json(snapshot))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let session = find_session(&state, id).await?;
    let snapshot = session.lock().await.snapshot();
    Ok(Json(snapshot))
}

/// DELETE /api/v1/sessions/:id
pub async fn handle_delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.sessions.remove(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(session_not_found(id))
    }
}

/// POST /api/v1/sessions/:id/transcript
///
/// Multipart fields: `transcript` (file, required), `case_study` and `level`
/// (text, two-step wizard only).
pub async fn handle_upload_transcript(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<StepResponse>, StepError> {
    let mut upload = None;
    let mut rubric = RubricChoice::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "transcript" => {
                let filename = field.file_name().unwrap_or("transcript.txt").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?;
                upload = Some(RawUpload { filename, bytes });
            }
            "case_study" => rubric.case_study = non_empty(read_text(field).await?),
            "level" => {
                rubric.level = non_empty(read_text(field).await?)
                    .map(|raw| parse_level(&raw))
                    .transpose()?;
            }
            _ => {}
        }
    }

    let upload = upload
        .ok_or_else(|| AppError::Validation("Missing 'transcript' file field".to_string()))?;

    let session = find_session(&state, id).await?;
    let mut session = session.lock().await;
    let notifier = state.notifier();

    controller::process_upload(&mut session, upload, rubric, &state.flow(&notifier))
        .await
        .map_err(|e| StepError::new(e, notifier.drain()))?;

    Ok(step_response(&session, &notifier))
}

/// POST /api/v1/sessions/:id/case
pub async fn handle_select_case(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SelectCaseRequest>,
) -> Result<Json<StepResponse>, StepError> {
    let session = find_session(&state, id).await?;
    let mut session = session.lock().await;
    let notifier = state.notifier();

    controller::select_case(&mut session, request.case_key.trim(), &state.flow(&notifier))
        .await
        .map_err(|e| StepError::new(e, notifier.drain()))?;

    Ok(step_response(&session, &notifier))
}

/// POST /api/v1/sessions/:id/evaluate
pub async fn handle_evaluate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<EvaluateRequest>,
) -> Result<Json<StepResponse>, StepError> {
    let level = request
        .level
        .and_then(non_empty)
        .map(|raw| parse_level(&raw))
        .transpose()?;

    let session = find_session(&state, id).await?;
    let mut session = session.lock().await;
    let notifier = state.notifier();

    controller::evaluate(&mut session, level, &state.flow(&notifier))
        .await
        .map_err(|e| StepError::new(e, notifier.drain()))?;

    Ok(step_response(&session, &notifier))
}

/// POST /api/v1/sessions/:id/back
pub async fn handle_go_back(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<BackRequest>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let session = find_session(&state, id).await?;
    let mut session = session.lock().await;
    session.go_back(request.stage)?;
    Ok(Json(session.snapshot()))
}

/// POST /api/v1/sessions/:id/reset
pub async fn handle_reset(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let session = find_session(&state, id).await?;
    let mut session = session.lock().await;
    session.reset();
    tracing::info!("Session {id} reset");
    Ok(Json(session.snapshot()))
}

/// GET /api/v1/sessions/:id/export
///
/// CSV download of the evaluation table.
pub async fn handle_export(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let session = find_session(&state, id).await?;
    let session = session.lock().await;
    let csv = session
        .evaluation()?
        .to_csv()
        .map_err(|e| AppError::Internal(e.into()))?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{EXPORT_FILENAME}\""),
            ),
        ],
        csv,
    ))
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

fn step_response(session: &Session, notifier: &Notifier) -> Json<StepResponse> {
    tracing::info!("Session {} is at stage {}", session.id(), session.stage());
    Json(StepResponse {
        session: session.snapshot(),
        notices: notifier.drain(),
    })
}

async fn find_session(
    state: &AppState,
    id: Uuid,
) -> Result<std::sync::Arc<tokio::sync::Mutex<Session>>, AppError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| session_not_found(id))
}

fn session_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Session {id} not found"))
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read form field: {e}")))
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn parse_level(raw: &str) -> Result<ProficiencyLevel, AppError> {
    raw.parse().map_err(AppError::Validation)
}

//! Route handlers for session lifecycle and context documents.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::session::models::SessionSnapshot;
use crate::session::transcript::ContextField;
use crate::state::AppState;

const DEFAULT_ROLE: &str = "software engineering interviewer";

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub role: Option<String>,
    pub system_prompt: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub id: Uuid,
    pub system_prompt: String,
}

#[derive(Debug, Deserialize)]
pub struct ContextRequest {
    pub resume: Option<String>,
    pub job_description: Option<String>,
    pub company_info: Option<String>,
}

/// POST /session
pub async fn handle_create_session(
    State(state): State<AppState>,
    body: Result<Json<CreateSessionRequest>, JsonRejection>,
) -> Result<Json<CreateSessionResponse>, AppError> {
    let Json(req) = body.map_err(|e| AppError::Validation(e.body_text()))?;

    let role = req.role.unwrap_or_else(|| DEFAULT_ROLE.to_string());
    let system_prompt = req
        .system_prompt
        .unwrap_or_else(|| default_system_prompt(&role));

    let id = state
        .sessions
        .create(role, system_prompt.clone(), state.config.interview_questions)
        .await;

    info!("created session {id}");

    Ok(Json(CreateSessionResponse { id, system_prompt }))
}

/// GET /session/{id}
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let handle = state.sessions.get(&id).await?;
    let snapshot = handle.lock().await.snapshot();
    Ok(Json(snapshot))
}

/// POST /session/{id}/context
pub async fn handle_set_context(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<ContextRequest>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let Json(req) = body.map_err(|e| AppError::Validation(e.body_text()))?;

    if req.resume.is_none() && req.job_description.is_none() && req.company_info.is_none() {
        return Err(AppError::Validation(
            "provide at least one of resume, job_description, company_info".to_string(),
        ));
    }

    let handle = state.sessions.get(&id).await?;
    let mut session = handle.lock().await;

    if let Some(resume) = req.resume {
        session.transcript.set_context(ContextField::Resume, resume)?;
    }
    if let Some(job_description) = req.job_description {
        session
            .transcript
            .set_context(ContextField::JobDescription, job_description)?;
    }
    if let Some(company_info) = req.company_info {
        session
            .transcript
            .set_context(ContextField::CompanyInfo, company_info)?;
    }

    Ok(StatusCode::NO_CONTENT)
}

/// The interviewer persona used when the client does not supply one.
fn default_system_prompt(role: &str) -> String {
    format!(
        "You are a helpful {role} for job interview practice. Ask clear interview \
        questions, follow up when answers are incomplete, and keep your feedback \
        actionable: strengths, areas to improve, and a stronger sample answer. \
        Stay concise and encouraging."
    )
}

//! Route handlers for the interview lifecycle: calibration, start, answers,
//! summary, and per-question feedback.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Multipart, Path, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::interview::calibration::InterviewConfig;
use crate::interview::orchestrator::{
    self, AudioUpload, FeedbackReply, IncomingMessage, SummaryReply, TurnReply,
};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub content: String,
}

/// POST /session/{id}/interview-config
///
/// Body is the ordered `[focus, style, difficulty]` triple of 1-based levels.
pub async fn handle_interview_config(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<[i64; 3]>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let Json(levels) = body.map_err(|e| AppError::Validation(e.body_text()))?;
    let config = InterviewConfig::from_indices(levels[0], levels[1], levels[2]);

    let handle = state.sessions.get(&id).await?;
    handle.lock().await.set_config(config)?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /session/{id}/start
pub async fn handle_start(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TurnReply>, AppError> {
    let turn = orchestrator::start_interview(&state.sessions, state.backend.as_ref(), &id).await?;
    Ok(Json(turn))
}

/// POST /session/{id}/message
///
/// Accepts either a JSON `{"content": ...}` body or a multipart form with a
/// `question_index` field and an optional `audio` file.
pub async fn handle_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    request: Request,
) -> Result<Json<TurnReply>, AppError> {
    let incoming = decode_message(request).await?;
    let turn =
        orchestrator::post_message(&state.sessions, state.backend.as_ref(), &id, incoming).await?;
    Ok(Json(turn))
}

/// GET /session/{id}/summary
pub async fn handle_summary(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SummaryReply>, AppError> {
    let summary =
        orchestrator::session_summary(&state.sessions, state.backend.as_ref(), &id).await?;
    Ok(Json(summary))
}

/// GET /session/{id}/feedback
pub async fn handle_feedback(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<FeedbackReply>, AppError> {
    let feedback =
        orchestrator::question_feedback(&state.sessions, state.backend.as_ref(), &id).await?;
    Ok(Json(feedback))
}

async fn decode_message(request: Request) -> Result<IncomingMessage, AppError> {
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if content_type.starts_with("multipart/form-data") {
        let multipart = Multipart::from_request(request, &())
            .await
            .map_err(|e| AppError::Validation(e.to_string()))?;
        decode_recorded_answer(multipart).await
    } else {
        let Json(body) = Json::<MessageRequest>::from_request(request, &())
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;
        Ok(IncomingMessage::Text {
            content: body.content,
        })
    }
}

async fn decode_recorded_answer(mut multipart: Multipart) -> Result<IncomingMessage, AppError> {
    let mut question_index: Option<u32> = None;
    let mut audio: Option<AudioUpload> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(e.to_string()))?
    {
        match field.name() {
            Some("question_index") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(e.to_string()))?;
                question_index = Some(text.trim().parse().map_err(|_| {
                    AppError::Validation("question_index must be an integer".to_string())
                })?);
            }
            Some("audio") => {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(e.to_string()))?;
                audio = Some(AudioUpload {
                    bytes: bytes.to_vec(),
                    content_type,
                });
            }
            _ => {}
        }
    }

    let question_index = question_index.ok_or_else(|| {
        AppError::Validation("multipart answers require a question_index field".to_string())
    })?;

    Ok(IncomingMessage::RecordedAnswer {
        question_index,
        audio,
    })
}

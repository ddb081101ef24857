//! Interview orchestration: the transactional core behind the interview
//! endpoints.
//!
//! Every operation follows the same shape: validate against the current
//! session state, compose the prompt, call upstream, and only then commit
//! transcript and sequencer changes. An upstream failure therefore leaves
//! the session exactly as it was and the same request can be retried.

use serde::Serialize;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::interview::prompts::{self, Phase};
use crate::interview::report::{self, FeedbackRecord, MatchReport};
use crate::interview::sequencer::Advance;
use crate::llm_client::{ChatBackend, ChatMessage, Role, UpstreamError};
use crate::session::manager::{Session, SessionManager};
use crate::session::models::{QaPair, SessionStatus};

/// Response body for the start and message endpoints. `reply` and `question`
/// are absent on the final answer, which closes the interview without an
/// upstream call, and `question` is also absent for general chat.
#[derive(Debug, Serialize)]
pub struct TurnReply {
    pub reply: Option<String>,
    pub question: Option<u32>,
    pub status: SessionStatus,
}

/// Response body for `GET /session/{id}/summary`.
#[derive(Debug, Serialize)]
pub struct SummaryReply {
    pub reply: String,
    pub pairs_summarized: usize,
    pub report: MatchReport,
}

/// Response body for `GET /session/{id}/feedback`.
#[derive(Debug, Serialize)]
pub struct FeedbackReply {
    pub items: Vec<QuestionFeedback>,
}

/// One parsed feedback record joined with the pair it reviews.
#[derive(Debug, Serialize)]
pub struct QuestionFeedback {
    pub question_index: u32,
    pub question: String,
    pub answer: String,
    pub feedback: String,
    pub suggested_answer: String,
}

/// A message posted to `POST /session/{id}/message`, already decoded from
/// whichever body shape the client used.
#[derive(Debug)]
pub enum IncomingMessage {
    /// JSON body: plain text from the client.
    Text { content: String },
    /// Multipart body: a recorded answer to one question, with optional audio.
    RecordedAnswer {
        question_index: u32,
        audio: Option<AudioUpload>,
    },
}

#[derive(Debug)]
pub struct AudioUpload {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Opens the interview: asks question 1, freezes the context documents, and
/// moves the sequencer to `InProgress(1)`.
pub async fn start_interview(
    sessions: &SessionManager,
    backend: &dyn ChatBackend,
    id: &str,
) -> Result<TurnReply, AppError> {
    let handle = sessions.get(id).await?;
    let mut session = handle.lock().await;

    session.sequencer.check_start()?;

    let prompt = prompts::compose(
        Phase::Opening,
        &session.transcript,
        &session.config_or_default(),
        &session.role,
        session.sequencer.total(),
    );
    let reply = backend.complete(&prompt.into_messages()).await?;

    let first_seq = session.transcript.append(Role::Assistant, reply.clone());
    session.record_interview_started(first_seq);
    session.sequencer.start()?;

    info!("session {}: interview started", session.id);

    Ok(TurnReply {
        reply: Some(reply),
        question: Some(1),
        status: session.status(),
    })
}

/// Routes a posted message. Text during an interview answers the current
/// question; text outside one is general chat. A recorded answer is only
/// valid during an interview and must target the current question.
pub async fn post_message(
    sessions: &SessionManager,
    backend: &dyn ChatBackend,
    id: &str,
    incoming: IncomingMessage,
) -> Result<TurnReply, AppError> {
    let handle = sessions.get(id).await?;
    let mut session = handle.lock().await;

    match incoming {
        IncomingMessage::Text { content } => {
            if session.sequencer.current_question().is_some() {
                record_answer(&mut session, backend, content).await
            } else {
                general_chat(&mut session, backend, content).await
            }
        }
        IncomingMessage::RecordedAnswer {
            question_index,
            audio,
        } => {
            let Some(current) = session.sequencer.current_question() else {
                return Err(AppError::InvalidState(
                    "no interview is in progress".to_string(),
                ));
            };
            if question_index != current {
                return Err(AppError::InvalidState(format!(
                    "answer targets question {question_index} but the interview is at question {current}"
                )));
            }

            // A failed transcription records an empty answer rather than
            // blocking the interview from finishing.
            let content = match audio {
                Some(upload) => {
                    match backend.transcribe(&upload.bytes, &upload.content_type).await {
                        Ok(text) => text,
                        Err(e) => {
                            warn!(
                                "session {}: transcription failed ({e}); recording an empty answer",
                                session.id
                            );
                            String::new()
                        }
                    }
                }
                None => String::new(),
            };

            record_answer(&mut session, backend, content).await
        }
    }
}

/// Commits one answer. A non-final answer costs one upstream call for the
/// follow-up question; the final answer commits locally and returns no reply.
async fn record_answer(
    session: &mut Session,
    backend: &dyn ChatBackend,
    content: String,
) -> Result<TurnReply, AppError> {
    match session.sequencer.check_advance()? {
        Advance::NextQuestion(next) => {
            let prompt = prompts::compose(
                Phase::Followup {
                    answer: &content,
                    next_question: next,
                },
                &session.transcript,
                &session.config_or_default(),
                &session.role,
                session.sequencer.total(),
            );
            let reply = backend.complete(&prompt.into_messages()).await?;

            session.transcript.append(Role::User, content);
            session.transcript.append(Role::Assistant, reply.clone());
            session.sequencer.advance()?;

            Ok(TurnReply {
                reply: Some(reply),
                question: Some(next),
                status: session.status(),
            })
        }
        Advance::Finished => {
            session.transcript.append(Role::User, content);
            session.sequencer.advance()?;

            info!("session {}: interview finished", session.id);

            Ok(TurnReply {
                reply: None,
                question: None,
                status: session.status(),
            })
        }
    }
}

/// Free-form chat against the running transcript, outside the interview.
async fn general_chat(
    session: &mut Session,
    backend: &dyn ChatBackend,
    content: String,
) -> Result<TurnReply, AppError> {
    let mut messages: Vec<ChatMessage> = session
        .transcript
        .turns()
        .iter()
        .cloned()
        .map(ChatMessage::from)
        .collect();
    messages.push(ChatMessage::user(content.clone()));

    let reply = backend.complete(&messages).await?;

    session.transcript.append(Role::User, content);
    session.transcript.append(Role::Assistant, reply.clone());

    Ok(TurnReply {
        reply: Some(reply),
        question: None,
        status: session.status(),
    })
}

/// Produces the candidate/role match summary. Valid in any lifecycle state
/// as long as the session has context documents or answered questions.
pub async fn session_summary(
    sessions: &SessionManager,
    backend: &dyn ChatBackend,
    id: &str,
) -> Result<SummaryReply, AppError> {
    let handle = sessions.get(id).await?;

    // Summaries read but never mutate, so the upstream call happens with the
    // session lock released.
    let (messages, pairs_summarized) = {
        let session = handle.lock().await;
        let pairs = session.qa_pairs();
        if session.transcript.context().is_empty() && pairs.is_empty() {
            return Err(AppError::Validation(
                "nothing to summarize yet: attach context documents or run the interview first"
                    .to_string(),
            ));
        }

        let prompt = prompts::compose(
            Phase::MatchSummary,
            &session.transcript,
            &session.config_or_default(),
            &session.role,
            session.sequencer.total(),
        );
        (prompt.into_messages(), pairs.len())
    };

    let reply = backend.complete(&messages).await?;
    let report = report::parse_match_report(&reply);

    Ok(SummaryReply {
        reply,
        pairs_summarized,
        report,
    })
}

/// Produces per-question coaching feedback. Only valid once the interview
/// has finished.
pub async fn question_feedback(
    sessions: &SessionManager,
    backend: &dyn ChatBackend,
    id: &str,
) -> Result<FeedbackReply, AppError> {
    let handle = sessions.get(id).await?;

    let (messages, pairs) = {
        let session = handle.lock().await;
        if !session.sequencer.is_finished() {
            return Err(AppError::InvalidState(
                "per-question feedback is available once the interview finishes".to_string(),
            ));
        }

        let pairs = session.qa_pairs();
        let prompt = prompts::compose(
            Phase::PerQuestionFeedback { pairs: &pairs },
            &session.transcript,
            &session.config_or_default(),
            &session.role,
            session.sequencer.total(),
        );
        (prompt.into_messages(), pairs)
    };

    let reply = backend.complete(&messages).await?;
    let records = report::parse_feedback_records(&reply).map_err(UpstreamError::from)?;

    Ok(FeedbackReply {
        items: join_feedback(pairs, records),
    })
}

/// Joins parsed records to the pairs they review, by 1-based question index.
/// Records that reference no asked question are dropped; the output is never
/// padded with fabricated feedback.
fn join_feedback(pairs: Vec<QaPair>, records: Vec<FeedbackRecord>) -> Vec<QuestionFeedback> {
    let mut items = Vec::new();
    for pair in pairs {
        match records.iter().find(|r| r.question_index == pair.index) {
            Some(record) => items.push(QuestionFeedback {
                question_index: pair.index,
                question: pair.question,
                answer: pair.answer,
                feedback: record.feedback.clone(),
                suggested_answer: record.suggested_answer.clone(),
            }),
            None => warn!("no feedback record for question {}", pair.index),
        }
    }
    items
}

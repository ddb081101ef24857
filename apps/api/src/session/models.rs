//! Wire-facing session types: transcript turns, lifecycle status, and the
//! snapshot returned by `GET /session/{id}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::interview::calibration::InterviewConfig;
use crate::interview::sequencer::InterviewState;
use crate::llm_client::{ChatMessage, Role};
use crate::session::transcript::ContextFields;

/// One recorded message in a session transcript.
///
/// `seq` is assigned at append time and is contiguous from 0 within a
/// session; turn 0 is always the system prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub seq: u64,
    pub role: Role,
    pub content: String,
}

impl From<Turn> for ChatMessage {
    fn from(turn: Turn) -> Self {
        ChatMessage {
            role: turn.role,
            content: turn.content,
        }
    }
}

/// Coarse session lifecycle: `Complete` once the interview has finished,
/// `Active` otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Complete,
}

/// An asked question paired with the candidate's recorded answer.
/// `index` is the 1-based question number.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QaPair {
    pub index: u32,
    pub question: String,
    pub answer: String,
}

/// Public view of a session, serialized for `GET /session/{id}`.
#[derive(Debug, Serialize)]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    pub role: String,
    pub interview: InterviewState,
    pub questions_total: u32,
    pub config: Option<InterviewConfig>,
    pub context: ContextFields,
    pub turns: Vec<Turn>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(SessionStatus::Active).expect("should serialize"),
            serde_json::json!("active")
        );
        assert_eq!(
            serde_json::to_value(SessionStatus::Complete).expect("should serialize"),
            serde_json::json!("complete")
        );
    }

    #[test]
    fn test_turn_converts_to_chat_message() {
        let turn = Turn {
            seq: 3,
            role: Role::Assistant,
            content: "What drew you to this role?".to_string(),
        };
        let message = ChatMessage::from(turn);
        assert_eq!(message.role, Role::Assistant);
        assert_eq!(message.content, "What drew you to this role?");
    }
}

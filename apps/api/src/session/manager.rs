//! Session manager: the in-memory registry of live sessions.
//!
//! The registry is a plain value constructed at startup and injected through
//! application state; nothing here is global. Each session sits behind its
//! own async mutex, which is the per-session serialization point: concurrent
//! requests against one session queue up, requests against different
//! sessions proceed in parallel.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::calibration::InterviewConfig;
use crate::interview::sequencer::Sequencer;
use crate::session::models::{QaPair, SessionSnapshot, SessionStatus};
use crate::session::transcript::Transcript;

pub type SessionHandle = Arc<Mutex<Session>>;

/// All state for one practice-interview session.
pub struct Session {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub role: String,
    pub transcript: Transcript,
    pub sequencer: Sequencer,
    config: Option<InterviewConfig>,
    first_question_seq: Option<u64>,
}

impl Session {
    fn new(id: Uuid, role: String, system_prompt: String, questions_total: u32) -> Self {
        Self {
            id,
            created_at: Utc::now(),
            role,
            transcript: Transcript::new(system_prompt),
            sequencer: Sequencer::new(questions_total),
            config: None,
            first_question_seq: None,
        }
    }

    pub fn status(&self) -> SessionStatus {
        if self.sequencer.is_finished() {
            SessionStatus::Complete
        } else {
            SessionStatus::Active
        }
    }

    /// Stores the calibration. Rejected once the interview has started.
    pub fn set_config(&mut self, config: InterviewConfig) -> Result<(), AppError> {
        if self.sequencer.has_started() {
            return Err(AppError::InvalidState(
                "interview configuration is frozen once the interview starts".to_string(),
            ));
        }
        self.config = Some(config);
        Ok(())
    }

    /// Effective calibration: what was stored, or the middle level of every
    /// dimension when nothing was.
    pub fn config_or_default(&self) -> InterviewConfig {
        self.config.unwrap_or_default()
    }

    /// Records that the interview opened with the question at `first_seq`
    /// and freezes the context documents.
    pub fn record_interview_started(&mut self, first_seq: u64) {
        self.first_question_seq = Some(first_seq);
        self.transcript.freeze_context();
    }

    /// Question/answer pairs of the interview proper, excluding any general
    /// chat recorded before it started.
    pub fn qa_pairs(&self) -> Vec<QaPair> {
        match self.first_question_seq {
            Some(first) => self
                .transcript
                .qa_pairs_from(first, self.sequencer.total() as usize),
            None => Vec::new(),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id,
            status: self.status(),
            created_at: self.created_at,
            role: self.role.clone(),
            interview: self.sequencer.state(),
            questions_total: self.sequencer.total(),
            config: self.config,
            context: self.transcript.context().clone(),
            turns: self.transcript.turns().to_vec(),
        }
    }
}

/// Registry of live sessions, keyed by id.
#[derive(Clone)]
pub struct SessionManager {
    sessions: Arc<RwLock<HashMap<Uuid, SessionHandle>>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Creates a session and returns its id.
    pub async fn create(&self, role: String, system_prompt: String, questions_total: u32) -> Uuid {
        let id = Uuid::new_v4();
        let session = Session::new(id, role, system_prompt, questions_total);
        self.sessions
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(session)));
        id
    }

    /// Looks up a session by its textual id. Ids that do not parse as UUIDs
    /// report the same not-found error as unknown ids.
    pub async fn get(&self, id: &str) -> Result<SessionHandle, AppError> {
        let not_found = || AppError::NotFound("session not found".to_string());
        let id = Uuid::parse_str(id).map_err(|_| not_found())?;
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(not_found)
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::Role;

    async fn make_session(manager: &SessionManager) -> SessionHandle {
        let id = manager
            .create(
                "software engineering interviewer".to_string(),
                "You are an interviewer.".to_string(),
                3,
            )
            .await;
        manager
            .get(&id.to_string())
            .await
            .expect("freshly created session should resolve")
    }

    #[tokio::test]
    async fn test_create_then_get_round_trips() {
        let manager = SessionManager::new();
        let handle = make_session(&manager).await;
        let session = handle.lock().await;

        assert_eq!(session.status(), SessionStatus::Active);
        assert_eq!(session.transcript.turns().len(), 1);
        assert_eq!(session.transcript.turns()[0].role, Role::System);
    }

    #[tokio::test]
    async fn test_get_unknown_id_is_not_found() {
        let manager = SessionManager::new();
        let missing = Uuid::new_v4().to_string();
        assert!(matches!(
            manager.get(&missing).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_get_malformed_id_is_not_found() {
        let manager = SessionManager::new();
        assert!(matches!(
            manager.get("definitely-not-a-uuid").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_created_sessions_have_distinct_ids() {
        let manager = SessionManager::new();
        let first = manager
            .create("r".to_string(), "s".to_string(), 3)
            .await;
        let second = manager
            .create("r".to_string(), "s".to_string(), 3)
            .await;
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_set_config_rejected_after_start() {
        let manager = SessionManager::new();
        let handle = make_session(&manager).await;
        let mut session = handle.lock().await;

        session
            .set_config(InterviewConfig::from_indices(3, 3, 3))
            .expect("config before start should be accepted");
        session.sequencer.start().expect("start should succeed");

        let result = session.set_config(InterviewConfig::from_indices(1, 1, 1));
        assert!(matches!(result, Err(AppError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_qa_pairs_skip_general_chat_before_interview() {
        let manager = SessionManager::new();
        let handle = make_session(&manager).await;
        let mut session = handle.lock().await;

        session.transcript.append(Role::User, "hello".to_string());
        session
            .transcript
            .append(Role::Assistant, "hi, ready when you are".to_string());

        let first_question = session
            .transcript
            .append(Role::Assistant, "Q1?".to_string());
        session.record_interview_started(first_question);
        session.transcript.append(Role::User, "A1".to_string());

        let pairs = session.qa_pairs();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].question, "Q1?");
        assert_eq!(pairs[0].answer, "A1");
    }

    #[tokio::test]
    async fn test_qa_pairs_empty_before_interview_starts() {
        let manager = SessionManager::new();
        let handle = make_session(&manager).await;
        let session = handle.lock().await;
        assert!(session.qa_pairs().is_empty());
    }
}

//! Append-only transcript store. Holds every turn spoken in a session plus
//! the candidate's context documents, and renders the views that prompt
//! composition embeds.
//!
//! Turns are never edited or removed once appended. Context documents may be
//! replaced freely before the interview starts and are frozen afterward.

use serde::Serialize;

use crate::errors::AppError;
use crate::llm_client::Role;
use crate::session::models::{QaPair, Turn};

/// The three optional candidate documents attached before an interview.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ContextFields {
    pub resume: Option<String>,
    pub job_description: Option<String>,
    pub company_info: Option<String>,
}

impl ContextFields {
    pub fn is_empty(&self) -> bool {
        self.resume.is_none() && self.job_description.is_none() && self.company_info.is_none()
    }
}

/// Which context document a write targets.
#[derive(Debug, Clone, Copy)]
pub enum ContextField {
    Resume,
    JobDescription,
    CompanyInfo,
}

#[derive(Debug)]
pub struct Transcript {
    turns: Vec<Turn>,
    context: ContextFields,
    context_frozen: bool,
}

impl Transcript {
    /// Creates a transcript seeded with the session's system prompt as turn 0.
    pub fn new(system_prompt: String) -> Self {
        let mut transcript = Self {
            turns: Vec::new(),
            context: ContextFields::default(),
            context_frozen: false,
        };
        transcript.append(Role::System, system_prompt);
        transcript
    }

    /// Appends a turn and returns its sequence number. Sequence numbers are
    /// assigned here and are contiguous from 0.
    pub fn append(&mut self, role: Role, content: String) -> u64 {
        let seq = self.turns.len() as u64;
        self.turns.push(Turn { seq, role, content });
        seq
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn context(&self) -> &ContextFields {
        &self.context
    }

    /// Stores or replaces one context document.
    pub fn set_context(&mut self, field: ContextField, text: String) -> Result<(), AppError> {
        if self.context_frozen {
            return Err(AppError::InvalidState(
                "context documents are frozen once the interview starts".to_string(),
            ));
        }
        match field {
            ContextField::Resume => self.context.resume = Some(text),
            ContextField::JobDescription => self.context.job_description = Some(text),
            ContextField::CompanyInfo => self.context.company_info = Some(text),
        }
        Ok(())
    }

    /// Makes the context documents read-only. Called when the interview starts.
    pub fn freeze_context(&mut self) {
        self.context_frozen = true;
    }

    /// Role-labelled rendering of the conversation for prompt embedding.
    /// The system turn is omitted; user and assistant turns keep their order.
    pub fn summary_view(&self) -> String {
        let mut lines = Vec::new();
        for turn in &self.turns {
            let label = match turn.role {
                Role::System => continue,
                Role::User => "Candidate",
                Role::Assistant => "Interviewer",
            };
            lines.push(format!("{label}: {}", turn.content));
        }
        lines.join("\n")
    }

    /// Pairs each asked question with the answer that followed it, starting
    /// from the turn that opened the interview. Stops after `limit` pairs.
    /// A trailing question with no recorded answer is not included.
    pub fn qa_pairs_from(&self, first_question_seq: u64, limit: usize) -> Vec<QaPair> {
        let mut pairs = Vec::new();
        let mut pending_question: Option<&Turn> = None;

        for turn in self.turns.iter().filter(|t| t.seq >= first_question_seq) {
            match turn.role {
                Role::Assistant => pending_question = Some(turn),
                Role::User => {
                    if let Some(question) = pending_question.take() {
                        pairs.push(QaPair {
                            index: pairs.len() as u32 + 1,
                            question: question.content.clone(),
                            answer: turn.content.clone(),
                        });
                        if pairs.len() == limit {
                            break;
                        }
                    }
                }
                Role::System => {}
            }
        }

        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_transcript() -> Transcript {
        Transcript::new("You are an interviewer.".to_string())
    }

    #[test]
    fn test_new_transcript_seeds_system_prompt_as_turn_zero() {
        let transcript = make_transcript();
        let turns = transcript.turns();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].seq, 0);
        assert_eq!(turns[0].role, Role::System);
        assert_eq!(turns[0].content, "You are an interviewer.");
    }

    #[test]
    fn test_append_assigns_contiguous_sequence_numbers() {
        let mut transcript = make_transcript();
        let first = transcript.append(Role::Assistant, "Question one?".to_string());
        let second = transcript.append(Role::User, "Answer one.".to_string());

        assert_eq!(first, 1);
        assert_eq!(second, 2);
        for (i, turn) in transcript.turns().iter().enumerate() {
            assert_eq!(turn.seq, i as u64, "sequence numbers must be contiguous");
        }
    }

    #[test]
    fn test_set_context_replaces_value_before_freeze() {
        let mut transcript = make_transcript();
        transcript
            .set_context(ContextField::Resume, "v1".to_string())
            .expect("first write should succeed");
        transcript
            .set_context(ContextField::Resume, "v2".to_string())
            .expect("overwrite before freeze should succeed");

        assert_eq!(transcript.context().resume.as_deref(), Some("v2"));
    }

    #[test]
    fn test_set_context_rejected_after_freeze() {
        let mut transcript = make_transcript();
        transcript
            .set_context(ContextField::JobDescription, "backend role".to_string())
            .expect("write before freeze should succeed");
        transcript.freeze_context();

        let result = transcript.set_context(ContextField::Resume, "late".to_string());
        assert!(
            matches!(result, Err(AppError::InvalidState(_))),
            "context writes after freeze must be invalid-state errors"
        );
        assert_eq!(
            transcript.context().job_description.as_deref(),
            Some("backend role"),
            "existing context must survive a rejected write"
        );
    }

    #[test]
    fn test_summary_view_labels_speakers_and_skips_system_turn() {
        let mut transcript = make_transcript();
        transcript.append(Role::Assistant, "Why this company?".to_string());
        transcript.append(Role::User, "I admire the product.".to_string());

        assert_eq!(
            transcript.summary_view(),
            "Interviewer: Why this company?\nCandidate: I admire the product."
        );
    }

    #[test]
    fn test_qa_pairs_ignore_turns_before_first_question() {
        let mut transcript = make_transcript();
        transcript.append(Role::User, "hi there".to_string());
        transcript.append(Role::Assistant, "hello, ready when you are".to_string());
        let first_question = transcript.append(Role::Assistant, "Q1?".to_string());
        transcript.append(Role::User, "A1".to_string());
        transcript.append(Role::Assistant, "Q2?".to_string());
        transcript.append(Role::User, "A2".to_string());

        let pairs = transcript.qa_pairs_from(first_question, 3);
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].index, 1);
        assert_eq!(pairs[0].question, "Q1?");
        assert_eq!(pairs[0].answer, "A1");
        assert_eq!(pairs[1].index, 2);
        assert_eq!(pairs[1].answer, "A2");
    }

    #[test]
    fn test_qa_pairs_respect_limit() {
        let mut transcript = make_transcript();
        let first_question = transcript.append(Role::Assistant, "Q1?".to_string());
        transcript.append(Role::User, "A1".to_string());
        transcript.append(Role::Assistant, "Q2?".to_string());
        transcript.append(Role::User, "A2".to_string());

        let pairs = transcript.qa_pairs_from(first_question, 1);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].question, "Q1?");
    }

    #[test]
    fn test_qa_pairs_exclude_unanswered_trailing_question() {
        let mut transcript = make_transcript();
        let first_question = transcript.append(Role::Assistant, "Q1?".to_string());
        transcript.append(Role::User, "A1".to_string());
        transcript.append(Role::Assistant, "Q2?".to_string());

        let pairs = transcript.qa_pairs_from(first_question, 3);
        assert_eq!(pairs.len(), 1, "a question with no answer is not a pair");
    }

    #[test]
    fn test_qa_pairs_empty_on_fresh_transcript() {
        let transcript = make_transcript();
        assert!(transcript.qa_pairs_from(0, 3).is_empty());
    }

    #[test]
    fn test_context_fields_is_empty() {
        let mut transcript = make_transcript();
        assert!(transcript.context().is_empty());
        transcript
            .set_context(ContextField::CompanyInfo, "We build tooling.".to_string())
            .expect("write should succeed");
        assert!(!transcript.context().is_empty());
    }
}

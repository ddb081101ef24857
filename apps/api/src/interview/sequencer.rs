//! Turn sequencer: the interview lifecycle as an explicit state machine.
//!
//! A session moves `NotStarted -> InProgress(1..=total) -> Finished` and
//! never backward. Transitions can be validated separately from being
//! applied, so orchestration checks them before spending an upstream model
//! call and commits only after the call succeeds.

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Lifecycle position of the question/answer loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum InterviewState {
    NotStarted,
    /// `question` is the 1-based number currently awaiting an answer.
    InProgress { question: u32 },
    Finished,
}

/// What committing an answer does to the sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Another question is owed; carries its 1-based number.
    NextQuestion(u32),
    /// That was the final answer.
    Finished,
}

#[derive(Debug)]
pub struct Sequencer {
    state: InterviewState,
    total: u32,
}

impl Sequencer {
    pub fn new(total: u32) -> Self {
        Self {
            state: InterviewState::NotStarted,
            total,
        }
    }

    pub fn state(&self) -> InterviewState {
        self.state
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn has_started(&self) -> bool {
        self.state != InterviewState::NotStarted
    }

    pub fn is_finished(&self) -> bool {
        self.state == InterviewState::Finished
    }

    /// The question currently awaiting an answer, if any.
    pub fn current_question(&self) -> Option<u32> {
        match self.state {
            InterviewState::InProgress { question } => Some(question),
            _ => None,
        }
    }

    /// Validates that the interview can start, without applying the
    /// transition.
    pub fn check_start(&self) -> Result<(), AppError> {
        match self.state {
            InterviewState::NotStarted => Ok(()),
            InterviewState::InProgress { .. } => Err(AppError::InvalidState(
                "interview is already in progress".to_string(),
            )),
            InterviewState::Finished => Err(AppError::InvalidState(
                "interview is already finished".to_string(),
            )),
        }
    }

    /// Moves to the first question.
    pub fn start(&mut self) -> Result<u32, AppError> {
        self.check_start()?;
        self.state = InterviewState::InProgress { question: 1 };
        Ok(1)
    }

    /// Validates that an answer can be committed and reports what committing
    /// it would do, without applying the transition.
    pub fn check_advance(&self) -> Result<Advance, AppError> {
        match self.state {
            InterviewState::NotStarted => Err(AppError::InvalidState(
                "interview has not started".to_string(),
            )),
            InterviewState::InProgress { question } if question < self.total => {
                Ok(Advance::NextQuestion(question + 1))
            }
            InterviewState::InProgress { .. } => Ok(Advance::Finished),
            InterviewState::Finished => Err(AppError::InvalidState(
                "interview is already finished".to_string(),
            )),
        }
    }

    /// Commits one answered question.
    pub fn advance(&mut self) -> Result<Advance, AppError> {
        let advance = self.check_advance()?;
        self.state = match advance {
            Advance::NextQuestion(next) => InterviewState::InProgress { question: next },
            Advance::Finished => InterviewState::Finished,
        };
        Ok(advance)
    }
}

//! Prompt composition for every upstream call the service makes.
//!
//! Composition is deterministic: the same session material always yields the
//! same prompt text. Composed instructions are sent upstream but never
//! recorded in the transcript; only what was actually said enters a session's
//! history.

use crate::interview::calibration::InterviewConfig;
use crate::llm_client::ChatMessage;
use crate::session::models::QaPair;
use crate::session::transcript::{ContextFields, Transcript};

/// System prompt for question turns.
/// Replace: `{role}`, `{focus_note}`, `{style_note}`, `{difficulty_note}`
pub const INTERVIEWER_SYSTEM_TEMPLATE: &str = r#"You are a {role} running a practice interview. The candidate hears your messages through a voice interface, so phrase them naturally for speech. Ground your questions in the candidate CV, job description, and company information when they are provided.

Interview protocol:
- Ask one focused question at a time.
- Build on what the candidate has already said.
- Never repeat a question you have already asked.

Calibration for this session:
- {focus_note}
- {style_note}
- {difficulty_note}

Keep every message concise: three short paragraphs at most."#;

/// System prompt for the match summary.
pub const REVIEW_SYSTEM: &str =
    "You are a hiring analyst reviewing a candidate's materials and practice \
    interview performance. Be specific and grounded; never state facts the \
    materials do not support.";

/// System prompt for per-question feedback. Enforces JSON-only output.
pub const FEEDBACK_SYSTEM: &str =
    "You are an interview coach writing per-question feedback. \
    You MUST respond with valid JSON only: a JSON array of feedback records. \
    Do NOT include any text outside the JSON array. \
    Do NOT use markdown code fences.";

/// Opening-question prompt template. Replace `{context}` and `{total}`.
pub const OPENING_PROMPT_TEMPLATE: &str = r#"{context}

This practice interview has {total} questions. Greet the candidate in one or two sentences, then ask question 1. Ask exactly one question and nothing else."#;

/// Follow-up question prompt template.
/// Replace: `{context}`, `{history}`, `{answer}`, `{current}`, `{next}`, `{total}`
pub const FOLLOWUP_PROMPT_TEMPLATE: &str = r#"{context}

Conversation so far:
{history}

The candidate's answer to question {current} was:
{answer}

You have asked {current} of {total} questions. Briefly acknowledge the answer if it helps the flow, then ask question {next}. Ask exactly one question and do not repeat an earlier question."#;

/// Match-summary prompt template. Replace `{context}` and `{history}`.
/// The fixed section markers here are what `report::parse_match_report` scans for.
pub const MATCH_SUMMARY_PROMPT_TEMPLATE: &str = r#"{context}

Interview record:
{history}

Assess how well this candidate matches the role. Respond with EXACTLY these sections, in this order, each marker at the start of its line:
SCORE: <integer from 0 to 100>
STRENGTHS:
- <strength>
- <strength>
IMPROVEMENTS:
- <improvement>
- <improvement>
SUMMARY:
<one short paragraph>

Do not add any text before the SCORE: line."#;

/// Per-question feedback prompt template. Replace `{qa_block}`.
pub const FEEDBACK_PROMPT_TEMPLATE: &str = r#"The candidate finished a practice interview. For each question and answer below, write concise coaching feedback and a stronger suggested answer.

{qa_block}

Return a JSON ARRAY with exactly one record per question:
[
  {
    "question_index": 1,
    "feedback": "What worked and what fell short.",
    "suggested_answer": "A stronger answer the candidate could give."
  }
]"#;

/// Which upstream call a prompt is being composed for.
#[derive(Debug)]
pub enum Phase<'a> {
    /// Greet the candidate and ask question 1.
    Opening,
    /// Acknowledge the pending answer and ask the next question. The answer
    /// is not yet in the transcript when this prompt is composed.
    Followup { answer: &'a str, next_question: u32 },
    /// Assess candidate/role fit over the context documents and transcript.
    MatchSummary,
    /// Produce one JSON coaching record per answered question.
    PerQuestionFeedback { pairs: &'a [QaPair] },
}

/// A fully composed prompt, ready to send upstream.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedPrompt {
    pub system: String,
    pub user: String,
}

impl ComposedPrompt {
    pub fn into_messages(self) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(self.system),
            ChatMessage::user(self.user),
        ]
    }
}

pub fn compose(
    phase: Phase<'_>,
    transcript: &Transcript,
    config: &InterviewConfig,
    role: &str,
    questions_total: u32,
) -> ComposedPrompt {
    match phase {
        Phase::Opening => ComposedPrompt {
            system: interviewer_system(role, config),
            user: OPENING_PROMPT_TEMPLATE
                .replace("{total}", &questions_total.to_string())
                .replace("{context}", &context_block(transcript.context())),
        },
        Phase::Followup {
            answer,
            next_question,
        } => {
            let current = next_question - 1;
            ComposedPrompt {
                system: interviewer_system(role, config),
                user: FOLLOWUP_PROMPT_TEMPLATE
                    .replace("{current}", &current.to_string())
                    .replace("{next}", &next_question.to_string())
                    .replace("{total}", &questions_total.to_string())
                    .replace("{history}", &history_block(transcript))
                    .replace("{context}", &context_block(transcript.context()))
                    .replace("{answer}", answer),
            }
        }
        Phase::MatchSummary => ComposedPrompt {
            system: REVIEW_SYSTEM.to_string(),
            user: MATCH_SUMMARY_PROMPT_TEMPLATE
                .replace("{history}", &history_block(transcript))
                .replace("{context}", &context_block(transcript.context())),
        },
        Phase::PerQuestionFeedback { pairs } => ComposedPrompt {
            system: FEEDBACK_SYSTEM.to_string(),
            user: FEEDBACK_PROMPT_TEMPLATE.replace("{qa_block}", &qa_block(pairs)),
        },
    }
}

fn interviewer_system(role: &str, config: &InterviewConfig) -> String {
    INTERVIEWER_SYSTEM_TEMPLATE
        .replace("{focus_note}", config.focus.prompt_note())
        .replace("{style_note}", config.style.prompt_note())
        .replace("{difficulty_note}", config.difficulty.prompt_note())
        .replace("{role}", role)
}

fn context_block(context: &ContextFields) -> String {
    format!(
        "Candidate CV:\n{}\n\nJob description:\n{}\n\nCompany information:\n{}",
        or_placeholder(&context.resume),
        or_placeholder(&context.job_description),
        or_placeholder(&context.company_info)
    )
}

fn or_placeholder(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("(not provided)")
}

fn history_block(transcript: &Transcript) -> String {
    let view = transcript.summary_view();
    if view.is_empty() {
        "(no conversation recorded yet)".to_string()
    } else {
        view
    }
}

fn qa_block(pairs: &[QaPair]) -> String {
    pairs
        .iter()
        .map(|pair| {
            let answer = if pair.answer.trim().is_empty() {
                "(no answer recorded)"
            } else {
                pair.answer.as_str()
            };
            format!(
                "Question {index}: {question}\nAnswer {index}: {answer}",
                index = pair.index,
                question = pair.question
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

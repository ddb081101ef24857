//! Parsers for structured model output: the marker-delimited match report
//! and the per-question feedback records.
//!
//! Parsing is tolerant about formatting but never invents content. A section
//! the model did not produce stays empty, and a score that cannot be read
//! stays unknown rather than defaulting to a number.

use serde::{Deserialize, Serialize};

use crate::llm_client::strip_json_fences;

const SCORE_MARKER: &str = "SCORE:";
const STRENGTHS_MARKER: &str = "STRENGTHS:";
const IMPROVEMENTS_MARKER: &str = "IMPROVEMENTS:";
const SUMMARY_MARKER: &str = "SUMMARY:";

const MARKERS: [&str; 4] = [
    SCORE_MARKER,
    STRENGTHS_MARKER,
    IMPROVEMENTS_MARKER,
    SUMMARY_MARKER,
];

/// Structured view of a match-summary reply. `score` is `None` when the
/// model produced no readable integer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchReport {
    pub score: Option<u8>,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub summary: String,
}

/// One per-question coaching record, as requested from the model in JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub question_index: u32,
    pub feedback: String,
    #[serde(default)]
    pub suggested_answer: String,
}

/// Splits a match-summary reply on its fixed section markers.
pub fn parse_match_report(reply: &str) -> MatchReport {
    MatchReport {
        score: section(reply, SCORE_MARKER).and_then(|text| parse_score(&text)),
        strengths: section(reply, STRENGTHS_MARKER)
            .map(|text| bullets(&text))
            .unwrap_or_default(),
        improvements: section(reply, IMPROVEMENTS_MARKER)
            .map(|text| bullets(&text))
            .unwrap_or_default(),
        summary: section(reply, SUMMARY_MARKER).unwrap_or_default(),
    }
}

/// Parses the feedback reply as a JSON array of records, stripping markdown
/// code fences first if the model wrapped its output in them.
pub fn parse_feedback_records(reply: &str) -> Result<Vec<FeedbackRecord>, serde_json::Error> {
    serde_json::from_str(strip_json_fences(reply))
}

/// Text between `marker` and the next known marker, or the end of the reply.
fn section(reply: &str, marker: &str) -> Option<String> {
    let start = reply.find(marker)? + marker.len();
    let rest = &reply[start..];
    let end = MARKERS
        .iter()
        .filter_map(|m| rest.find(m))
        .min()
        .unwrap_or(rest.len());

    let text = rest[..end].trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Reads the leading integer of a score section, clamped to 0..=100.
/// `"85/100"` scores 85; text with no leading integer scores nothing.
fn parse_score(text: &str) -> Option<u8> {
    let trimmed = text.trim_start();
    let negative = trimmed.starts_with('-');
    let digits: String = trimmed
        .trim_start_matches('-')
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        return None;
    }

    let magnitude: i64 = digits.parse().ok()?;
    let value = if negative { -magnitude } else { magnitude };
    Some(value.clamp(0, 100) as u8)
}

/// One item per non-empty line, with any leading bullet glyph stripped.
fn bullets(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| {
            line.trim()
                .trim_start_matches(|c: char| c == '-' || c == '*' || c == '•')
                .trim_start()
        })
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

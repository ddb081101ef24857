//! Interview calibration — maps the three client-chosen dimensions to the
//! prompt fragments that steer question style.
//!
//! The wire form is an ordered (focus, style, difficulty) triple of 1-based
//! indices. Out-of-range indices clamp to the nearest bound; a session with
//! no stored config runs at the middle level of every dimension.

use serde::{Deserialize, Serialize};

/// How technical the questions should be.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Focus {
    Behavioral,
    #[default]
    Mixed,
    Technical,
}

/// How the interviewer carries themselves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Style {
    Supportive,
    #[default]
    Neutral,
    Challenging,
}

/// How demanding the questions should be.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Focus {
    fn from_index(index: i64) -> Self {
        match index.clamp(1, 3) {
            1 => Focus::Behavioral,
            3 => Focus::Technical,
            _ => Focus::Mixed,
        }
    }

    pub fn prompt_note(&self) -> &'static str {
        match self {
            Focus::Behavioral => {
                "Keep questions behavioral and situational; stay away from implementation detail."
            }
            Focus::Mixed => "Blend behavioral questions with light technical probing.",
            Focus::Technical => {
                "Make questions deeply technical; probe design decisions and implementation detail."
            }
        }
    }
}

impl Style {
    fn from_index(index: i64) -> Self {
        match index.clamp(1, 3) {
            1 => Style::Supportive,
            3 => Style::Challenging,
            _ => Style::Neutral,
        }
    }

    pub fn prompt_note(&self) -> &'static str {
        match self {
            Style::Supportive => {
                "Be warm and encouraging; acknowledge effort before probing further."
            }
            Style::Neutral => "Keep a neutral, professional interviewing tone.",
            Style::Challenging => "Be direct and demanding; push back on vague answers.",
        }
    }
}

impl Difficulty {
    fn from_index(index: i64) -> Self {
        match index.clamp(1, 3) {
            1 => Difficulty::Easy,
            3 => Difficulty::Hard,
            _ => Difficulty::Medium,
        }
    }

    pub fn prompt_note(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Ask entry-level questions a junior candidate could handle.",
            Difficulty::Medium => "Ask mid-level questions with moderate depth.",
            Difficulty::Hard => "Ask demanding questions that assume senior-level experience.",
        }
    }
}

/// The stored calibration for one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterviewConfig {
    pub focus: Focus,
    pub style: Style,
    pub difficulty: Difficulty,
}

impl InterviewConfig {
    /// Decodes the ordered wire triple.
    pub fn from_indices(focus: i64, style: i64, difficulty: i64) -> Self {
        Self {
            focus: Focus::from_index(focus),
            style: Style::from_index(style),
            difficulty: Difficulty::from_index(difficulty),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indices_map_to_levels_in_order() {
        let config = InterviewConfig::from_indices(1, 2, 3);
        assert_eq!(config.focus, Focus::Behavioral);
        assert_eq!(config.style, Style::Neutral);
        assert_eq!(config.difficulty, Difficulty::Hard);
    }

    #[test]
    fn test_out_of_range_indices_clamp_to_bounds() {
        let low = InterviewConfig::from_indices(0, -7, 0);
        assert_eq!(low.focus, Focus::Behavioral);
        assert_eq!(low.style, Style::Supportive);
        assert_eq!(low.difficulty, Difficulty::Easy);

        let high = InterviewConfig::from_indices(7, 99, 4);
        assert_eq!(high.focus, Focus::Technical);
        assert_eq!(high.style, Style::Challenging);
        assert_eq!(high.difficulty, Difficulty::Hard);
    }

    #[test]
    fn test_default_config_is_middle_of_every_dimension() {
        let config = InterviewConfig::default();
        assert_eq!(config.focus, Focus::Mixed);
        assert_eq!(config.style, Style::Neutral);
        assert_eq!(config.difficulty, Difficulty::Medium);
    }

    #[test]
    fn test_prompt_notes_are_distinct_within_each_dimension() {
        assert_ne!(Focus::Behavioral.prompt_note(), Focus::Technical.prompt_note());
        assert_ne!(Style::Supportive.prompt_note(), Style::Challenging.prompt_note());
        assert_ne!(Difficulty::Easy.prompt_note(), Difficulty::Hard.prompt_note());
    }

    #[test]
    fn test_config_serializes_snake_case_levels() {
        let config = InterviewConfig::from_indices(3, 1, 2);
        let wire = serde_json::to_value(config).expect("should serialize");
        assert_eq!(
            wire,
            serde_json::json!({
                "focus": "technical",
                "style": "supportive",
                "difficulty": "medium"
            })
        );
    }
}

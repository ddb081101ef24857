//! GreenPT client — the single point of entry for all upstream model calls.
//!
//! ARCHITECTURAL RULE: no other module may talk to the GreenPT API directly.
//! Chat completions and speech-to-text both go through the [`ChatBackend`]
//! trait so handlers and orchestration can be tested against a scripted fake.
//!
//! Every call is a single attempt. Failures surface as [`UpstreamError`] and
//! the caller decides what to do; the client never retries and never invents
//! reply text.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::Config;

const TEMPERATURE: f32 = 0.7;
const MAX_TOKENS: u32 = 512;
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("model returned an empty reply")]
    EmptyReply,
}

/// Speaker tag shared by the transcript and the chat wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One message in an OpenAI-compatible chat payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Upstream seam injected into [`crate::state::AppState`].
///
/// Production uses [`GreenPtClient`]; tests use a scripted fake. Implementors
/// must return `Err` rather than a fabricated reply when the upstream gives
/// them nothing usable.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Sends a chat completion request and returns the assistant's reply text.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, UpstreamError>;

    /// Transcribes an audio recording to text.
    async fn transcribe(&self, audio: &[u8], content_type: &str) -> Result<String, UpstreamError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    text: Option<String>,
    response: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChoiceMessage>,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct SttResponse {
    results: Option<SttResults>,
}

#[derive(Debug, Deserialize)]
struct SttResults {
    #[serde(default)]
    channels: Vec<SttChannel>,
}

#[derive(Debug, Deserialize)]
struct SttChannel {
    #[serde(default)]
    alternatives: Vec<SttAlternative>,
}

#[derive(Debug, Deserialize)]
struct SttAlternative {
    transcript: Option<String>,
}

/// The production GreenPT client. Holds one pooled reqwest client with a
/// request timeout; the chat and STT endpoints share it.
#[derive(Clone)]
pub struct GreenPtClient {
    http: Client,
    api_key: String,
    chat_url: String,
    chat_model: String,
    stt_url: String,
    stt_model: String,
}

impl GreenPtClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            api_key: config.greenpt_api_key.clone(),
            chat_url: config.greenpt_api_url.clone(),
            chat_model: config.greenpt_model.clone(),
            stt_url: config.greenpt_stt_url.clone(),
            stt_model: config.greenpt_stt_model.clone(),
        }
    }
}

#[async_trait]
impl ChatBackend for GreenPtClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, UpstreamError> {
        let request_body = ChatRequest {
            model: &self.chat_model,
            messages,
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
            stream: false,
        };

        let response = self
            .http
            .post(&self.chat_url)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // Try to parse the OpenAI-style error envelope
            let message = serde_json::from_str::<ApiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(UpstreamError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let completion: ChatCompletion = response.json().await?;
        let reply = extract_reply(completion).ok_or(UpstreamError::EmptyReply)?;

        debug!("chat completion succeeded ({} chars)", reply.len());

        Ok(reply)
    }

    async fn transcribe(&self, audio: &[u8], content_type: &str) -> Result<String, UpstreamError> {
        let url = format!(
            "{}?model={}&smart_format=true",
            self.stt_url, self.stt_model
        );

        let response = self
            .http
            .post(&url)
            .header(AUTHORIZATION, format!("Token {}", self.api_key))
            .header(CONTENT_TYPE, content_type)
            .body(audio.to_vec())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let payload: SttResponse = response.json().await?;
        let transcript = first_transcript(payload).ok_or(UpstreamError::EmptyReply)?;

        debug!("transcription succeeded ({} chars)", transcript.len());

        Ok(transcript)
    }
}

/// Pulls the reply text out of a chat completion, tolerating the payload
/// shapes GreenPT has been seen to produce: `choices[0].message.content`,
/// `choices[0].text`, top-level `text`, then top-level `response`.
/// Whitespace-only replies count as empty.
fn extract_reply(completion: ChatCompletion) -> Option<String> {
    let from_choices = completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.and_then(|m| m.content).or(choice.text));

    let raw = from_choices.or(completion.text).or(completion.response)?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn first_transcript(payload: SttResponse) -> Option<String> {
    let raw = payload
        .results?
        .channels
        .into_iter()
        .next()?
        .alternatives
        .into_iter()
        .next()?
        .transcript?;

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from model output.
pub(crate) fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}


#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn completion(value: serde_json::Value) -> ChatCompletion {
        serde_json::from_value(value).expect("fixture should deserialize")
    }

    #[test]
    fn test_extract_reply_prefers_choice_message_content() {
        let payload = completion(json!({
            "choices": [{"message": {"content": "Tell me about yourself."}}],
            "text": "ignored",
            "response": "ignored"
        }));
        assert_eq!(
            extract_reply(payload).as_deref(),
            Some("Tell me about yourself.")
        );
    }

    #[test]
    fn test_extract_reply_falls_back_to_choice_text() {
        let payload = completion(json!({
            "choices": [{"text": "From the choice."}]
        }));
        assert_eq!(extract_reply(payload).as_deref(), Some("From the choice."));
    }

    #[test]
    fn test_extract_reply_falls_back_to_top_level_text() {
        let payload = completion(json!({"text": "Top level."}));
        assert_eq!(extract_reply(payload).as_deref(), Some("Top level."));
    }

    #[test]
    fn test_extract_reply_falls_back_to_response_field() {
        let payload = completion(json!({"response": "Legacy shape."}));
        assert_eq!(extract_reply(payload).as_deref(), Some("Legacy shape."));
    }

    #[test]
    fn test_extract_reply_trims_whitespace() {
        let payload = completion(json!({
            "choices": [{"message": {"content": "  padded  \n"}}]
        }));
        assert_eq!(extract_reply(payload).as_deref(), Some("padded"));
    }

    #[test]
    fn test_extract_reply_rejects_blank_content() {
        let payload = completion(json!({
            "choices": [{"message": {"content": "   "}}]
        }));
        assert_eq!(extract_reply(payload), None);
    }

    #[test]
    fn test_extract_reply_rejects_payload_with_no_known_fields() {
        let payload = completion(json!({"choices": []}));
        assert_eq!(extract_reply(payload), None);
    }

    #[test]
    fn test_first_transcript_reads_deepgram_shape() {
        let payload: SttResponse = serde_json::from_value(json!({
            "results": {"channels": [{"alternatives": [{"transcript": "I led the migration."}]}]}
        }))
        .expect("fixture should deserialize");
        assert_eq!(
            first_transcript(payload).as_deref(),
            Some("I led the migration.")
        );
    }

    #[test]
    fn test_first_transcript_rejects_missing_transcript() {
        let payload: SttResponse = serde_json::from_value(json!({
            "results": {"channels": [{"alternatives": [{}]}]}
        }))
        .expect("fixture should deserialize");
        assert_eq!(first_transcript(payload), None);
    }

    #[test]
    fn test_chat_request_wire_shape() {
        let messages = vec![
            ChatMessage::system("You are an interviewer."),
            ChatMessage::user("Hello"),
        ];
        let request = ChatRequest {
            model: "green-l",
            messages: &messages,
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
            stream: false,
        };
        let wire = serde_json::to_value(&request).expect("request should serialize");
        assert_eq!(wire["model"], "green-l");
        assert_eq!(wire["messages"][0]["role"], "system");
        assert_eq!(wire["messages"][1]["role"], "user");
        assert_eq!(wire["max_tokens"], 512);
        assert_eq!(wire["stream"], false);
    }

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n[{\"question_index\": 1}]\n```";
        assert_eq!(strip_json_fences(input), "[{\"question_index\": 1}]");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n[{\"question_index\": 1}]\n```";
        assert_eq!(strip_json_fences(input), "[{\"question_index\": 1}]");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "[{\"question_index\": 1}]";
        assert_eq!(strip_json_fences(input), "[{\"question_index\": 1}]");
    }
}

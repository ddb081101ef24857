use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub greenpt_api_key: String,
    pub greenpt_api_url: String,
    pub greenpt_model: String,
    pub greenpt_stt_url: String,
    pub greenpt_stt_model: String,
    /// Questions per interview. Applies to sessions created after a change.
    pub interview_questions: u32,
    pub cors_origin: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let interview_questions = std::env::var("INTERVIEW_QUESTIONS")
            .unwrap_or_else(|_| "3".to_string())
            .parse::<u32>()
            .context("INTERVIEW_QUESTIONS must be a positive integer")?;
        if interview_questions == 0 {
            anyhow::bail!("INTERVIEW_QUESTIONS must be at least 1");
        }

        Ok(Config {
            greenpt_api_key: require_env("GREENPT_API_KEY")?,
            greenpt_api_url: env_or(
                "GREENPT_API_URL",
                "https://api.greenpt.ai/v1/chat/completions",
            ),
            greenpt_model: env_or("GREENPT_MODEL", "green-l"),
            greenpt_stt_url: env_or("GREENPT_STT_URL", "https://api.greenpt.ai/v1/listen"),
            greenpt_stt_model: env_or("GREENPT_STT_MODEL", "green-s"),
            interview_questions,
            cors_origin: env_or("CORS_ORIGIN", "*"),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

#[cfg(test)]
impl Config {
    pub(crate) fn for_tests() -> Self {
        Self {
            greenpt_api_key: "test-key".to_string(),
            greenpt_api_url: "http://127.0.0.1:0/v1/chat/completions".to_string(),
            greenpt_model: "green-l".to_string(),
            greenpt_stt_url: "http://127.0.0.1:0/v1/listen".to_string(),
            greenpt_stt_model: "green-s".to_string(),
            interview_questions: 3,
            cors_origin: "*".to_string(),
            port: 0,
            rust_log: "info".to_string(),
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

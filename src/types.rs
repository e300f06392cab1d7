// Type definitions and enums

use std::time::Duration;

use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum LLMProvider {
    Google,
}

impl std::fmt::Display for LLMProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LLMProvider::Google => write!(f, "google"),
        }
    }
}

/// Sampling parameters sent with every completion request.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GenerationConfig {
    pub max_output_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_output_tokens: 3000,
            temperature: 0.2,
            top_p: 0.95,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum HarmCategory {
    #[serde(rename = "HARM_CATEGORY_HATE_SPEECH")]
    HateSpeech,
    #[serde(rename = "HARM_CATEGORY_DANGEROUS_CONTENT")]
    DangerousContent,
    #[serde(rename = "HARM_CATEGORY_SEXUALLY_EXPLICIT")]
    SexuallyExplicit,
    #[serde(rename = "HARM_CATEGORY_HARASSMENT")]
    Harassment,
}

impl HarmCategory {
    pub const ALL: [HarmCategory; 4] = [
        HarmCategory::HateSpeech,
        HarmCategory::DangerousContent,
        HarmCategory::SexuallyExplicit,
        HarmCategory::Harassment,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HarmBlockThreshold {
    BlockLowAndAbove,
    BlockMediumAndAbove,
    BlockOnlyHigh,
    BlockNone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SafetySetting {
    pub category: HarmCategory,
    pub threshold: HarmBlockThreshold,
}

impl SafetySetting {
    /// Every category at `BLOCK_ONLY_HIGH`: the loosest tier that still
    /// blocks the most severe content.
    pub fn block_only_high() -> Vec<SafetySetting> {
        HarmCategory::ALL
            .iter()
            .map(|&category| SafetySetting {
                category,
                threshold: HarmBlockThreshold::BlockOnlyHigh,
            })
            .collect()
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LLMRequest {
    pub model: String,
    pub messages: Vec<LLMMessage>,
    pub generation_config: GenerationConfig,
    pub safety_settings: Vec<SafetySetting>,
}

/// One conversational message made of ordered text parts.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LLMMessage {
    pub role: String, // "user" or "model"
    pub parts: Vec<String>,
}

impl LLMMessage {
    pub fn new(role: impl Into<String>, parts: Vec<String>) -> Self {
        Self {
            role: role.into(),
            parts,
        }
    }

    /// Create a user message from positional text parts
    pub fn user(parts: Vec<String>) -> Self {
        Self::new("user", parts)
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LLMResponse {
    pub content: String,
    pub finish_reason: String,
    pub usage: TokenUsage,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Unsupported file type: {0} (expected .pdf or .txt)")]
    UnsupportedFileType(String),

    #[error("File is not valid UTF-8 text: {0}")]
    FileDecode(String),

    #[error("Could not read PDF: {0}")]
    PdfParse(String),

    #[error("Question must not be empty")]
    EmptyQuestion,

    #[error("Upload a PDF or TXT file before asking questions")]
    NoDocument,

    #[error("Session not found: {0}")]
    SessionNotFound(uuid::Uuid),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("LLM authentication failed: {0}")]
    LLMAuth(String),

    #[error("LLM rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("Response blocked by provider: {0}")]
    ContentBlocked(String),

    #[error("LLM request timed out after {0:?}")]
    Timeout(Duration),

    #[error("LLM network error: {0}")]
    Network(String),

    #[error("LLM service unavailable: {0}")]
    Unavailable(String),

    #[error("LLM API error: {0}")]
    LLMApi(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Failures worth another attempt against the provider.
    pub fn is_transient(&self) -> bool {
        matches!(self, AppError::Network(_) | AppError::Unavailable(_))
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::UnsupportedFileType(_) => "UNSUPPORTED_FILE_TYPE",
            AppError::FileDecode(_) => "FILE_DECODE",
            AppError::PdfParse(_) => "PDF_PARSE",
            AppError::EmptyQuestion => "EMPTY_QUESTION",
            AppError::NoDocument => "NO_DOCUMENT",
            AppError::SessionNotFound(_) => "SESSION_NOT_FOUND",
            AppError::InvalidRequest(_) => "BAD_REQUEST",
            AppError::LLMAuth(_) => "LLM_AUTH",
            AppError::RateLimited(_) => "RATE_LIMITED",
            AppError::ContentBlocked(_) => "CONTENT_BLOCKED",
            AppError::Timeout(_) => "LLM_TIMEOUT",
            AppError::Network(_) => "LLM_NETWORK",
            AppError::Unavailable(_) => "LLM_UNAVAILABLE",
            AppError::LLMApi(_) => "LLM_API",
            AppError::Internal(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::UnsupportedFileType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::FileDecode(_) | AppError::PdfParse(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::EmptyQuestion | AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NoDocument => StatusCode::CONFLICT,
            AppError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            AppError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::ContentBlocked(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::LLMAuth(_)
            | AppError::Network(_)
            | AppError::Unavailable(_)
            | AppError::LLMApi(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Structured error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match &self {
            AppError::Internal(detail) => {
                tracing::error!(detail, "Internal error");
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code(),
                message,
            },
        };

        (self.status(), Json(body)).into_response()
    }
}

pub type AppResult<T> = std::result::Result<T, AppError>;

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_config_defaults() {
        let config = GenerationConfig::default();
        assert_eq!(config.max_output_tokens, 3000);
        assert_eq!(config.temperature, 0.2);
        assert_eq!(config.top_p, 0.95);
    }

    #[test]
    fn test_safety_settings_cover_all_categories() {
        let settings = SafetySetting::block_only_high();
        assert_eq!(settings.len(), 4);
        assert!(settings
            .iter()
            .all(|s| s.threshold == HarmBlockThreshold::BlockOnlyHigh));

        let json = serde_json::to_value(&settings[0]).unwrap();
        assert_eq!(json["category"], "HARM_CATEGORY_HATE_SPEECH");
        assert_eq!(json["threshold"], "BLOCK_ONLY_HIGH");
    }

    #[test]
    fn test_transient_errors() {
        assert!(AppError::Network("reset".into()).is_transient());
        assert!(AppError::Unavailable("503".into()).is_transient());
        assert!(!AppError::RateLimited("429".into()).is_transient());
        assert!(!AppError::ContentBlocked("SAFETY".into()).is_transient());
        assert!(!AppError::Timeout(Duration::from_secs(1)).is_transient());
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(AppError::EmptyQuestion.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::NoDocument.status(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::RateLimited("slow down".into()).status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            AppError::UnsupportedFileType(".docx".into()).status(),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
        assert_eq!(
            AppError::Timeout(Duration::from_secs(120)).status(),
            StatusCode::GATEWAY_TIMEOUT
        );
    }
}

// Google Gemini adapter
// API Reference: https://ai.google.dev/api/generate-content

use crate::llm::provider::LLMAdapter;
use crate::types::{AppError, AppResult, LLMRequest, LLMResponse, SafetySetting, TokenUsage};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

pub const GOOGLE_API_BASE: &str = "https://generativelanguage.googleapis.com";

// Finish reasons that mean the provider withheld the answer
const BLOCKING_FINISH_REASONS: &[&str] = &[
    "SAFETY",
    "BLOCKLIST",
    "PROHIBITED_CONTENT",
    "SPII",
    "RECITATION",
];

pub struct GoogleAdapter {
    client: Client,
    api_key: String,
    base_url: String,
}

// Request types for the generateContent API
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
    generation_config: GeminiGenerationConfig,
    safety_settings: &'a [SafetySetting],
}

#[derive(Serialize)]
struct GeminiContent<'a> {
    role: &'a str,
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
    top_p: f32,
}

// Response types
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    prompt_feedback: Option<GeminiPromptFeedback>,
    usage_metadata: Option<GeminiUsage>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

#[derive(Deserialize)]
struct GeminiErrorResponse {
    error: GeminiError,
}

#[derive(Deserialize)]
struct GeminiError {
    message: String,
    status: Option<String>,
}

impl GoogleAdapter {
    pub fn new(api_key: &str) -> Self {
        Self::with_base_url(api_key, GOOGLE_API_BASE)
    }

    /// Point the adapter at another host, e.g. a proxy or a mock server.
    pub fn with_base_url(api_key: &str, base_url: &str) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }

    fn build_request(request: &LLMRequest) -> GeminiRequest<'_> {
        let contents = request
            .messages
            .iter()
            .map(|msg| GeminiContent {
                role: msg.role.as_str(),
                parts: msg
                    .parts
                    .iter()
                    .map(|text| GeminiPart { text: text.as_str() })
                    .collect(),
            })
            .collect();

        GeminiRequest {
            contents,
            generation_config: GeminiGenerationConfig {
                max_output_tokens: request.generation_config.max_output_tokens,
                temperature: request.generation_config.temperature,
                top_p: request.generation_config.top_p,
            },
            safety_settings: &request.safety_settings,
        }
    }

    fn classify_error(status: StatusCode, body: &str) -> AppError {
        let (message, api_status) = match serde_json::from_str::<GeminiErrorResponse>(body) {
            Ok(parsed) => (parsed.error.message, parsed.error.status),
            Err(_) => (body.to_string(), None),
        };
        let detail = format!("Google API error ({}): {}", status, message);

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AppError::LLMAuth(detail),
            StatusCode::TOO_MANY_REQUESTS => AppError::RateLimited(detail),
            // An invalid key comes back as 400 INVALID_ARGUMENT
            StatusCode::BAD_REQUEST if message.contains("API key") => AppError::LLMAuth(detail),
            s if s.is_server_error() => AppError::Unavailable(detail),
            _ if api_status.as_deref() == Some("RESOURCE_EXHAUSTED") => {
                AppError::RateLimited(detail)
            }
            _ => AppError::LLMApi(detail),
        }
    }

    fn into_llm_response(response: GeminiResponse) -> AppResult<LLMResponse> {
        if let Some(reason) = response
            .prompt_feedback
            .as_ref()
            .and_then(|feedback| feedback.block_reason.as_ref())
        {
            return Err(AppError::ContentBlocked(format!("prompt blocked: {}", reason)));
        }

        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| AppError::ContentBlocked("no candidates returned".to_string()))?;

        let finish_reason = candidate
            .finish_reason
            .unwrap_or_else(|| "FINISH_REASON_UNSPECIFIED".to_string());

        if BLOCKING_FINISH_REASONS.contains(&finish_reason.as_str()) {
            return Err(AppError::ContentBlocked(format!(
                "response blocked: {}",
                finish_reason
            )));
        }

        let content: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(AppError::LLMApi(format!(
                "empty response (finish reason {})",
                finish_reason
            )));
        }

        let usage = response
            .usage_metadata
            .map(|u| TokenUsage {
                prompt_tokens: u.prompt_token_count,
                completion_tokens: u.candidates_token_count,
                total_tokens: u.total_token_count,
            })
            .unwrap_or_default();

        Ok(LLMResponse {
            content,
            finish_reason,
            usage,
        })
    }
}

#[async_trait]
impl LLMAdapter for GoogleAdapter {
    async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
        let url = self.endpoint(&request.model);
        let body = Self::build_request(request);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Network(format!("Google request failed: {}", e)))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(Self::classify_error(status, &error_text));
        }

        let gemini_response: GeminiResponse = response
            .json()
            .await
            .map_err(|e| AppError::LLMApi(format!("Failed to parse Google response: {}", e)))?;

        Self::into_llm_response(gemini_response)
    }
}

/// Gemini model identifiers
pub mod models {
    pub const GEMINI_1_5_FLASH_001: &str = "gemini-1.5-flash-001";

    pub const DEFAULT: &str = GEMINI_1_5_FLASH_001;
}

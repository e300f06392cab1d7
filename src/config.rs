use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = crate::llm::google::models::DEFAULT;
pub const DEFAULT_API_BASE: &str = crate::llm::google::GOOGLE_API_BASE;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub llm: LLMConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub cors_allowed_origins: Vec<String>,
    pub max_upload_bytes: usize,
}

#[derive(Clone, Deserialize)]
pub struct LLMConfig {
    pub google_api_key: String,
    pub model: String,
    pub api_base: String,
    pub request_timeout_secs: u64,
    pub max_retries: u32,
}

// Keeps the credential out of logs.
impl std::fmt::Debug for LLMConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LLMConfig")
            .field("google_api_key", &"<redacted>")
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl LLMConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub idle_ttl_secs: u64,
}

impl SessionConfig {
    pub fn idle_ttl(&self) -> Duration {
        Duration::from_secs(self.idle_ttl_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                port: 3000,
                host: "0.0.0.0".to_string(),
                cors_allowed_origins: vec!["http://localhost:3000".to_string()],
                max_upload_bytes: 200 * 1024 * 1024,
            },
            llm: LLMConfig {
                google_api_key: String::new(),
                model: DEFAULT_MODEL.to_string(),
                api_base: DEFAULT_API_BASE.to_string(),
                request_timeout_secs: 120,
                max_retries: 2,
            },
            session: SessionConfig {
                idle_ttl_secs: 3600,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Config::default();

        Ok(Self {
            server: ServerConfig {
                port: env::var("PORT")
                    .unwrap_or_else(|_| defaults.server.port.to_string())
                    .parse()
                    .context("PORT must be a valid port number")?,
                host: env::var("HOST").unwrap_or(defaults.server.host),
                cors_allowed_origins: env::var("ALLOWED_ORIGINS")
                    .map(|origins| parse_origins(&origins))
                    .unwrap_or(defaults.server.cors_allowed_origins),
                max_upload_bytes: env::var("MAX_UPLOAD_BYTES")
                    .unwrap_or_else(|_| defaults.server.max_upload_bytes.to_string())
                    .parse()
                    .context("MAX_UPLOAD_BYTES must be a byte count")?,
            },
            llm: LLMConfig {
                google_api_key: env::var("GOOGLE_API_KEY")
                    .ok()
                    .filter(|key| !key.trim().is_empty())
                    .context("GOOGLE_API_KEY must be set")?,
                model: env::var("GOOGLE_MODEL").unwrap_or(defaults.llm.model),
                api_base: env::var("GOOGLE_API_BASE").unwrap_or(defaults.llm.api_base),
                request_timeout_secs: env::var("LLM_TIMEOUT_SECS")
                    .unwrap_or_else(|_| defaults.llm.request_timeout_secs.to_string())
                    .parse()
                    .context("LLM_TIMEOUT_SECS must be a number of seconds")?,
                max_retries: env::var("LLM_MAX_RETRIES")
                    .unwrap_or_else(|_| defaults.llm.max_retries.to_string())
                    .parse()
                    .context("LLM_MAX_RETRIES must be a non-negative integer")?,
            },
            session: SessionConfig {
                idle_ttl_secs: env::var("SESSION_IDLE_TTL_SECS")
                    .unwrap_or_else(|_| defaults.session.idle_ttl_secs.to_string())
                    .parse()
                    .context("SESSION_IDLE_TTL_SECS must be a number of seconds")?,
            },
        })
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_origins() {
        assert_eq!(
            parse_origins("http://localhost:3000, https://example.com ,"),
            vec!["http://localhost:3000", "https://example.com"]
        );
        assert_eq!(parse_origins("*"), vec!["*"]);
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let mut config = Config::default();
        config.llm.google_api_key = "super-secret".to_string();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.llm.model, DEFAULT_MODEL);
        assert_eq!(config.llm.request_timeout(), Duration::from_secs(120));
        assert_eq!(config.server.max_upload_bytes, 209_715_200);
    }
}

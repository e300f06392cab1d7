use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use tracing::{debug, info};

use crate::config::LLMConfig;
use crate::types::{AppError, AppResult, LLMProvider, LLMRequest, LLMResponse};
use crate::utils::{with_retry, RetryPolicy};

#[async_trait]
pub trait LLMAdapter: Send + Sync {
    async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse>;
}

/// Provider-neutral completion client: bounds each attempt with a timeout
/// and retries transient failures.
pub struct LLM {
    adapter: Arc<dyn LLMAdapter>,
    provider: LLMProvider,
    timeout: Duration,
    retry: RetryPolicy,
}

impl LLM {
    pub fn new(config: &LLMConfig) -> Self {
        let adapter = crate::llm::google::GoogleAdapter::with_base_url(
            &config.google_api_key,
            &config.api_base,
        );

        Self {
            adapter: Arc::new(adapter),
            provider: LLMProvider::Google,
            timeout: config.request_timeout(),
            retry: RetryPolicy::new(config.max_retries),
        }
    }

    /// Wrap an arbitrary adapter, e.g. a stub in tests.
    pub fn from_adapter(
        adapter: Arc<dyn LLMAdapter>,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            adapter,
            provider: LLMProvider::Google,
            timeout,
            retry,
        }
    }

    pub async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
        debug!(provider = %self.provider, model = %request.model, "Sending completion request");

        let response = with_retry(self.retry, || {
            let adapter = Arc::clone(&self.adapter);
            let timeout = self.timeout;
            async move {
                tokio::time::timeout(timeout, adapter.create_chat_completion(request))
                    .await
                    .map_err(|_| AppError::Timeout(timeout))?
            }
            .boxed()
        })
        .await?;

        info!(
            provider = %self.provider,
            finish_reason = %response.finish_reason,
            prompt_tokens = response.usage.prompt_tokens,
            completion_tokens = response.usage.completion_tokens,
            "Completion received"
        );

        Ok(response)
    }
}

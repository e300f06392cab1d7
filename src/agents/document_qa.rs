//! Document Q&A Agent
//!
//! Answers a question about an uploaded document with a single completion
//! call. The prompt is three positional text parts: the document text, a
//! fixed instruction asking for page/line references in a table, and the
//! user's question.

use std::sync::Arc;

use crate::llm::provider::LLM;
use crate::types::{AppResult, GenerationConfig, LLMMessage, LLMRequest, SafetySetting};
use tracing::info;

pub const DOCUMENT_INSTRUCTION: &str = "Go through the document and answer the following question: (Please present the exact lines in the respective page no and Line number): present it in a table format:";

pub struct DocumentQaAgent {
    llm: Arc<LLM>,
    model: String,
}

impl DocumentQaAgent {
    pub fn new(llm: Arc<LLM>, model: impl Into<String>) -> Self {
        Self {
            llm,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn build_request(&self, document_text: &str, question: &str) -> LLMRequest {
        LLMRequest {
            model: self.model.clone(),
            messages: vec![LLMMessage::user(vec![
                document_text.to_string(),
                DOCUMENT_INSTRUCTION.to_string(),
                question.to_string(),
            ])],
            generation_config: GenerationConfig::default(),
            safety_settings: SafetySetting::block_only_high(),
        }
    }

    /// Ask the model and wait for the complete answer.
    pub async fn answer(&self, document_text: &str, question: &str) -> AppResult<String> {
        info!(
            model = %self.model,
            document_len = document_text.len(),
            question_len = question.len(),
            "Answering document question"
        );

        let request = self.build_request(document_text, question);
        let response = self.llm.create_chat_completion(&request).await?;

        Ok(response.content)
    }
}

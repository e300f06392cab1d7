use std::sync::Arc;

use crate::agents::DocumentQaAgent;
use crate::config::Config;
use crate::llm::LLM;
use crate::session::SessionRegistry;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub sessions: SessionRegistry,
    pub qa_agent: Arc<DocumentQaAgent>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let llm = Arc::new(LLM::new(&config.llm));
        let qa_agent = Arc::new(DocumentQaAgent::new(llm, config.llm.model.clone()));
        Self::with_agent(config, qa_agent)
    }

    pub fn with_agent(config: Config, qa_agent: Arc<DocumentQaAgent>) -> Self {
        Self {
            config,
            sessions: SessionRegistry::default(),
            qa_agent,
        }
    }
}

// API Request/Response types

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AskRequest {
    pub question: String,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct InputRequest {
    pub text: String,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub model: String,
    pub active_sessions: usize,
}

//! Per-user sessions
//!
//! A [`Session`] owns one user's uploaded document, conversation and text
//! box value. Sessions live in the process-wide [`SessionRegistry`]; each one
//! sits behind its own mutex so a user's actions run one at a time while
//! different users never contend.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

use crate::agents::DocumentQaAgent;
use crate::documents::{DocumentSummary, ExtractedDocument};
use crate::types::{AppError, AppResult};

pub const STATUS_NO_DOCUMENT: &str = "Please upload a PDF or TXT file.";
pub const STATUS_READY: &str = "File uploaded and text extracted. You can now ask questions.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub question: String,
    pub answer: String,
}

/// Snapshot returned to the page after every action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub status: String,
    pub document: Option<DocumentSummary>,
    pub input_text: String,
    pub conversation: Vec<Turn>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct Session {
    id: Uuid,
    document: Option<ExtractedDocument>,
    conversation: Vec<Turn>,
    input_text: String,
    created_at: DateTime<Utc>,
    last_active: Instant,
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            document: None,
            conversation: Vec::new(),
            input_text: String::new(),
            created_at: Utc::now(),
            last_active: Instant::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn document(&self) -> Option<&ExtractedDocument> {
        self.document.as_ref()
    }

    pub fn conversation(&self) -> &[Turn] {
        &self.conversation
    }

    pub fn input_text(&self) -> &str {
        &self.input_text
    }

    pub fn idle_for(&self) -> Duration {
        self.last_active.elapsed()
    }

    fn touch(&mut self) {
        self.last_active = Instant::now();
    }

    pub fn view(&self) -> SessionView {
        let status = if self.document.is_some() {
            STATUS_READY
        } else {
            STATUS_NO_DOCUMENT
        };

        SessionView {
            session_id: self.id,
            status: status.to_string(),
            document: self.document.as_ref().map(DocumentSummary::from),
            input_text: self.input_text.clone(),
            conversation: self.conversation.clone(),
            created_at: self.created_at,
        }
    }

    /// Replace the current document. The conversation is kept.
    pub fn load_document(&mut self, document: ExtractedDocument) {
        info!(
            session_id = %self.id,
            filename = %document.filename,
            kind = %document.kind,
            pages = document.page_count,
            "Document loaded"
        );
        self.document = Some(document);
        self.touch();
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input_text = text.into();
        self.touch();
    }

    /// Reset the text box. Never touches the conversation.
    pub fn clear_input(&mut self) {
        self.input_text.clear();
        self.touch();
    }

    pub fn end_conversation(&mut self) {
        debug!(session_id = %self.id, turns = self.conversation.len(), "Ending conversation");
        self.conversation.clear();
        self.touch();
    }

    /// Ask a question about the loaded document. Empty questions and
    /// sessions without a document are rejected before any remote call.
    /// The session changes only when the model answers.
    pub async fn ask(&mut self, question: &str, agent: &DocumentQaAgent) -> AppResult<&Turn> {
        if question.trim().is_empty() {
            return Err(AppError::EmptyQuestion);
        }
        let document = self.document.as_ref().ok_or(AppError::NoDocument)?;

        let answer = agent.answer(&document.text, question).await?;

        self.input_text = question.to_string();
        self.conversation.push(Turn {
            question: question.to_string(),
            answer,
        });
        self.touch();

        debug!(session_id = %self.id, turns = self.conversation.len(), "Turn appended");

        Ok(&self.conversation[self.conversation.len() - 1])
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

pub type SharedSession = Arc<Mutex<Session>>;

#[derive(Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<RwLock<HashMap<Uuid, SharedSession>>>,
}

impl SessionRegistry {
    pub async fn create(&self) -> SessionView {
        let session = Session::new();
        let view = session.view();

        let mut guard = self.inner.write().await;
        guard.insert(session.id(), Arc::new(Mutex::new(session)));

        info!(session_id = %view.session_id, active = guard.len(), "Session created");
        view
    }

    pub async fn get(&self, session_id: Uuid) -> AppResult<SharedSession> {
        let guard = self.inner.read().await;
        guard
            .get(&session_id)
            .cloned()
            .ok_or(AppError::SessionNotFound(session_id))
    }

    pub async fn remove(&self, session_id: Uuid) -> AppResult<()> {
        let mut guard = self.inner.write().await;
        guard
            .remove(&session_id)
            .map(|_| info!(%session_id, "Session destroyed"))
            .ok_or(AppError::SessionNotFound(session_id))
    }

    /// Drop sessions idle for longer than `ttl`. Sessions busy with a
    /// request are skipped.
    pub async fn purge_idle(&self, ttl: Duration) -> usize {
        let mut guard = self.inner.write().await;
        let before = guard.len();

        guard.retain(|_, session| {
            session
                .try_lock()
                .map_or(true, |session| session.idle_for() <= ttl)
        });

        let purged = before - guard.len();
        if purged > 0 {
            info!(purged, remaining = guard.len(), "Purged idle sessions");
        }
        purged
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::documents::DocumentProcessor;
    use crate::llm::provider::{LLMAdapter, LLM};
    use crate::types::{LLMRequest, LLMResponse, TokenUsage};
    use crate::utils::RetryPolicy;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    type ErrorFactory = Box<dyn Fn() -> AppError + Send + Sync>;

    /// Answers every request with a fixed reply, or a fresh copy of one error.
    pub(crate) struct StubAdapter {
        pub(crate) reply: Result<String, ErrorFactory>,
        pub(crate) calls: AtomicUsize,
    }

    impl StubAdapter {
        pub(crate) fn answering(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply.to_string()),
                calls: AtomicUsize::new(0),
            })
        }

        pub(crate) fn failing(error: impl Fn() -> AppError + Send + Sync + 'static) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(Box::new(error)),
                calls: AtomicUsize::new(0),
            })
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LLMAdapter for StubAdapter {
        async fn create_chat_completion(&self, _request: &LLMRequest) -> AppResult<LLMResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Ok(content) => Ok(LLMResponse {
                    content: content.clone(),
                    finish_reason: "STOP".to_string(),
                    usage: TokenUsage::default(),
                }),
                Err(make_error) => Err(make_error()),
            }
        }
    }

    pub(crate) fn agent_for(adapter: Arc<StubAdapter>) -> DocumentQaAgent {
        let llm = LLM::from_adapter(adapter, Duration::from_secs(5), RetryPolicy::new(0));
        DocumentQaAgent::new(Arc::new(llm), "gemini-test")
    }

    fn session_with_notes() -> Session {
        let mut session = Session::new();
        let doc = DocumentProcessor::process("notes.txt", b"Revenue grew 5%.").unwrap();
        session.load_document(doc);
        session
    }

    #[tokio::test]
    async fn test_revenue_example() {
        let adapter = StubAdapter::answering("Revenue grew 5% (page 1, line 1).");
        let agent = agent_for(adapter.clone());
        let mut session = session_with_notes();

        session
            .ask("What happened to revenue?", &agent)
            .await
            .unwrap();

        assert_eq!(
            session.conversation(),
            &[Turn {
                question: "What happened to revenue?".to_string(),
                answer: "Revenue grew 5% (page 1, line 1).".to_string(),
            }]
        );
        assert_eq!(adapter.calls(), 1);
    }

    #[tokio::test]
    async fn test_successful_ask_appends_exactly_one_turn() {
        let adapter = StubAdapter::answering("answer");
        let agent = agent_for(adapter);
        let mut session = session_with_notes();

        for i in 0..3 {
            let before = session.conversation().len();
            let question = format!("question {}", i);
            let turn = session.ask(&question, &agent).await.unwrap().clone();

            assert_eq!(session.conversation().len(), before + 1);
            assert_eq!(turn.question, question);
            assert_eq!(session.conversation().last(), Some(&turn));
        }
        assert_eq!(session.conversation()[0].question, "question 0");
    }

    #[tokio::test]
    async fn test_empty_question_never_calls_model() {
        let adapter = StubAdapter::answering("unused");
        let agent = agent_for(adapter.clone());
        let mut session = session_with_notes();

        for question in ["", "   ", "\n\t"] {
            let result = session.ask(question, &agent).await;
            assert!(matches!(result, Err(AppError::EmptyQuestion)));
        }

        assert_eq!(adapter.calls(), 0);
        assert!(session.conversation().is_empty());
    }

    #[tokio::test]
    async fn test_ask_without_document_is_rejected() {
        let adapter = StubAdapter::answering("unused");
        let agent = agent_for(adapter.clone());
        let mut session = Session::new();

        let result = session.ask("Anything?", &agent).await;
        assert!(matches!(result, Err(AppError::NoDocument)));
        assert_eq!(adapter.calls(), 0);
    }

    #[tokio::test]
    async fn test_failed_call_keeps_state() {
        let good = agent_for(StubAdapter::answering("first answer"));
        let bad = agent_for(StubAdapter::failing(|| AppError::RateLimited("quota".into())));
        let mut session = session_with_notes();
        session.ask("first", &good).await.unwrap();
        session.clear_input();

        let result = session.ask("second", &bad).await;

        assert!(matches!(result, Err(AppError::RateLimited(_))));
        assert_eq!(session.input_text(), "");
        assert_eq!(session.conversation().len(), 1);
        assert_eq!(session.conversation()[0].answer, "first answer");
        assert_eq!(session.document().unwrap().text, "Revenue grew 5%.");
    }

    #[tokio::test]
    async fn test_end_conversation_empties_list() {
        let agent = agent_for(StubAdapter::answering("a"));
        let mut session = session_with_notes();
        for q in ["one", "two", "three", "four"] {
            session.ask(q, &agent).await.unwrap();
        }
        session.set_input("draft");

        session.end_conversation();

        assert!(session.conversation().is_empty());
        assert!(session.document().is_some());
        assert_eq!(session.input_text(), "draft");

        // Idempotent on an empty conversation
        session.end_conversation();
        assert!(session.conversation().is_empty());
    }

    #[tokio::test]
    async fn test_clear_input_keeps_conversation() {
        let agent = agent_for(StubAdapter::answering("a"));
        let mut session = session_with_notes();
        session.ask("What happened to revenue?", &agent).await.unwrap();
        assert_eq!(session.input_text(), "What happened to revenue?");

        session.clear_input();

        assert_eq!(session.input_text(), "");
        assert_eq!(session.conversation().len(), 1);
    }

    #[test]
    fn test_new_upload_replaces_document() {
        let mut session = session_with_notes();
        session.load_document(DocumentProcessor::process("second.txt", b"Costs fell.").unwrap());

        let view = session.view();
        assert_eq!(view.status, STATUS_READY);
        assert_eq!(view.document.unwrap().filename, "second.txt");
        assert_eq!(session.document().unwrap().text, "Costs fell.");
    }

    #[test]
    fn test_view_without_document() {
        let view = Session::new().view();
        assert_eq!(view.status, STATUS_NO_DOCUMENT);
        assert!(view.document.is_none());
        assert!(view.conversation.is_empty());
    }

    #[tokio::test]
    async fn test_registry_lifecycle() {
        let registry = SessionRegistry::default();
        let view = registry.create().await;
        assert_eq!(registry.len().await, 1);

        let session = registry.get(view.session_id).await.unwrap();
        session.lock().await.set_input("hello");
        assert_eq!(
            registry.get(view.session_id).await.unwrap().lock().await.input_text(),
            "hello"
        );

        registry.remove(view.session_id).await.unwrap();
        assert!(registry.is_empty().await);
        assert!(matches!(
            registry.get(view.session_id).await,
            Err(AppError::SessionNotFound(_))
        ));
        assert!(registry.remove(view.session_id).await.is_err());
    }

    #[tokio::test]
    async fn test_purge_idle_sessions() {
        let registry = SessionRegistry::default();
        let stale = registry.create().await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        let fresh = registry.create().await;

        let purged = registry.purge_idle(Duration::from_millis(20)).await;

        assert_eq!(purged, 1);
        assert!(registry.get(stale.session_id).await.is_err());
        assert!(registry.get(fresh.session_id).await.is_ok());
    }

    #[tokio::test]
    async fn test_purge_skips_busy_sessions() {
        let registry = SessionRegistry::default();
        let view = registry.create().await;
        tokio::time::sleep(Duration::from_millis(30)).await;

        let session = registry.get(view.session_id).await.unwrap();
        let _busy = session.lock().await;

        assert_eq!(registry.purge_idle(Duration::from_millis(20)).await, 0);
        assert_eq!(registry.len().await, 1);
    }
}

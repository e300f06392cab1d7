use axum::{
    extract::State,
    routing::{post, put},
    Json, Router,
};
use tracing::{info, warn};
use uuid::Uuid;

use super::extract::{ApiJson, ApiPath};
use crate::models::{AppState, AskRequest, InputRequest};
use crate::session::SessionView;
use crate::types::AppResult;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/sessions/{id}/ask", post(ask))
        .route("/api/sessions/{id}/input", put(set_input))
        .route("/api/sessions/{id}/clear", post(clear_input))
        .route("/api/sessions/{id}/end", post(end_conversation))
        .with_state(state)
}

/// Submit a question. The session stays locked until the model answers.
async fn ask(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<AskRequest>,
) -> AppResult<Json<SessionView>> {
    let session = state.sessions.get(id).await?;
    let mut session = session.lock().await;

    info!(session_id = %id, question_len = request.question.len(), "Question received");

    if let Err(e) = session.ask(&request.question, &state.qa_agent).await {
        warn!(session_id = %id, error = %e, "Question failed");
        return Err(e);
    }

    Ok(Json(session.view()))
}

async fn set_input(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<InputRequest>,
) -> AppResult<Json<SessionView>> {
    let session = state.sessions.get(id).await?;
    let mut session = session.lock().await;
    session.set_input(request.text);
    Ok(Json(session.view()))
}

async fn clear_input(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<SessionView>> {
    let session = state.sessions.get(id).await?;
    let mut session = session.lock().await;
    session.clear_input();
    Ok(Json(session.view()))
}

async fn end_conversation(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<SessionView>> {
    let session = state.sessions.get(id).await?;
    let mut session = session.lock().await;
    session.end_conversation();
    Ok(Json(session.view()))
}

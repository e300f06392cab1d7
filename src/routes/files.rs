use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    routing::post,
    Json, Router,
};
use tokio::task::JoinError;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::extract::ApiPath;
use crate::documents::{DocumentKind, DocumentProcessor};
use crate::models::AppState;
use crate::session::SessionView;
use crate::types::{AppError, AppResult};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/sessions/{id}/document", post(upload_document))
        .with_state(state)
}

/// Multipart upload; the file goes in the `file` field.
async fn upload_document(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<SessionView>> {
    let session = state.sessions.get(id).await?;
    let mut multipart = multipart?;

    let mut upload: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidRequest(format!("Malformed upload: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or("document").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::InvalidRequest(format!("Failed to read upload: {}", e)))?;
        upload = Some((filename, bytes.to_vec()));
    }

    let (filename, bytes) =
        upload.ok_or_else(|| AppError::InvalidRequest("No file provided".to_string()))?;

    info!(session_id = %id, %filename, size = bytes.len(), "Document upload received");

    let kind = DocumentKind::from_filename(&filename).ok();
    let document = tokio::task::spawn_blocking(move || DocumentProcessor::process(&filename, &bytes))
        .await
        .map_err(|e| extraction_task_error(kind, e))?
        .inspect_err(|e| warn!(session_id = %id, error = %e, "Document extraction failed"))?;

    let mut session = session.lock().await;
    session.load_document(document);

    Ok(Json(session.view()))
}

/// A panic inside the PDF parser means the file is malformed.
fn extraction_task_error(kind: Option<DocumentKind>, err: JoinError) -> AppError {
    if err.is_panic() && kind == Some(DocumentKind::Pdf) {
        error!("PDF parser panicked on upload");
        return AppError::PdfParse("malformed PDF".to_string());
    }
    AppError::Internal(format!("Extraction task failed: {}", err))
}

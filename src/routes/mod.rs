//! API Routes
//!
//! - `/` - The single-page UI
//! - `/api/health` - Health check
//! - `/api/sessions` - Create, read and destroy sessions
//! - `/api/sessions/{id}/document` - Document upload
//! - `/api/sessions/{id}/{ask,input,clear,end}` - Chat actions
//!
//! Every session action answers with the updated session view.

pub mod chat;
mod extract;
pub mod files;
pub mod health;
pub mod sessions;
pub mod ui;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::middleware::apply_cors;
use crate::models::AppState;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    info!("Creating application router");

    let max_upload_bytes = state.config.server.max_upload_bytes;
    let allowed_origins = state.config.server.cors_allowed_origins.clone();

    let router = Router::new()
        .merge(ui::router())
        .merge(health::router(state.clone()))
        .merge(sessions::router(state.clone()))
        .merge(files::router(state.clone()))
        .merge(chat::router(state))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http());

    apply_cors(router, &allowed_origins)
}

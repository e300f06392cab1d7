// Insight Extractor - ask questions about an uploaded PDF or text document

pub mod config;
pub mod models;
pub mod types;
pub mod agents;
pub mod documents;
pub mod llm;
pub mod session;
pub mod routes;
pub mod middleware;
pub mod utils;

// Re-exports for convenience
pub use config::Config;
pub use models::AppState;

pub fn create_router(state: AppState) -> axum::Router {
    routes::create_router(state)
}

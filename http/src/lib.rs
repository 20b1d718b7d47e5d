use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use docqa_application::{AskUseCase, UploadDocsUseCase};
use docqa_configuration::ServerConfig;
use tower_http::trace::TraceLayer;

pub mod error;
pub mod extract;
pub mod handlers;

pub use error::{error_mapper, HttpError};
pub use extract::{UploadPayload, ValidatedJson};
pub use handlers::*;

#[derive(Clone)]
pub struct AppState {
    pub upload: Arc<dyn UploadDocsUseCase>,
    pub ask: Arc<dyn AskUseCase>,
}

impl AppState {
    pub fn new(upload: Arc<dyn UploadDocsUseCase>, ask: Arc<dyn AskUseCase>) -> Self {
        Self { upload, ask }
    }
}

pub fn create_app_routes(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/v1/upload-docs", post(upload_docs))
        .route("/api/v1/docs", get(list_docs).delete(clear_docs))
        .route("/api/v1/ask", post(ask_question))
        .layer(DefaultBodyLimit::max(config.body_limit_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

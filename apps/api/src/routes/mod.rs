pub mod health;
pub mod resumes;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // Resume API
        .route("/api/resumes", get(resumes::handle_list_resumes))
        .route("/api/resumes/", get(resumes::handle_list_resumes))
        .route("/api/resumes/upload", post(resumes::handle_upload_resume))
        .route("/api/resumes/:id", get(resumes::handle_get_resume))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

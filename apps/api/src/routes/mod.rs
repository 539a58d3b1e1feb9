pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::ranking::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Ranking API
        .route("/extract-criteria", post(handlers::handle_extract_criteria))
        .route("/score-resumes", post(handlers::handle_score_resumes))
        .with_state(state)
}

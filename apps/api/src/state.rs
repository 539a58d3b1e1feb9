use std::sync::Arc;

use crate::llm_client::ChatModel;
use crate::ranking::pipeline::AllZeroPolicy;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Chat-completion provider. `LlmClient` in production, a scripted fake in tests.
    pub llm: Arc<dyn ChatModel>,
    pub scoring_concurrency: usize,
    pub all_zero_policy: AllZeroPolicy,
}

//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use fit_advisor_core::charts::SizeChartStore;
use fit_advisor_core::chat::{ChatAssistant, ChatSessionStore};
use fit_advisor_core::jobs::JobStore;
use fit_advisor_core::ports::{GenerationService, KeyValueStore};
use fit_advisor_core::recommend::RecommendationEngine;
use fit_advisor_core::tryon::TryOnPipeline;
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub generator: Arc<dyn GenerationService>,
    pub charts: Arc<SizeChartStore>,
    pub recommender: Arc<RecommendationEngine>,
    pub tryon: Arc<TryOnPipeline>,
    pub jobs: JobStore,
    pub assistant: Arc<ChatAssistant>,
}

impl AppState {
    /// Wires every core component onto the two port implementations.
    pub fn new(
        config: Arc<Config>,
        generator: Arc<dyn GenerationService>,
        kv: Arc<dyn KeyValueStore>,
    ) -> Self {
        let charts = Arc::new(SizeChartStore::builtin());
        let jobs = JobStore::new(kv.clone());
        let sessions =
            ChatSessionStore::new(kv, config.chat_max_history, config.chat_session_ttl);

        Self {
            recommender: Arc::new(RecommendationEngine::new(charts.clone(), generator.clone())),
            tryon: Arc::new(TryOnPipeline::new(
                generator.clone(),
                charts.clone(),
                jobs.clone(),
            )),
            assistant: Arc::new(ChatAssistant::new(generator.clone(), sessions)),
            jobs,
            charts,
            generator,
            config,
        }
    }
}

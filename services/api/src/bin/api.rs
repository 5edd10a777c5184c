//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{MemoryKvAdapter, OpenAiGenerationAdapter, UnavailableGenerationAdapter},
    config::Config,
    error::ApiError,
    web::{build_router, state::AppState},
};
use fit_advisor_core::ports::{GenerationService, KeyValueStore};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Initialize Service Adapters ---
    let generator: Arc<dyn GenerationService> = match config.gemini_api_key.as_deref() {
        Some(key) => {
            info!(
                "Generation client targets {} (text: {}, vision: {})",
                config.generation_api_base, config.text_model, config.vision_model
            );
            Arc::new(OpenAiGenerationAdapter::from_config(&config, key))
        }
        None => {
            warn!("GEMINI_API_KEY is not set; AI features will answer 503");
            Arc::new(UnavailableGenerationAdapter)
        }
    };
    let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryKvAdapter::new());

    // --- 3. Build the Shared AppState and Router ---
    let app_state = Arc::new(AppState::new(config.clone(), generator, kv));
    let app = build_router(app_state)?;

    // --- 4. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

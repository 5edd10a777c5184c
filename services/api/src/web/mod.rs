pub mod chat;
pub mod protocol;
pub mod rest;
pub mod state;
pub mod tryon;

use axum::{
    extract::DefaultBodyLimit,
    http::{header::ACCEPT, header::CONTENT_TYPE, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::error::ApiError;
use rest::ApiDoc;
use state::AppState;

/// Two photos plus the form fields.
const MAX_BODY_BYTES: usize = 12 * 1024 * 1024;

/// Builds the complete application: API routes, CORS, and the Swagger UI.
///
/// A wildcard origin is refused because the CORS layer allows credentials.
pub fn build_router(app_state: Arc<AppState>) -> Result<Router, ApiError> {
    if app_state.config.cors_origin.trim() == "*" {
        return Err(ApiError::Internal(
            "CORS_ORIGIN must name an origin when credentials are allowed".to_string(),
        ));
    }
    let origin = app_state
        .config
        .cors_origin
        .parse::<HeaderValue>()
        .map_err(|e| ApiError::Internal(format!("Invalid CORS_ORIGIN: {}", e)))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT]);

    let ai_routes = Router::new()
        .route("/size-recommend", post(rest::size_recommend_handler))
        .route("/size-guide/{category}", get(rest::size_guide_handler))
        .route("/try-on", post(tryon::try_on_handler))
        .route("/try-on/{job_id}", get(rest::try_on_result_handler))
        .route("/jobs/{job_id}", get(rest::job_status_handler))
        .route("/chat", post(chat::chat_handler))
        .route(
            "/chat/sessions/{session_id}",
            get(rest::session_history_handler).delete(rest::delete_session_handler),
        );

    let api_router = Router::new()
        .route("/health", get(rest::health_handler))
        .nest("/ai", ai_routes)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    Ok(Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())))
}

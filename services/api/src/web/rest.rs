//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the JSON endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::protocol::{
    ChatReplyData, ChatRequest, ChatResponse, HealthResponse, JobResponse, MessageResponse,
    SessionHistoryData, SessionHistoryResponse, SizeGuideData, SizeGuideResponse,
    SizeRecommendRequest, SizeRecommendResponse,
};
use crate::web::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use fit_advisor_core::domain::FitPreference;
use fit_advisor_core::ports::PortError;
use fit_advisor_core::recommend::SizeRequest;
use std::sync::Arc;
use tracing::{error, warn};
use utoipa::OpenApi;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        size_recommend_handler,
        size_guide_handler,
        crate::web::tryon::try_on_handler,
        try_on_result_handler,
        job_status_handler,
        crate::web::chat::chat_handler,
        session_history_handler,
        delete_session_handler,
    ),
    components(
        schemas(
            HealthResponse,
            SizeRecommendRequest,
            SizeRecommendResponse,
            SizeGuideData,
            SizeGuideResponse,
            JobResponse,
            ChatRequest,
            ChatReplyData,
            ChatResponse,
            SessionHistoryData,
            SessionHistoryResponse,
            MessageResponse,
        )
    ),
    tags(
        (name = "Fit Advisor API", description = "Size recommendation, virtual try-on and shopping chat.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Error Mapping
//=========================================================================================

/// Maps a core error onto the HTTP status the API reports for it.
pub fn port_error_response(e: PortError) -> (StatusCode, String) {
    let status = match &e {
        PortError::Validation(_) => StatusCode::BAD_REQUEST,
        PortError::NotFound(_) => StatusCode::NOT_FOUND,
        PortError::IllegalTransition { .. } => StatusCode::CONFLICT,
        PortError::CollaboratorUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        PortError::MalformedResponse(_) => StatusCode::BAD_GATEWAY,
        PortError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        error!("Request failed: {}", e);
    } else {
        warn!("Request rejected: {}", e);
    }
    (status, e.to_string())
}

fn parse_fit_preference(raw: Option<&str>) -> Result<FitPreference, PortError> {
    match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
        None | Some("") | Some("regular") => Ok(FitPreference::Regular),
        Some("slim") => Ok(FitPreference::Slim),
        Some("loose") => Ok(FitPreference::Loose),
        Some(other) => Err(PortError::Validation(format!(
            "fit_preference must be slim, regular or loose, got {}",
            other
        ))),
    }
}

fn size_request(payload: &SizeRecommendRequest) -> Result<SizeRequest, PortError> {
    Ok(SizeRequest {
        product_id: payload.product_id.clone(),
        category: payload.product_type.parse()?,
        measurements: payload.measurements(),
        fit_preference: parse_fit_preference(payload.fit_preference.as_deref())?,
    })
}

//=========================================================================================
// Health
//=========================================================================================

/// Liveness check.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    )
)]
pub async fn health_handler(State(app_state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        generation_configured: app_state.generator.is_configured(),
    })
}

//=========================================================================================
// Size Recommendation
//=========================================================================================

/// Recommend a size from body measurements.
#[utoipa::path(
    post,
    path = "/ai/size-recommend",
    request_body = SizeRecommendRequest,
    responses(
        (status = 200, description = "Recommendation computed", body = SizeRecommendResponse),
        (status = 400, description = "A measurement is out of range"),
        (status = 404, description = "Unknown product type")
    )
)]
pub async fn size_recommend_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<SizeRecommendRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let request = size_request(&payload).map_err(port_error_response)?;

    let recommendation = app_state
        .recommender
        .recommend(&request)
        .await
        .map_err(port_error_response)?;

    Ok(Json(SizeRecommendResponse {
        success: true,
        data: recommendation,
    }))
}

/// Readable size chart for a product type.
#[utoipa::path(
    get,
    path = "/ai/size-guide/{category}",
    params(
        ("category" = String, Path, description = "Product type, e.g. `upper-body`.")
    ),
    responses(
        (status = 200, description = "The size chart", body = SizeGuideResponse),
        (status = 404, description = "Unknown product type")
    )
)]
pub async fn size_guide_handler(
    State(app_state): State<Arc<AppState>>,
    Path(category): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let (category, chart) = app_state
        .charts
        .chart_by_name(&category)
        .map_err(port_error_response)?;

    Ok(Json(SizeGuideResponse {
        success: true,
        data: SizeGuideData {
            product_type: category.to_string(),
            size_chart: chart.readable(),
        },
    }))
}

//=========================================================================================
// Jobs
//=========================================================================================

async fn lookup_job(
    app_state: &AppState,
    job_id: &str,
) -> Result<Json<JobResponse>, (StatusCode, String)> {
    let job = app_state.jobs.get(job_id).await.map_err(port_error_response)?;
    Ok(Json(JobResponse::from(job)))
}

/// Fetch a try-on job and its result.
#[utoipa::path(
    get,
    path = "/ai/try-on/{job_id}",
    params(("job_id" = String, Path, description = "The id returned by `POST /ai/try-on`.")),
    responses(
        (status = 200, description = "The job", body = JobResponse),
        (status = 404, description = "Unknown or expired job")
    )
)]
pub async fn try_on_result_handler(
    State(app_state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    lookup_job(&app_state, &job_id).await
}

/// Fetch the status of any AI job.
#[utoipa::path(
    get,
    path = "/ai/jobs/{job_id}",
    params(("job_id" = String, Path, description = "The job id.")),
    responses(
        (status = 200, description = "The job", body = JobResponse),
        (status = 404, description = "Unknown or expired job")
    )
)]
pub async fn job_status_handler(
    State(app_state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    lookup_job(&app_state, &job_id).await
}

//=========================================================================================
// Chat Sessions
//=========================================================================================

/// The stored messages of a chat session, oldest first.
#[utoipa::path(
    get,
    path = "/ai/chat/sessions/{session_id}",
    params(("session_id" = String, Path, description = "The chat session id.")),
    responses(
        (status = 200, description = "Session history; empty for unknown sessions", body = SessionHistoryResponse)
    )
)]
pub async fn session_history_handler(
    State(app_state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let messages = app_state
        .assistant
        .sessions()
        .history(&session_id)
        .await
        .map_err(port_error_response)?;

    Ok(Json(SessionHistoryResponse {
        success: true,
        data: SessionHistoryData {
            session_id,
            messages,
        },
    }))
}

/// Forget a chat session.
#[utoipa::path(
    delete,
    path = "/ai/chat/sessions/{session_id}",
    params(("session_id" = String, Path, description = "The chat session id.")),
    responses(
        (status = 200, description = "Session deleted", body = MessageResponse)
    )
)]
pub async fn delete_session_handler(
    State(app_state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    app_state
        .assistant
        .sessions()
        .clear(&session_id)
        .await
        .map_err(port_error_response)?;

    Ok(Json(MessageResponse {
        success: true,
        message: "Session deleted".to_string(),
    }))
}

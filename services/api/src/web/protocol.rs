//! services/api/src/web/protocol.rs
//!
//! Request and response bodies of the HTTP API.
//!
//! Every response is wrapped as `{ "success": ..., "data": ... }`. Core types
//! are serialized as-is and documented as plain objects.

use fit_advisor_core::domain::{
    ChatContext, ChatMessage, JobStatus, Measurements, Metric, SizeLabel, SizeRecommendation, TryOnJob,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

//=========================================================================================
// Health
//=========================================================================================

#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    /// Whether a generation API key was supplied at startup.
    pub generation_configured: bool,
}

//=========================================================================================
// Size Recommendation
//=========================================================================================

/// The body of `POST /ai/size-recommend`. Lengths in centimeters, weight in kilograms.
#[derive(Deserialize, ToSchema)]
pub struct SizeRecommendRequest {
    pub product_id: String,
    /// `upper-body`, `lower-body` or `outerwear`.
    #[serde(default = "default_product_type")]
    pub product_type: String,
    pub height: Option<f64>,
    pub weight: Option<f64>,
    pub chest: Option<f64>,
    pub waist: Option<f64>,
    pub hips: Option<f64>,
    pub shoulder: Option<f64>,
    /// `slim`, `regular` or `loose`.
    #[serde(default)]
    pub fit_preference: Option<String>,
}

fn default_product_type() -> String {
    "upper-body".to_string()
}

impl SizeRecommendRequest {
    pub fn measurements(&self) -> Measurements {
        Measurements {
            height: self.height,
            weight: self.weight,
            chest: self.chest,
            waist: self.waist,
            hips: self.hips,
            shoulder: self.shoulder,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct SizeRecommendResponse {
    pub success: bool,
    #[schema(value_type = Object)]
    pub data: SizeRecommendation,
}

#[derive(Serialize, ToSchema)]
pub struct SizeGuideData {
    pub product_type: String,
    /// Size label to metric to a range such as `"92-98 cm"`.
    #[schema(value_type = Object)]
    pub size_chart: BTreeMap<SizeLabel, BTreeMap<Metric, String>>,
}

#[derive(Serialize, ToSchema)]
pub struct SizeGuideResponse {
    pub success: bool,
    pub data: SizeGuideData,
}

//=========================================================================================
// Try-On and Jobs
//=========================================================================================

/// A try-on job, as submitted or as later looked up.
#[derive(Serialize, ToSchema)]
pub struct JobResponse {
    /// False when the job ended in `failed`.
    pub success: bool,
    #[schema(value_type = Object)]
    pub data: TryOnJob,
}

impl From<TryOnJob> for JobResponse {
    fn from(job: TryOnJob) -> Self {
        Self {
            success: job.status != JobStatus::Failed,
            data: job,
        }
    }
}

//=========================================================================================
// Chat
//=========================================================================================

/// The body of `POST /ai/chat`.
#[derive(Deserialize, ToSchema)]
pub struct ChatRequest {
    pub message: String,
    pub session_id: Option<String>,
    /// Answer as a server-sent event stream instead of one JSON body.
    #[serde(default)]
    pub stream: bool,
    #[schema(value_type = Option<Object>)]
    pub context: Option<ChatContext>,
}

#[derive(Serialize, ToSchema)]
pub struct ChatReplyData {
    pub session_id: String,
    pub response: String,
}

#[derive(Serialize, ToSchema)]
pub struct ChatResponse {
    pub success: bool,
    pub data: ChatReplyData,
}

/// One `data:` payload of the chat event stream.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ChatStreamEvent {
    Chunk { chunk: String, done: bool },
    Done { done: bool, session_id: String },
    Error { error: String },
}

#[derive(Serialize, ToSchema)]
pub struct SessionHistoryData {
    pub session_id: String,
    #[schema(value_type = Vec<Object>)]
    pub messages: Vec<ChatMessage>,
}

#[derive(Serialize, ToSchema)]
pub struct SessionHistoryResponse {
    pub success: bool,
    pub data: SessionHistoryData,
}

#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

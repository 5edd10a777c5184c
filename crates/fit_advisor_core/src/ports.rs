//! crates/fit_advisor_core/src/ports.rs
//!
//! Defines the service contracts (traits) the core depends on.
//! These traits form the boundary of the hexagonal architecture, keeping the
//! core independent of the concrete generation client and key-value backend.

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;
use std::time::Duration;

use crate::domain::{ChatMessage, ImageInput, JobStatus};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// The error type shared by every core operation and port.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PortError {
    /// The generation service is unreachable, failed, or is not configured.
    #[error("Generation service unavailable: {0}")]
    CollaboratorUnavailable(String),
    /// The generation service answered, but not in the expected shape.
    #[error("Malformed response from generation service: {0}")]
    MalformedResponse(String),
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Job {job_id} is already {status}")]
    IllegalTransition { job_id: String, status: JobStatus },
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

/// A boxed stream of generated text chunks.
pub type TextStream = Pin<Box<dyn Stream<Item = PortResult<String>> + Send>>;

//=========================================================================================
// Generation Collaborator
//=========================================================================================

/// One request to the remote text/vision model.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub system_instruction: Option<String>,
    /// Conversation turns, oldest first. The last turn is the current prompt.
    pub turns: Vec<ChatMessage>,
    /// At most one image, attached to the last turn.
    pub image: Option<ImageInput>,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl GenerationRequest {
    /// A single-turn request with default sampling settings.
    pub fn prompt(text: impl Into<String>) -> Self {
        Self {
            system_instruction: None,
            turns: vec![ChatMessage::user(text)],
            image: None,
            temperature: 0.3,
            max_output_tokens: 1024,
        }
    }

    pub fn with_image(mut self, image: ImageInput) -> Self {
        self.image = Some(image);
        self
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn with_sampling(mut self, temperature: f32, max_output_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_output_tokens = max_output_tokens;
        self
    }
}

#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Sends one request and returns the model's full text answer.
    /// Any transport failure, including a timeout, is `CollaboratorUnavailable`.
    async fn generate(&self, request: GenerationRequest) -> PortResult<String>;

    /// Streams the answer as it is generated.
    async fn generate_stream(&self, request: GenerationRequest) -> PortResult<TextStream>;

    /// Whether credentials were supplied at startup.
    fn is_configured(&self) -> bool {
        true
    }
}

//=========================================================================================
// Key-Value Store
//=========================================================================================

/// A key-value backend with per-key expiry and simple list values.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> PortResult<Option<String>>;

    /// Writes a string value and (re)sets its time-to-live.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> PortResult<()>;

    /// Appends to the list at `key`, creating it if needed. Does not touch the expiry.
    async fn list_append(&self, key: &str, value: &str) -> PortResult<()>;

    /// Returns the whole list at `key`, oldest first. Missing keys yield an empty list.
    async fn list_range(&self, key: &str) -> PortResult<Vec<String>>;

    /// Keeps only the last `keep_last` entries of the list at `key`.
    async fn list_trim(&self, key: &str, keep_last: usize) -> PortResult<()>;

    async fn delete(&self, key: &str) -> PortResult<()>;

    async fn expire(&self, key: &str, ttl: Duration) -> PortResult<()>;
}

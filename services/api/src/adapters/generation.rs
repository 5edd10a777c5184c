//! services/api/src/adapters/generation.rs
//!
//! Adapters implementing the `GenerationService` port. The live one speaks the
//! OpenAI chat-completions protocol, which Gemini also serves, so a single
//! `async-openai` client covers text, vision and streaming calls.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestAssistantMessage, ChatCompletionRequestMessage,
        ChatCompletionRequestMessageContentPartImage, ChatCompletionRequestMessageContentPartText,
        ChatCompletionRequestSystemMessage, ChatCompletionRequestUserMessage,
        ChatCompletionRequestUserMessageContent, ChatCompletionRequestUserMessageContentPart,
        CreateChatCompletionRequest, CreateChatCompletionRequestArgs, ImageUrl,
    },
    Client,
};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use fit_advisor_core::domain::{ChatRole, ImageInput};
use fit_advisor_core::ports::{
    GenerationRequest, GenerationService, PortError, PortResult, TextStream,
};
use futures::StreamExt;
use tracing::{debug, error};

use crate::config::Config;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `GenerationService` using an OpenAI-compatible endpoint.
#[derive(Clone)]
pub struct OpenAiGenerationAdapter {
    client: Client<OpenAIConfig>,
    text_model: String,
    vision_model: String,
}

impl OpenAiGenerationAdapter {
    /// Creates a new `OpenAiGenerationAdapter`.
    pub fn new(client: Client<OpenAIConfig>, text_model: String, vision_model: String) -> Self {
        Self {
            client,
            text_model,
            vision_model,
        }
    }

    /// Builds the client for the configured endpoint and key.
    pub fn from_config(config: &Config, api_key: &str) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(&config.generation_api_base);
        Self::new(
            Client::with_config(openai_config),
            config.text_model.clone(),
            config.vision_model.clone(),
        )
    }

    fn build_request(&self, request: GenerationRequest) -> PortResult<CreateChatCompletionRequest> {
        let model = if request.image.is_some() {
            &self.vision_model
        } else {
            &self.text_model
        };

        let mut messages: Vec<ChatCompletionRequestMessage> = Vec::new();
        if let Some(instruction) = request.system_instruction {
            messages.push(ChatCompletionRequestSystemMessage::from(instruction).into());
        }

        let last = request.turns.len().saturating_sub(1);
        let mut image = request.image;
        for (i, turn) in request.turns.into_iter().enumerate() {
            let attached = if i == last { image.take() } else { None };
            let message: ChatCompletionRequestMessage = match turn.role {
                ChatRole::Model => ChatCompletionRequestAssistantMessage::from(turn.content).into(),
                ChatRole::User => match attached {
                    Some(img) => user_with_image(turn.content, &img).into(),
                    None => ChatCompletionRequestUserMessage::from(turn.content).into(),
                },
            };
            messages.push(message);
        }

        CreateChatCompletionRequestArgs::default()
            .model(model.as_str())
            .messages(messages)
            .temperature(request.temperature)
            .max_completion_tokens(request.max_output_tokens)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))
    }
}

/// A user message carrying the prompt text followed by an inline image.
fn user_with_image(text: String, image: &ImageInput) -> ChatCompletionRequestUserMessage {
    let data_url = format!("data:{};base64,{}", image.mime_type, STANDARD.encode(&image.data));
    let parts: Vec<ChatCompletionRequestUserMessageContentPart> = vec![
        ChatCompletionRequestMessageContentPartText::from(text).into(),
        ChatCompletionRequestMessageContentPartImage {
            image_url: ImageUrl {
                url: data_url,
                detail: None,
            },
        }
        .into(),
    ];
    ChatCompletionRequestUserMessageContent::Array(parts).into()
}

fn unavailable(e: OpenAIError) -> PortError {
    error!("Generation call failed: {}", e);
    PortError::CollaboratorUnavailable(e.to_string())
}

//=========================================================================================
// GenerationService Trait Implementation
//=========================================================================================

#[async_trait]
impl GenerationService for OpenAiGenerationAdapter {
    async fn generate(&self, request: GenerationRequest) -> PortResult<String> {
        let request = self.build_request(request)?;
        debug!("Sending generation request to model {}", request.model);

        let response = self.client.chat().create(request).await.map_err(unavailable)?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| PortError::MalformedResponse("Response contained no text".to_string()))
    }

    async fn generate_stream(&self, request: GenerationRequest) -> PortResult<TextStream> {
        let request = self.build_request(request)?;
        debug!("Opening generation stream to model {}", request.model);

        let upstream = self
            .client
            .chat()
            .create_stream(request)
            .await
            .map_err(unavailable)?;

        let chunks = upstream.filter_map(|item| async move {
            match item {
                Ok(chunk) => chunk
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|choice| choice.delta.content)
                    .filter(|text| !text.is_empty())
                    .map(Ok),
                Err(e) => Some(Err(unavailable(e))),
            }
        });
        Ok(Box::pin(chunks))
    }
}

//=========================================================================================
// Unconfigured Fallback
//=========================================================================================

/// Installed when no API key is configured; every call is `CollaboratorUnavailable`.
#[derive(Clone, Default)]
pub struct UnavailableGenerationAdapter;

impl UnavailableGenerationAdapter {
    fn refuse() -> PortError {
        PortError::CollaboratorUnavailable("GEMINI_API_KEY is not configured".to_string())
    }
}

#[async_trait]
impl GenerationService for UnavailableGenerationAdapter {
    async fn generate(&self, _request: GenerationRequest) -> PortResult<String> {
        Err(Self::refuse())
    }

    async fn generate_stream(&self, _request: GenerationRequest) -> PortResult<TextStream> {
        Err(Self::refuse())
    }

    fn is_configured(&self) -> bool {
        false
    }
}

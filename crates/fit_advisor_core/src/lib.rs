pub mod charts;
pub mod chat;
pub mod domain;
pub mod jobs;
pub mod payload;
pub mod ports;
pub mod prompts;
pub mod recommend;
pub mod scoring;
pub mod tryon;
pub mod validation;

#[cfg(test)]
mod testing;

pub use charts::{SizeChart, SizeChartStore, SizeRange};
pub use chat::{ChatAssistant, ChatSessionStore};
pub use domain::{
    Category, ChatContext, ChatMessage, ChatReply, ChatRole, FitPreference, ImageInput,
    Measurements, ProductInfo, SizeLabel, SizeRecommendation, TryOnJob, TryOnResult,
};
pub use jobs::JobStore;
pub use ports::{
    GenerationRequest, GenerationService, KeyValueStore, PortError, PortResult, TextStream,
};
pub use recommend::{RecommendationEngine, SizeRequest};
pub use tryon::TryOnPipeline;

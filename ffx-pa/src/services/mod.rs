//! Service modules for the pronunciation analysis pipeline

pub mod analysis_orchestrator;
pub mod audio_staging;
pub mod feedback_generator;
pub mod openai_client;
pub mod phone_aggregator;
pub mod response_normalizer;
pub mod speechace_client;

pub use analysis_orchestrator::{AnalysisError, AnalysisOrchestrator};
pub use audio_staging::StagedAudio;
pub use feedback_generator::{
    fallback_feedback, FeedbackGenerator, FALLBACK_CHEERING, FALLBACK_FEEDBACK,
};
pub use openai_client::{CompletionError, CompletionProvider, CompletionRequest, OpenAiChatClient};
pub use phone_aggregator::group_by_phone;
pub use response_normalizer::{normalize, NormalizeError};
pub use speechace_client::{ScoringBackend, ScoringError, SpeechAceClient};

//! Per-request analysis pipeline
//!
//! stage audio → score → normalize → phone summary → feedback → metadata
//!
//! Steps run in order for one request. The staged audio file is removed on
//! every exit path because `StagedAudio` deletes itself on drop.

use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{AnalysisRequest, NormalizedResult};
use crate::services::audio_staging::StagedAudio;
use crate::services::feedback_generator::FeedbackGenerator;
use crate::services::phone_aggregator::group_by_phone;
use crate::services::response_normalizer::{normalize, NormalizeError};
use crate::services::speechace_client::{ScoringBackend, ScoringError};

/// Analysis pipeline errors
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Scoring(#[from] ScoringError),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    /// Audio could not be written to transient storage
    #[error("Failed to stage audio: {0}")]
    Staging(#[from] std::io::Error),
}

/// Orchestrates scoring, normalization and feedback for one recording
pub struct AnalysisOrchestrator {
    scoring: Arc<dyn ScoringBackend>,
    feedback: FeedbackGenerator,
}

impl AnalysisOrchestrator {
    pub fn new(scoring: Arc<dyn ScoringBackend>, feedback: FeedbackGenerator) -> Self {
        Self { scoring, feedback }
    }

    /// Run the full analysis for one request
    pub async fn analyze(&self, request: AnalysisRequest) -> Result<NormalizedResult, AnalysisError> {
        let analysis_id = Uuid::new_v4();
        tracing::info!(
            %analysis_id,
            audio_bytes = request.audio.len(),
            user_id = request.user_id.as_deref().unwrap_or("-"),
            "Pronunciation analysis started"
        );

        let staged = StagedAudio::stage(&request.audio, request.file_name.as_deref())?;

        let raw = self.scoring.score(&staged, &request.target_text).await?;

        let mut result = normalize(&raw, self.scoring.api_version())?;
        result.phone_summary = group_by_phone(raw.word_list());

        self.feedback.attach_feedback(&mut result).await;

        result.metadata.user_id = request.user_id;
        result.metadata.target_text = Some(request.target_text);
        result.metadata.lv1 = request.lv1;
        result.metadata.lv2 = request.lv2;

        if let Err(e) = staged.release() {
            tracing::warn!(%analysis_id, error = %e, "Failed to remove staged audio");
        }

        tracing::info!(
            %analysis_id,
            overall_score = result.overall_score,
            words = result.word_analysis.len(),
            "Pronunciation analysis complete"
        );

        Ok(result)
    }
}

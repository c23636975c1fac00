//! Pronunciation analysis endpoint
//!
//! POST /pronunciation_analysis (multipart/form-data)
//! - `audio_file` (file, required)
//! - `target_text` (required)
//! - `lv1`, `lv2`, `user_id` (optional)

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    routing::post,
    Json, Router,
};

use crate::{
    error::{ApiError, ApiResult},
    models::{AnalysisRequest, NormalizedResult},
    AppState,
};

/// POST /pronunciation_analysis
///
/// Scores the uploaded recording against `target_text` and returns the
/// normalized analysis with per-word feedback.
pub async fn pronunciation_analysis(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<NormalizedResult>> {
    let request = read_analysis_form(multipart).await?;

    match state.orchestrator.analyze(request).await {
        Ok(result) => Ok(Json(result)),
        Err(e) => {
            tracing::error!(error = %e, "Pronunciation analysis failed");
            state.record_error(e.to_string()).await;
            Err(e.into())
        }
    }
}

/// Collect the multipart fields into an `AnalysisRequest`
async fn read_analysis_form(mut multipart: Multipart) -> ApiResult<AnalysisRequest> {
    let mut audio: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;
    let mut target_text: Option<String> = None;
    let mut lv1 = None;
    let mut lv2 = None;
    let mut user_id = None;

    while let Some(field) = multipart.next_field().await.map_err(form_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "audio_file" => {
                file_name = field.file_name().map(str::to_string);
                audio = Some(field.bytes().await.map_err(form_error)?.to_vec());
            }
            "target_text" => target_text = Some(field.text().await.map_err(form_error)?),
            "lv1" => lv1 = non_blank(field.text().await.map_err(form_error)?),
            "lv2" => lv2 = non_blank(field.text().await.map_err(form_error)?),
            "user_id" => user_id = non_blank(field.text().await.map_err(form_error)?),
            other => tracing::debug!(field = other, "Ignoring unexpected form field"),
        }
    }

    let audio = audio
        .ok_or_else(|| ApiError::BadRequest("Audio file not found: 'audio_file' is required".to_string()))?;
    if audio.is_empty() {
        return Err(ApiError::BadRequest("Audio file is empty".to_string()));
    }

    let target_text = target_text
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("'target_text' is required".to_string()))?;

    Ok(AnalysisRequest {
        audio,
        file_name,
        target_text,
        lv1,
        lv2,
        user_id,
    })
}

fn non_blank(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

fn form_error(e: MultipartError) -> ApiError {
    ApiError::BadRequest(format!("Invalid multipart body: {}", e))
}

/// Build pronunciation analysis routes
pub fn pronunciation_routes() -> Router<AppState> {
    Router::new().route("/pronunciation_analysis", post(pronunciation_analysis))
}

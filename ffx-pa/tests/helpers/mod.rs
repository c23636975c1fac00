//! Test Helper Utilities
//!
//! Shared utilities for testing ffx-pa: app construction against mock
//! upstreams, multipart request building, and canned scoring payloads.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::Request;
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;

use ffx_common::config::{ConfigSource, Credential};
use ffx_pa::config::{FeedbackConfig, ScoringConfig};
use ffx_pa::services::{
    AnalysisOrchestrator, CompletionProvider, FeedbackGenerator, OpenAiChatClient, SpeechAceClient,
};
use ffx_pa::{build_router, AppState};

pub const BOUNDARY: &str = "ffx-test-boundary";
pub const SCORING_KEY: &str = "scoring-test-key";
pub const LLM_KEY: &str = "llm-test-key";

/// Scoring config pointed at a mock server
pub fn scoring_config(base_url: &str, api_key: Option<&str>) -> ScoringConfig {
    ScoringConfig {
        api_key: api_key.map(|k| Credential::new(k, ConfigSource::TomlFile)),
        base_url: base_url.to_string(),
        ..ScoringConfig::default()
    }
}

/// Build app state; `llm_base_url = None` disables model feedback
pub fn build_state(
    scoring_base_url: &str,
    scoring_key: Option<&str>,
    llm_base_url: Option<&str>,
) -> AppState {
    let scoring = SpeechAceClient::new(scoring_config(scoring_base_url, scoring_key))
        .expect("Should create scoring client");

    let provider: Option<Arc<dyn CompletionProvider>> = llm_base_url.map(|url| {
        let config = FeedbackConfig {
            api_key: Some(Credential::new(LLM_KEY, ConfigSource::Environment)),
            base_url: url.to_string(),
            ..FeedbackConfig::default()
        };
        Arc::new(OpenAiChatClient::new(config).expect("Should create LLM client"))
            as Arc<dyn CompletionProvider>
    });

    let orchestrator =
        AnalysisOrchestrator::new(Arc::new(scoring), FeedbackGenerator::new(provider, 2));
    AppState::new(orchestrator)
}

pub fn build_app(state: AppState) -> Router {
    build_router(state)
}

/// Minimal multipart/form-data encoder
#[derive(Default)]
pub struct FormBuilder {
    body: Vec<u8>,
}

impl FormBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                BOUNDARY, name, file_name
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(content);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn build(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        self.body
    }
}

/// POST a multipart body to `uri`
pub fn multipart_request(uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

/// GET `uri` with an empty body
pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Extract JSON body from response
pub async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

/// Standard analysis form: one WAV upload plus all optional fields
pub fn analysis_form() -> Vec<u8> {
    FormBuilder::new()
        .file("audio_file", "take.wav", b"RIFF\x24\x00\x00\x00WAVEfmt ")
        .text("target_text", "Bonjour")
        .text("lv1", "A1")
        .text("lv2", "greetings")
        .text("user_id", "user-42")
        .build()
}

/// Scoring payload for the word "bonjour"
pub fn bonjour_payload() -> Value {
    json!({
        "status": "success",
        "quota_remaining": 999,
        "text_score": {
            "text": "Bonjour",
            "speechace_score": { "pronunciation": 82.6 },
            "cefr_score": { "pronunciation": "B1" },
            "word_score_list": [{
                "word": "bonjour",
                "quality_score": 91.4,
                "syllable_score_list": [
                    { "letters": "bon", "quality_score": 88.0, "phone_count": 2 },
                    { "letters": "jour", "quality_score": 94.0, "phone_count": 3 }
                ],
                "phone_score_list": [
                    { "phone": "b", "quality_score": 65.0, "sound_most_like": "p" },
                    { "phone": "ɔ̃", "quality_score": 97.0, "sound_most_like": "ɔ̃" },
                    { "phone": "ʒ", "quality_score": 90.0 },
                    { "phone": "u", "quality_score": 99.0 },
                    { "phone": "ʁ", "quality_score": 70.0, "sound_most_like": "w" }
                ]
            }]
        }
    })
}

/// Chat completion response whose content is `content`
pub fn chat_completion(content: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
}

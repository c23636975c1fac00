//! SpeechAce scoring API client
//!
//! Uploads a staged recording plus its target text and returns the raw JSON
//! scoring payload.
//!
//! # API Reference
//! - Endpoint: `https://api.speechace.co/api/scoring/text/{version}/json`
//! - Query: `key` (API key), `dialect` (e.g. `fr-fr`)
//! - Multipart body: `text`, `user_audio_file`

use async_trait::async_trait;
use reqwest::multipart;
use serde_json::Value;
use thiserror::Error;

use crate::config::ScoringConfig;
use crate::models::RawScoreResponse;
use crate::services::audio_staging::StagedAudio;

const USER_AGENT: &str = concat!("ffx-pa/", env!("CARGO_PKG_VERSION"));

/// Scoring client errors
#[derive(Debug, Error)]
pub enum ScoringError {
    /// Required credential missing; raised before any network I/O
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Non-2xx response, unreachable service, or unreadable body
    #[error("Scoring service error{}: {message}", status_suffix(.status))]
    Transport {
        status: Option<u16>,
        message: String,
    },
}

impl ScoringError {
    /// True when the upstream rejected the request itself (HTTP 4xx)
    pub fn is_client_error(&self) -> bool {
        match self {
            ScoringError::Configuration(_) => true,
            ScoringError::Transport { status, .. } => {
                status.is_some_and(|s| (400..500).contains(&s))
            }
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default()
}

/// Anything that can turn audio + target text into a raw scoring payload
#[async_trait]
pub trait ScoringBackend: Send + Sync {
    async fn score(
        &self,
        audio: &StagedAudio,
        target_text: &str,
    ) -> Result<RawScoreResponse, ScoringError>;

    /// API version label recorded in response metadata
    fn api_version(&self) -> &str;
}

/// SpeechAce HTTP client
pub struct SpeechAceClient {
    http_client: reqwest::Client,
    config: ScoringConfig,
}

impl SpeechAceClient {
    pub fn new(config: ScoringConfig) -> Result<Self, ScoringError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()
            .map_err(|e| ScoringError::Transport {
                status: None,
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            http_client,
            config,
        })
    }
}

#[async_trait]
impl ScoringBackend for SpeechAceClient {
    async fn score(
        &self,
        audio: &StagedAudio,
        target_text: &str,
    ) -> Result<RawScoreResponse, ScoringError> {
        let api_key = self
            .config
            .api_key
            .as_ref()
            .ok_or_else(|| ScoringError::Configuration("SpeechAce API key not configured".to_string()))?;

        let audio_bytes = audio.read().await.map_err(|e| ScoringError::Transport {
            status: None,
            message: format!("Failed to read staged audio: {}", e),
        })?;
        let audio_len = audio_bytes.len();

        let file_part = multipart::Part::bytes(audio_bytes).file_name(audio.file_name().to_string());
        let form = multipart::Form::new()
            .text("text", target_text.to_string())
            .part("user_audio_file", file_part);

        let query = [
            ("key", api_key.expose()),
            ("dialect", self.config.dialect.as_str()),
        ];

        tracing::debug!(
            dialect = %self.config.dialect,
            audio_bytes = audio_len,
            text_len = target_text.len(),
            "Querying SpeechAce API"
        );

        let response = self
            .http_client
            .post(self.config.endpoint())
            .query(&query)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ScoringError::Transport {
                status: None,
                message: format!("Request failed: {}", e.without_url()),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "SpeechAce API returned error status");
            return Err(ScoringError::Transport {
                status: Some(status.as_u16()),
                message: body,
            });
        }

        let payload: Value = response.json().await.map_err(|e| ScoringError::Transport {
            status: Some(status.as_u16()),
            message: format!("Invalid JSON body: {}", e.without_url()),
        })?;

        let raw = RawScoreResponse::new(payload);
        tracing::info!(
            status = raw.status().unwrap_or("unknown"),
            words = raw.word_list().len(),
            "SpeechAce scoring complete"
        );

        Ok(raw)
    }

    fn api_version(&self) -> &str {
        &self.config.api_version
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = SpeechAceClient::new(ScoringConfig::default());
        assert!(client.is_ok());
    }

    #[test]
    fn test_client_error_classification() {
        let err = ScoringError::Transport {
            status: Some(400),
            message: "no audio".to_string(),
        };
        assert!(err.is_client_error());

        let err = ScoringError::Transport {
            status: Some(503),
            message: "down".to_string(),
        };
        assert!(!err.is_client_error());

        let err = ScoringError::Transport {
            status: None,
            message: "connection refused".to_string(),
        };
        assert!(!err.is_client_error());

        assert!(ScoringError::Configuration("missing".to_string()).is_client_error());
    }

    #[test]
    fn test_transport_error_display() {
        let err = ScoringError::Transport {
            status: Some(500),
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "Scoring service error (HTTP 500): boom");

        let err = ScoringError::Transport {
            status: None,
            message: "timeout".to_string(),
        };
        assert_eq!(err.to_string(), "Scoring service error: timeout");
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_network() {
        // Unroutable base URL: reaching the network would surface as Transport
        let config = ScoringConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            ..ScoringConfig::default()
        };
        let client = SpeechAceClient::new(config).unwrap();
        let staged = StagedAudio::stage(b"audio", Some("a.wav")).unwrap();

        let result = client.score(&staged, "bonjour").await;
        assert!(matches!(result, Err(ScoringError::Configuration(_))));
    }
}

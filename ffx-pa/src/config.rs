//! Configuration resolution for ffx-pa
//!
//! Built once at startup and handed to each component. Priority per setting:
//! command line → environment → TOML → compiled default.

use ffx_common::config::{
    env_override, load_toml_config, resolve_credential, ConfigSource, Credential, LoggingConfig,
};
use ffx_common::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

pub const SPEECHACE_API_KEY_ENV: &str = "SPEECHACE_API_KEY";
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const PORT_ENV: &str = "FFX_PA_PORT";

const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8000;

const DEFAULT_SCORING_BASE_URL: &str = "https://api.speechace.co/api/scoring/text";
const DEFAULT_SCORING_API_VERSION: &str = "v9";
const DEFAULT_DIALECT: &str = "fr-fr";

const DEFAULT_FEEDBACK_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_FEEDBACK_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_MAX_TOKENS: u32 = 200;
const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_MAX_CONCURRENCY: usize = 4;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// TOML file shape
// ============================================================================

/// ffx-pa TOML file, every field optional
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaTomlConfig {
    #[serde(default)]
    pub bind_address: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub scoring: ScoringSection,
    #[serde(default)]
    pub feedback: FeedbackSection,
}

impl PaTomlConfig {
    /// Load from `path`; a missing file is an error only when `required`
    pub fn load(path: &Path, required: bool) -> Result<Self> {
        load_toml_config(path, required)
    }
}

/// `[scoring]` table
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoringSection {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub dialect: Option<String>,
    pub api_version: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// `[feedback]` table
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedbackSection {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub timeout_secs: Option<u64>,
    pub max_concurrency: Option<usize>,
}

// ============================================================================
// Resolved configuration
// ============================================================================

/// Scoring service settings
#[derive(Debug, Clone)]
pub struct ScoringConfig {
    /// `None` makes every scoring call fail fast with a configuration error
    pub api_key: Option<Credential>,
    pub base_url: String,
    pub dialect: String,
    pub api_version: String,
    pub timeout: Duration,
}

impl ScoringConfig {
    /// Full scoring endpoint, e.g. `.../api/scoring/text/v9/json`
    pub fn endpoint(&self) -> String {
        format!("{}/{}/json", self.base_url.trim_end_matches('/'), self.api_version)
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_SCORING_BASE_URL.to_string(),
            dialect: DEFAULT_DIALECT.to_string(),
            api_version: DEFAULT_SCORING_API_VERSION.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Language-model feedback settings
#[derive(Debug, Clone)]
pub struct FeedbackConfig {
    /// `None` selects the fixed fallback feedback for every word
    pub api_key: Option<Credential>,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
    /// Upper bound on concurrent feedback calls within one request
    pub max_concurrency: usize,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_FEEDBACK_BASE_URL.to_string(),
            model: DEFAULT_FEEDBACK_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }
}

/// Overrides taken from the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub bind_address: Option<String>,
    pub port: Option<u16>,
}

/// Complete service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind_address: String,
    pub port: u16,
    pub scoring: ScoringConfig,
    pub feedback: FeedbackConfig,
    pub logging: LoggingConfig,
}

impl ServiceConfig {
    /// Merge TOML, environment and command line into the final configuration
    ///
    /// Missing credentials are logged, not rejected: the scoring client
    /// refuses calls without a key and feedback falls back to fixed text.
    pub fn resolve(toml: PaTomlConfig, cli: &CliOverrides) -> Result<Self> {
        let (port, port_source) = match (cli.port, env_override::<u16>(PORT_ENV)?, toml.port) {
            (Some(p), _, _) => (p, ConfigSource::CommandLine),
            (None, Some(p), _) => (p, ConfigSource::Environment),
            (None, None, Some(p)) => (p, ConfigSource::TomlFile),
            (None, None, None) => (DEFAULT_PORT, ConfigSource::Default),
        };
        info!(port, source = %port_source, "Resolved listen port");

        let bind_address = cli
            .bind_address
            .clone()
            .or(toml.bind_address)
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let scoring = resolve_scoring(toml.scoring)?;
        let feedback = resolve_feedback(toml.feedback)?;

        Ok(Self {
            bind_address,
            port,
            scoring,
            feedback,
            logging: toml.logging,
        })
    }

    /// `host:port` string for the listener
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

fn resolve_scoring(section: ScoringSection) -> Result<ScoringConfig> {
    let defaults = ScoringConfig::default();

    let api_key = resolve_credential(
        "SpeechAce API key",
        SPEECHACE_API_KEY_ENV,
        section.api_key.as_deref(),
    );
    if api_key.is_none() {
        warn!(
            "SpeechAce API key not configured; analysis requests will be rejected. \
             Set {} or [scoring] api_key in the TOML config",
            SPEECHACE_API_KEY_ENV
        );
    }

    let timeout_secs = section.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(Error::Config("[scoring] timeout_secs must be positive".to_string()));
    }

    Ok(ScoringConfig {
        api_key,
        base_url: section.base_url.unwrap_or(defaults.base_url),
        dialect: section.dialect.unwrap_or(defaults.dialect),
        api_version: section.api_version.unwrap_or(defaults.api_version),
        timeout: Duration::from_secs(timeout_secs),
    })
}

fn resolve_feedback(section: FeedbackSection) -> Result<FeedbackConfig> {
    let defaults = FeedbackConfig::default();

    let api_key = resolve_credential(
        "OpenAI API key",
        OPENAI_API_KEY_ENV,
        section.api_key.as_deref(),
    );
    if api_key.is_none() {
        warn!("OpenAI API key not configured; word feedback will use generic messages");
    }

    let temperature = section.temperature.unwrap_or(defaults.temperature);
    if !(0.0..=2.0).contains(&temperature) {
        return Err(Error::Config(format!(
            "[feedback] temperature must be within 0.0..=2.0, got {}",
            temperature
        )));
    }

    let max_concurrency = section.max_concurrency.unwrap_or(defaults.max_concurrency);
    if max_concurrency == 0 {
        return Err(Error::Config("[feedback] max_concurrency must be at least 1".to_string()));
    }

    let timeout_secs = section.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(Error::Config("[feedback] timeout_secs must be positive".to_string()));
    }

    Ok(FeedbackConfig {
        api_key,
        base_url: section.base_url.unwrap_or(defaults.base_url),
        model: section.model.unwrap_or(defaults.model),
        max_tokens: section.max_tokens.unwrap_or(defaults.max_tokens),
        temperature,
        timeout: Duration::from_secs(timeout_secs),
        max_concurrency,
    })
}

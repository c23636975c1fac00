//! Pronunciation analysis result types
//!
//! These are the stable, application-facing shapes produced from a raw
//! scoring payload. Serialization order follows field declaration order.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Phones scoring below this threshold are flagged for practice
pub const NEEDS_WORK_THRESHOLD: u8 = 70;

/// Inbound analysis request (one per uploaded recording)
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    /// Recorded speech, any container the scoring service accepts
    pub audio: Vec<u8>,
    /// Original upload filename, used for the staged file extension
    pub file_name: Option<String>,
    /// Text the speaker was asked to read
    pub target_text: String,
    /// Optional level tags supplied by the caller
    pub lv1: Option<String>,
    pub lv2: Option<String>,
    /// Optional caller user id, echoed back in metadata
    pub user_id: Option<String>,
}

/// Normalized pronunciation analysis
///
/// `overall_score` serializes as `null` when no score could be derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedResult {
    /// Overall pronunciation score (0-100)
    pub overall_score: Option<u8>,
    /// Scoring service's own score block, passed through untouched
    pub speechace_score: Value,
    /// CEFR level assessment
    pub cefr_score: CefrScore,
    /// Per-word breakdown in utterance order
    pub word_analysis: Vec<WordResult>,
    /// Per-phone aggregate across the whole utterance
    #[serde(default)]
    pub phone_summary: Vec<PhoneAggregate>,
    pub metadata: ResponseMetadata,
}

/// CEFR level, e.g. "B1"
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CefrScore {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

/// Score breakdown for a single word
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordResult {
    pub word: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<u8>,
    /// Phone label → score, in the order phones were reported
    pub phones: IndexMap<String, PhoneResult>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub syllables: Vec<SyllableResult>,
    /// Coaching feedback, attached after normalization
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_feedback: Option<FeedbackResult>,
}

/// Score for one phone within a word
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<u8>,
    /// Phone the speaker's pronunciation most resembled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sound_most_like: Option<String>,
    pub needs_work: bool,
}

impl PhoneResult {
    /// Build a phone result, deriving `needs_work` from the score
    ///
    /// A phone with no score is never flagged.
    pub fn new(quality_score: Option<u8>, sound_most_like: Option<String>) -> Self {
        Self {
            quality_score,
            sound_most_like,
            needs_work: quality_score.is_some_and(|s| s < NEEDS_WORK_THRESHOLD),
        }
    }
}

/// Score for one syllable within a word
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyllableResult {
    pub letters: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_count: Option<u32>,
}

/// Aggregate of one phone label across every word in an utterance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneAggregate {
    pub phone: String,
    pub average_quality_score: i64,
    /// Distinct sound-alikes, sorted alphabetically
    pub sounds_most_like: Vec<String>,
}

/// Generated coaching message for one word
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackResult {
    pub cheering_message: String,
    pub feedback: String,
}

/// Response metadata: provenance plus caller-supplied tags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseMetadata {
    /// Scoring service status, "unknown" when absent
    pub status: String,
    pub api_version: String,
    /// Complete raw scoring payload, verbatim
    pub raw_api_response: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lv1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lv2: Option<String>,
}

/// Round a raw score to an integer in [0, 100]
///
/// Ties round to even, matching the scoring pipeline's historical output.
pub fn round_score(raw: f64) -> u8 {
    raw.round_ties_even().clamp(0.0, 100.0) as u8
}

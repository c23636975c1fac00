//! Raw scoring payload → `NormalizedResult`
//!
//! The overall score is read from an ordered list of accessors. The first
//! one that yields a number wins:
//!
//! 1. `text_score.speechace_score.pronunciation`
//! 2. `speechace_score.pronunciation`
//! 3. `text_score.quality_score`
//! 4. mean of the word quality scores
//!
//! All scores are rounded to integers in [0, 100]. Missing score fields are
//! omitted; a word or phone entry without its label is a malformed payload.

use indexmap::IndexMap;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::{
    round_score, CefrScore, NormalizedResult, PhoneResult, RawScoreResponse, ResponseMetadata,
    SyllableResult, WordResult,
};

/// Normalizer errors
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// Required label absent; the upstream contract has changed
    #[error("Malformed scoring payload: {0}")]
    MalformedPayload(String),
}

type ScoreAccessor = fn(&RawScoreResponse) -> Option<f64>;

/// Overall score sources, highest priority first
const OVERALL_SCORE_ACCESSORS: &[(&str, ScoreAccessor)] = &[
    ("text_score.speechace_score.pronunciation", nested_pronunciation),
    ("speechace_score.pronunciation", top_level_pronunciation),
    ("text_score.quality_score", text_quality_score),
    ("mean(word quality_score)", mean_word_score),
];

fn nested_pronunciation(raw: &RawScoreResponse) -> Option<f64> {
    raw.number_at(&["text_score", "speechace_score", "pronunciation"])
}

fn top_level_pronunciation(raw: &RawScoreResponse) -> Option<f64> {
    raw.number_at(&["speechace_score", "pronunciation"])
}

fn text_quality_score(raw: &RawScoreResponse) -> Option<f64> {
    raw.number_at(&["text_score", "quality_score"])
}

/// Extract the overall score, `None` when no accessor resolves
pub fn extract_overall_score(raw: &RawScoreResponse) -> Option<u8> {
    OVERALL_SCORE_ACCESSORS.iter().find_map(|(source, accessor)| {
        accessor(raw).map(|score| {
            tracing::debug!(source, score, "Overall score resolved");
            round_score(score)
        })
    })
}

fn mean_word_score(raw: &RawScoreResponse) -> Option<f64> {
    let scores: Vec<f64> = raw
        .word_list()
        .iter()
        .filter_map(|w| w.get("quality_score").and_then(Value::as_f64))
        .collect();

    if scores.is_empty() {
        None
    } else {
        Some(scores.iter().sum::<f64>() / scores.len() as f64)
    }
}

/// CEFR level from `text_score.cefr_score.pronunciation`
pub fn extract_cefr_level(raw: &RawScoreResponse) -> Option<String> {
    raw.string_at(&["text_score", "cefr_score", "pronunciation"])
        .map(str::to_string)
}

/// The scoring service's own score block
///
/// Prefers the top-level object and falls back to the one nested under
/// `text_score`; `{}` when neither is present.
fn speechace_score_block(raw: &RawScoreResponse) -> Value {
    raw.lookup(&["speechace_score"])
        .or_else(|| raw.lookup(&["text_score", "speechace_score"]))
        .filter(|v| v.is_object())
        .cloned()
        .unwrap_or_else(|| Value::Object(Map::new()))
}

/// Normalize a raw payload
///
/// Caller-supplied metadata (user id, target text, level tags) is left
/// empty here and attached by the orchestrator.
pub fn normalize(
    raw: &RawScoreResponse,
    api_version: &str,
) -> Result<NormalizedResult, NormalizeError> {
    let word_analysis = raw
        .word_list()
        .iter()
        .enumerate()
        .map(|(index, entry)| normalize_word(index, entry))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(NormalizedResult {
        overall_score: extract_overall_score(raw),
        speechace_score: speechace_score_block(raw),
        cefr_score: CefrScore {
            level: extract_cefr_level(raw),
        },
        word_analysis,
        phone_summary: Vec::new(),
        metadata: ResponseMetadata {
            status: raw.status().unwrap_or("unknown").to_string(),
            api_version: api_version.to_string(),
            raw_api_response: raw.as_value().clone(),
            user_id: None,
            target_text: None,
            lv1: None,
            lv2: None,
        },
    })
}

fn normalize_word(index: usize, entry: &Value) -> Result<WordResult, NormalizeError> {
    let word = entry
        .get("word")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            NormalizeError::MalformedPayload(format!("word entry {} has no 'word' label", index))
        })?;

    let mut phones = IndexMap::new();
    for (phone_index, phone_entry) in list_field(entry, "phone_score_list").iter().enumerate() {
        let label = phone_entry
            .get("phone")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                NormalizeError::MalformedPayload(format!(
                    "phone entry {} of word '{}' has no 'phone' label",
                    phone_index, word
                ))
            })?;

        let sound_most_like = phone_entry
            .get("sound_most_like")
            .and_then(Value::as_str)
            .map(str::to_string);

        // Repeated labels keep their first position but take the last value
        phones.insert(
            label.to_string(),
            PhoneResult::new(score_field(phone_entry), sound_most_like),
        );
    }

    let syllables = list_field(entry, "syllable_score_list")
        .iter()
        .filter_map(|syllable| {
            let letters = syllable.get("letters").and_then(Value::as_str)?;
            Some(SyllableResult {
                letters: letters.to_string(),
                quality_score: score_field(syllable),
                phone_count: syllable
                    .get("phone_count")
                    .and_then(Value::as_u64)
                    .and_then(|n| u32::try_from(n).ok()),
            })
        })
        .collect();

    Ok(WordResult {
        word: word.to_string(),
        quality_score: score_field(entry),
        phones,
        syllables,
        ai_feedback: None,
    })
}

fn score_field(entry: &Value) -> Option<u8> {
    entry
        .get("quality_score")
        .and_then(Value::as_f64)
        .map(round_score)
}

fn list_field<'a>(entry: &'a Value, key: &str) -> &'a [Value] {
    entry
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

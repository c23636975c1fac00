//! Read-only view over the raw SpeechAce scoring payload
//!
//! The payload shape drifts across API versions, so fields are reached through
//! explicit key paths that each yield an `Option` instead of assuming a fixed
//! struct layout.

use serde_json::Value;

/// Raw scoring payload exactly as returned by the scoring service
#[derive(Debug, Clone, PartialEq)]
pub struct RawScoreResponse(Value);

impl RawScoreResponse {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// Follow a key path through nested objects
    pub fn lookup(&self, path: &[&str]) -> Option<&Value> {
        path.iter().try_fold(&self.0, |node, key| node.get(key))
    }

    /// Numeric value at `path`, if present and numeric
    pub fn number_at(&self, path: &[&str]) -> Option<f64> {
        self.lookup(path).and_then(Value::as_f64)
    }

    /// String value at `path`, if present and a string
    pub fn string_at(&self, path: &[&str]) -> Option<&str> {
        self.lookup(path).and_then(Value::as_str)
    }

    /// Top-level `status` field ("success", "error", ...)
    pub fn status(&self) -> Option<&str> {
        self.string_at(&["status"])
    }

    /// Entries of `text_score.word_score_list`, empty when absent
    pub fn word_list(&self) -> &[Value] {
        self.lookup(&["text_score", "word_score_list"])
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

impl From<Value> for RawScoreResponse {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}

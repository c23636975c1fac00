//! Per-word coaching feedback from a language model
//!
//! Feedback is best effort. A missing key, a failed call or an unusable
//! answer all degrade to fixed fallback text; `generate` never returns an
//! error, so a broken language-model integration cannot fail an analysis.

use futures::{stream::{self, StreamExt}, FutureExt};
use std::sync::Arc;

use crate::models::{FeedbackResult, NormalizedResult, WordResult};
use crate::services::openai_client::{CompletionProvider, CompletionRequest};

pub const FALLBACK_CHEERING: &str = "Great effort! Keep practicing!";
pub const FALLBACK_FEEDBACK: &str = "Continue working on your pronunciation.";

const SYSTEM_PROMPT: &str = "You are a supportive French pronunciation coach. \
Always be encouraging and provide specific, actionable feedback.";

/// Generic feedback used whenever the model cannot be consulted
pub fn fallback_feedback() -> FeedbackResult {
    FeedbackResult {
        cheering_message: FALLBACK_CHEERING.to_string(),
        feedback: FALLBACK_FEEDBACK.to_string(),
    }
}

/// Summarize each phone as `Phone 'x': 65/100 (sounds like 'y')`, joined by `; `
pub fn phone_context(word: &WordResult) -> String {
    word.phones
        .iter()
        .map(|(phone, result)| {
            let mut line = format!("Phone '{}': {}/100", phone, score_text(result.quality_score));
            if let Some(sound) = result.sound_most_like.as_deref().filter(|s| !s.is_empty()) {
                line.push_str(&format!(" (sounds like '{}')", sound));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("; ")
}

fn score_text(score: Option<u8>) -> String {
    score.map_or_else(|| "unknown".to_string(), |s| s.to_string())
}

/// User prompt embedding the word's score context
pub fn build_prompt(word: &WordResult, overall_score: Option<u8>) -> String {
    format!(
        r#"You are a supportive French pronunciation coach for Francoflex. Provide encouraging feedback for this word:

Word: "{word}"
Word Score: {word_score}/100
Overall Pronunciation Score: {overall}/100
Phone Details: {phones}

Please provide:
1. A short, encouraging cheering message (1-2 sentences, positive and motivating)
2. Specific, actionable feedback for improving this word's pronunciation (focus on the phones that need work)

Respond in JSON format:
{{
    "cheering_message": "your encouraging message here",
    "feedback": "your specific improvement tips here"
}}

Keep it concise, supportive, and focused on the specific pronunciation issues for this word."#,
        word = word.word,
        word_score = score_text(word.quality_score),
        overall = score_text(overall_score),
        phones = phone_context(word),
    )
}

/// Interpret model output as a `FeedbackResult`
///
/// Anything that is not a JSON object with both string fields yields the
/// generic cheering message with the raw text as feedback.
pub fn parse_feedback(text: &str) -> FeedbackResult {
    let trimmed = text.trim();

    match serde_json::from_str::<FeedbackResult>(strip_code_fence(trimmed)) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!(error = %e, "Model feedback was not valid JSON; using raw text");
            FeedbackResult {
                cheering_message: FALLBACK_CHEERING.to_string(),
                feedback: if trimmed.is_empty() {
                    FALLBACK_FEEDBACK.to_string()
                } else {
                    trimmed.to_string()
                },
            }
        }
    }
}

/// Remove a surrounding markdown code fence (```json ... ```)
fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Generates feedback for every word of an analysis
pub struct FeedbackGenerator {
    provider: Option<Arc<dyn CompletionProvider>>,
    max_concurrency: usize,
}

impl FeedbackGenerator {
    /// `provider = None` means no model is configured; every word gets the fallback
    pub fn new(provider: Option<Arc<dyn CompletionProvider>>, max_concurrency: usize) -> Self {
        Self {
            provider,
            max_concurrency: max_concurrency.max(1),
        }
    }

    pub fn disabled() -> Self {
        Self::new(None, 1)
    }

    pub fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }

    /// Feedback for one word; always returns a complete result
    pub async fn generate(&self, word: &WordResult, overall_score: Option<u8>) -> FeedbackResult {
        let Some(provider) = &self.provider else {
            tracing::debug!(word = %word.word, "No language model configured; using fallback feedback");
            return fallback_feedback();
        };

        let request = CompletionRequest {
            system: SYSTEM_PROMPT.to_string(),
            user: build_prompt(word, overall_score),
        };

        match provider.complete(&request).await {
            Ok(text) => parse_feedback(&text),
            Err(e) => {
                tracing::warn!(word = %word.word, error = %e, "Feedback generation failed; using fallback");
                fallback_feedback()
            }
        }
    }

    /// Attach feedback to every word of `result`
    ///
    /// Calls run concurrently up to `max_concurrency`; each result is
    /// attached to the word it was generated for.
    pub async fn attach_feedback(&self, result: &mut NormalizedResult) {
        let overall_score = result.overall_score;

        let pending: Vec<_> = result
            .word_analysis
            .iter()
            .map(|word| self.generate(word, overall_score).boxed())
            .collect();
        let feedback: Vec<FeedbackResult> = stream::iter(pending)
            .buffered(self.max_concurrency)
            .collect()
            .await;

        for (word, word_feedback) in result.word_analysis.iter_mut().zip(feedback) {
            word.ai_feedback = Some(word_feedback);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PhoneResult;
    use crate::services::openai_client::CompletionError;
    use async_trait::async_trait;
    use indexmap::IndexMap;
    use std::sync::Mutex;

    fn word(label: &str, score: Option<u8>, phones: &[(&str, Option<u8>, Option<&str>)]) -> WordResult {
        let phones: IndexMap<String, PhoneResult> = phones
            .iter()
            .map(|(p, s, like)| (p.to_string(), PhoneResult::new(*s, like.map(str::to_string))))
            .collect();
        WordResult {
            word: label.to_string(),
            quality_score: score,
            phones,
            syllables: Vec::new(),
            ai_feedback: None,
        }
    }

    /// Replies per word: the text after "Word: " decides the canned answer
    struct ScriptedProvider {
        prompts: Mutex<Vec<CompletionRequest>>,
    }

    #[async_trait]
    impl CompletionProvider for ScriptedProvider {
        async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
            self.prompts.lock().unwrap().push(request.clone());
            if request.user.contains("Word: \"fail\"") {
                Err(CompletionError::Api(429, "quota".to_string()))
            } else if request.user.contains("Word: \"prose\"") {
                Ok("Bravo! Try rounding your lips.".to_string())
            } else {
                let w = request.user.split('"').nth(1).unwrap_or_default();
                Ok(format!(
                    r#"{{"cheering_message": "Super {w}!", "feedback": "Work on {w}."}}"#
                ))
            }
        }
    }

    #[test]
    fn test_phone_context() {
        let w = word("bonjour", Some(91), &[("b", Some(65), Some("p")), ("ɔ̃", Some(92), None)]);
        assert_eq!(
            phone_context(&w),
            "Phone 'b': 65/100 (sounds like 'p'); Phone 'ɔ̃': 92/100"
        );
    }

    #[test]
    fn test_prompt_embeds_context() {
        let w = word("bonjour", Some(91), &[("b", Some(65), Some("p"))]);
        let prompt = build_prompt(&w, Some(83));
        assert!(prompt.contains("Word: \"bonjour\""));
        assert!(prompt.contains("Word Score: 91/100"));
        assert!(prompt.contains("Overall Pronunciation Score: 83/100"));
        assert!(prompt.contains("Phone Details: Phone 'b': 65/100 (sounds like 'p')"));
        assert!(prompt.contains("\"cheering_message\""));

        let prompt = build_prompt(&w, None);
        assert!(prompt.contains("Overall Pronunciation Score: unknown/100"));
    }

    #[test]
    fn test_parse_valid_json() {
        let parsed = parse_feedback(r#"{"cheering_message": "Bravo!", "feedback": "Voice the b."}"#);
        assert_eq!(parsed.cheering_message, "Bravo!");
        assert_eq!(parsed.feedback, "Voice the b.");
    }

    #[test]
    fn test_parse_fenced_json() {
        let parsed = parse_feedback("```json\n{\"cheering_message\": \"Oui!\", \"feedback\": \"More air.\"}\n```");
        assert_eq!(parsed.cheering_message, "Oui!");
        assert_eq!(parsed.feedback, "More air.");
    }

    #[test]
    fn test_parse_invalid_json_keeps_raw_text() {
        let parsed = parse_feedback("  Nice job, soften the r.  ");
        assert_eq!(parsed.cheering_message, FALLBACK_CHEERING);
        assert_eq!(parsed.feedback, "Nice job, soften the r.");
    }

    #[test]
    fn test_parse_incomplete_object_falls_back() {
        let parsed = parse_feedback(r#"{"cheering_message": "Yay"}"#);
        assert_eq!(parsed.cheering_message, FALLBACK_CHEERING);
        assert_eq!(parsed.feedback, r#"{"cheering_message": "Yay"}"#);

        let parsed = parse_feedback(r#"{"cheering_message": null, "feedback": "x"}"#);
        assert_eq!(parsed.cheering_message, FALLBACK_CHEERING);
    }

    #[test]
    fn test_parse_empty_text() {
        assert_eq!(parse_feedback("   "), fallback_feedback());
    }

    #[tokio::test]
    async fn test_disabled_generator_uses_fallback() {
        let generator = FeedbackGenerator::disabled();
        assert!(!generator.is_enabled());

        let w = word("merci", Some(80), &[]);
        assert_eq!(generator.generate(&w, Some(80)).await, fallback_feedback());
    }

    #[tokio::test]
    async fn test_attach_feedback_per_word_with_partial_failure() {
        let provider = Arc::new(ScriptedProvider {
            prompts: Mutex::new(Vec::new()),
        });
        let generator = FeedbackGenerator::new(Some(provider.clone()), 3);

        let mut result: NormalizedResult = serde_json::from_value(serde_json::json!({
            "overall_score": 75,
            "speechace_score": {},
            "cefr_score": {},
            "word_analysis": [],
            "metadata": { "status": "success", "api_version": "v9", "raw_api_response": {} }
        }))
        .unwrap();
        result.word_analysis = vec![
            word("un", Some(90), &[("œ̃", Some(90), None)]),
            word("fail", Some(40), &[]),
            word("prose", Some(60), &[]),
            word("deux", Some(85), &[]),
        ];

        generator.attach_feedback(&mut result).await;

        let feedback: Vec<_> = result
            .word_analysis
            .iter()
            .map(|w| w.ai_feedback.clone().unwrap())
            .collect();
        assert_eq!(feedback[0].cheering_message, "Super un!");
        assert_eq!(feedback[1], fallback_feedback());
        assert_eq!(feedback[2].cheering_message, FALLBACK_CHEERING);
        assert_eq!(feedback[2].feedback, "Bravo! Try rounding your lips.");
        assert_eq!(feedback[3].feedback, "Work on deux.");

        let prompts = provider.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 4);
        assert!(prompts.iter().all(|p| p.system.contains("supportive French pronunciation coach")));
        assert!(prompts.iter().all(|p| p.user.contains("Overall Pronunciation Score: 75/100")));
    }
}

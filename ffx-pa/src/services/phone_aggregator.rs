//! Cross-word phone grouping
//!
//! Collapses every phone occurrence in an utterance into one aggregate per
//! distinct phone label: rounded mean score plus the sorted set of sounds the
//! speaker produced instead.

use indexmap::IndexMap;
use serde_json::Value;
use std::collections::BTreeSet;

use crate::models::PhoneAggregate;

#[derive(Default)]
struct PhoneAccumulator {
    scores: Vec<f64>,
    sounds: BTreeSet<String>,
}

/// Group phones across a raw `word_score_list`
///
/// Single pass in utterance order; groups are returned in the order each
/// label was first seen. Entries without a `phone` label are skipped. An
/// occurrence without a score counts as 0. Means round half to even.
pub fn group_by_phone(words: &[Value]) -> Vec<PhoneAggregate> {
    let mut groups: IndexMap<String, PhoneAccumulator> = IndexMap::new();

    let phones = words
        .iter()
        .filter_map(|word| word.get("phone_score_list").and_then(Value::as_array))
        .flatten();

    for phone in phones {
        let Some(label) = phone.get("phone").and_then(Value::as_str) else {
            continue;
        };

        let group = groups.entry(label.to_string()).or_default();
        group
            .scores
            .push(phone.get("quality_score").and_then(Value::as_f64).unwrap_or(0.0));
        if let Some(sound) = phone.get("sound_most_like").and_then(Value::as_str) {
            group.sounds.insert(sound.to_string());
        }
    }

    groups
        .into_iter()
        .map(|(phone, acc)| {
            let mean = acc.scores.iter().sum::<f64>() / acc.scores.len() as f64;
            PhoneAggregate {
                phone,
                average_quality_score: mean.round_ties_even() as i64,
                sounds_most_like: acc.sounds.into_iter().collect(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_groups_across_words() {
        let words = json!([
            { "word": "bon", "phone_score_list": [
                { "phone": "b", "quality_score": 80, "sound_most_like": "p" },
                { "phone": "ɔ̃", "quality_score": 95 }
            ]},
            { "word": "bébé", "phone_score_list": [
                { "phone": "b", "quality_score": 60, "sound_most_like": null }
            ]}
        ]);

        let groups = group_by_phone(words.as_array().unwrap());
        assert_eq!(groups.len(), 2);

        assert_eq!(
            groups[0],
            PhoneAggregate {
                phone: "b".to_string(),
                average_quality_score: 70,
                sounds_most_like: vec!["p".to_string()],
            }
        );
        assert_eq!(groups[1].phone, "ɔ̃");
        assert_eq!(groups[1].average_quality_score, 95);
        assert!(groups[1].sounds_most_like.is_empty());
    }

    #[test]
    fn test_sounds_sorted_and_distinct() {
        let words = json!([
            { "phone_score_list": [
                { "phone": "ʁ", "quality_score": 50, "sound_most_like": "w" },
                { "phone": "ʁ", "quality_score": 40, "sound_most_like": "l" },
                { "phone": "ʁ", "quality_score": 45, "sound_most_like": "w" }
            ]}
        ]);

        let groups = group_by_phone(words.as_array().unwrap());
        assert_eq!(groups[0].sounds_most_like, ["l", "w"]);
        assert_eq!(groups[0].average_quality_score, 45);
    }

    #[test]
    fn test_unlabelled_phone_skipped() {
        let words = json!([
            { "phone_score_list": [
                { "quality_score": 10, "sound_most_like": "x" },
                { "phone": null, "quality_score": 10 },
                { "phone": "a", "quality_score": 90 }
            ]}
        ]);

        let groups = group_by_phone(words.as_array().unwrap());
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].phone, "a");
    }

    #[test]
    fn test_mean_rounds_half_to_even() {
        let words = json!([
            { "phone_score_list": [
                { "phone": "e", "quality_score": 64 },
                { "phone": "e", "quality_score": 65 }
            ]},
            { "phone_score_list": [
                { "phone": "o", "quality_score": 65 },
                { "phone": "o", "quality_score": 66 }
            ]}
        ]);

        let groups = group_by_phone(words.as_array().unwrap());
        assert_eq!(groups[0].average_quality_score, 64);
        assert_eq!(groups[1].average_quality_score, 66);
    }

    #[test]
    fn test_missing_score_counts_as_zero() {
        let words = json!([
            { "phone_score_list": [
                { "phone": "i", "quality_score": 80 },
                { "phone": "i" }
            ]}
        ]);

        let groups = group_by_phone(words.as_array().unwrap());
        assert_eq!(groups[0].average_quality_score, 40);
    }

    #[test]
    fn test_empty_input() {
        assert!(group_by_phone(&[]).is_empty());
    }
}

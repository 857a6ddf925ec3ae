//! Drops OCR detections that are unlikely to be body text.

use serde::{Deserialize, Serialize};

use super::ReflowConfig;
use crate::system::{BoundingBox, RecognizedWord};

/// Site navigation labels that OCR picks up from page headers.
pub const NAVIGATION_LABELS: [&str; 12] = [
    "Home",
    "News",
    "Sport",
    "Business",
    "Innovation",
    "Culture",
    "Arts",
    "Travel",
    "Earth",
    "Audio",
    "Video",
    "Live",
];

const MIN_WORD_CHARS: usize = 3;
const MAX_LABEL_CHARS: usize = 5;

/// A word that survived filtering. Confidence is normalized to 0-1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilteredWord {
    pub text: String,
    pub confidence: f64,
    pub bbox: BoundingBox,
}

/// Short all-caps fragments like "NEWS" or "UK" are menu labels far more often than words.
fn is_short_caps_label(text: &str) -> bool {
    let len = text.chars().count();
    (1..=MAX_LABEL_CHARS).contains(&len)
        && text
            .chars()
            .all(|c| c.is_uppercase() || c.is_whitespace())
}

fn is_navigation_label(text: &str) -> bool {
    NAVIGATION_LABELS
        .iter()
        .any(|label| label.eq_ignore_ascii_case(text))
}

fn keep(text: &str, confidence: f64, config: &ReflowConfig) -> bool {
    text.chars().count() >= MIN_WORD_CHARS
        && !is_short_caps_label(text)
        && confidence >= config.min_confidence
        && text.chars().any(char::is_alphabetic)
        && !is_navigation_label(text)
}

/// Returns the words worth reading, in their original order.
pub fn filter_words(words: &[RecognizedWord], config: &ReflowConfig) -> Vec<FilteredWord> {
    words
        .iter()
        .filter_map(|word| {
            let text = word.text.trim();
            let confidence = word.normalized_confidence();
            keep(text, confidence, config).then(|| FilteredWord {
                text: text.to_string(),
                confidence,
                bbox: word.bbox.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflow::tests::word;

    fn kept(words: &[RecognizedWord]) -> Vec<String> {
        filter_words(words, &ReflowConfig::default())
            .into_iter()
            .map(|w| w.text)
            .collect()
    }

    #[test]
    fn test_confidence_is_normalized() {
        let out = filter_words(&[word("reading", 87.0, 0.0, 0.0)], &ReflowConfig::default());
        assert_eq!(out.len(), 1);
        assert!((out[0].confidence - 0.87).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_below_threshold() {
        let words = [
            word("borderline", 60.0, 0.0, 0.0),
            word("under", 59.9, 0.0, 0.0),
            word("whatever", 55.0, 0.0, 0.0),
        ];
        assert_eq!(kept(&words), ["borderline"]);
    }

    #[test]
    fn test_no_low_confidence_word_survives_any_mix() {
        let words: Vec<_> = (0..100)
            .map(|i| word(&format!("word{i}"), i as f64, i as f64, 0.0))
            .collect();
        let out = filter_words(&words, &ReflowConfig::default());
        assert!(out.iter().all(|w| w.confidence >= 0.6));
        assert_eq!(out.len(), 40);
    }

    #[test]
    fn test_rejects_short_and_empty_text() {
        let words = [
            word("", 99.0, 0.0, 0.0),
            word("  ", 99.0, 0.0, 0.0),
            word("an", 99.0, 0.0, 0.0),
            word(" a ", 99.0, 0.0, 0.0),
            word("the", 99.0, 0.0, 0.0),
        ];
        assert_eq!(kept(&words), ["the"]);
    }

    #[test]
    fn test_rejects_short_all_caps() {
        let words = [
            word("NEWS", 99.0, 0.0, 0.0),
            word("BBC", 99.0, 0.0, 0.0),
            word("MENU", 99.0, 0.0, 0.0),
            word("NASA's", 99.0, 0.0, 0.0),
            word("HEADLINE", 99.0, 0.0, 0.0),
            word("ÉTÉ", 99.0, 0.0, 0.0),
            word("Été", 99.0, 0.0, 0.0),
        ];
        assert_eq!(kept(&words), ["NASA's", "HEADLINE", "Été"]);
    }

    #[test]
    fn test_rejects_text_without_letters() {
        let words = [
            word("2024", 99.0, 0.0, 0.0),
            word("...", 99.0, 0.0, 0.0),
            word("$100", 99.0, 0.0, 0.0),
            word("10am", 99.0, 0.0, 0.0),
        ];
        assert_eq!(kept(&words), ["10am"]);
    }

    #[test]
    fn test_rejects_navigation_labels_any_case() {
        let words = [
            word("Business", 99.0, 0.0, 0.0),
            word("culture", 99.0, 0.0, 0.0),
            word("TRAVEL", 99.0, 0.0, 0.0),
            word("Homeward", 99.0, 0.0, 0.0),
        ];
        assert_eq!(kept(&words), ["Homeward"]);
    }

    #[test]
    fn test_preserves_input_order() {
        let words = [
            word("zebra", 99.0, 300.0, 50.0),
            word("apple", 99.0, 0.0, 0.0),
            word("mango", 99.0, 10.0, 20.0),
        ];
        assert_eq!(kept(&words), ["zebra", "apple", "mango"]);
    }
}

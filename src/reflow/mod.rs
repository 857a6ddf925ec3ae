//! Text reflow pipeline: turns OCR word boxes into readable paragraphs.
//!
//! Stages run in a fixed order: filter -> sort -> join -> normalize -> sentences -> paragraphs.
//! Every stage is a pure function; the pipeline never fails on well-formed input and an
//! empty or fully filtered word list simply yields an empty document.

mod filter;
mod normalize;
mod paragraphs;
mod rules;
mod sentences;
mod sort;

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::system::RecognizedWord;

pub use filter::{filter_words, FilteredWord, NAVIGATION_LABELS};
pub use normalize::normalize_text;
pub use paragraphs::compose_paragraphs;
pub use sentences::{clean_sentence, clean_sentences, split_sentences};
pub use sort::sort_reading_order;

// --- Tunable heuristics ---
//
// Hand-tuned against captured news pages. Overridable through `ReflowConfig`.

/// Minimum normalized confidence (0-1) a word needs to survive filtering.
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.6;
/// Top edges closer than this many pixels are read as the same line.
pub const DEFAULT_LINE_TOLERANCE_PX: f64 = 10.0;
/// A paragraph is closed once it holds this many sentences.
pub const DEFAULT_MAX_SENTENCES_PER_PARAGRAPH: usize = 3;
/// Sentences shorter than this (in characters) start a paragraph of their own.
pub const DEFAULT_SHORT_SENTENCE_CHARS: usize = 30;

/// Thresholds used by the reflow stages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReflowConfig {
    pub min_confidence: f64,
    pub line_tolerance_px: f64,
    pub max_sentences_per_paragraph: usize,
    pub short_sentence_chars: usize,
}

impl Default for ReflowConfig {
    fn default() -> Self {
        Self {
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            line_tolerance_px: DEFAULT_LINE_TOLERANCE_PX,
            max_sentences_per_paragraph: DEFAULT_MAX_SENTENCES_PER_PARAGRAPH,
            short_sentence_chars: DEFAULT_SHORT_SENTENCE_CHARS,
        }
    }
}

/// Final paragraph-structured text. Immutable once produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CleanedDocument(String);

impl CleanedDocument {
    pub(crate) fn from_paragraphs(paragraphs: Vec<String>) -> Self {
        Self(paragraphs.join("\n\n"))
    }

    /// Wraps text that was cleaned elsewhere (e.g. by the remote service).
    pub fn from_external(text: String) -> Self {
        Self(text.trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn paragraphs(&self) -> impl Iterator<Item = &str> {
        self.0.split("\n\n").filter(|p| !p.is_empty())
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CleanedDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of one pipeline run: the document plus the words it was built from.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReflowOutput {
    pub document: CleanedDocument,
    pub words: Vec<FilteredWord>,
}

/// Filters and sorts recognized words, then joins them into one space-separated string.
pub fn prepare_words(words: &[RecognizedWord], config: &ReflowConfig) -> (Vec<FilteredWord>, String) {
    let mut filtered = filter_words(words, config);
    sort_reading_order(&mut filtered, config.line_tolerance_px);
    let joined = filtered
        .iter()
        .map(|w| w.text.trim())
        .collect::<Vec<_>>()
        .join(" ");
    debug!(
        recognized = words.len(),
        kept = filtered.len(),
        chars = joined.len(),
        "Prepared words for reflow"
    );
    (filtered, joined)
}

/// Runs the whole local pipeline over one frame's recognized words.
pub fn reflow_words(words: &[RecognizedWord], config: &ReflowConfig) -> ReflowOutput {
    let (filtered, joined) = prepare_words(words, config);
    ReflowOutput {
        document: reflow_text(&joined, config),
        words: filtered,
    }
}

/// Normalize, segment and compose raw text. Applying it to its own output changes nothing.
pub fn reflow_text(text: &str, config: &ReflowConfig) -> CleanedDocument {
    let normalized = normalize_text(text);
    if normalized.is_empty() {
        debug!("Nothing left after normalization");
        return CleanedDocument::default();
    }
    let sentences = clean_sentences(&normalized);
    debug!(sentences = sentences.len(), "Segmented text");
    compose_paragraphs(&sentences, config)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::system::BoundingBox;

    pub(crate) fn word(text: &str, confidence: f64, x0: f64, y0: f64) -> RecognizedWord {
        RecognizedWord {
            text: text.to_string(),
            confidence,
            bbox: BoundingBox {
                x0,
                y0,
                x1: x0 + 40.0,
                y1: y0 + 12.0,
            },
        }
    }

    #[test]
    fn test_single_line_headline_drops_nav_label() {
        let words = vec![
            word("NEWS", 95.0, 0.0, 10.0),
            word("The", 91.0, 50.0, 10.0),
            word("quick", 92.0, 100.0, 10.0),
            word("fox.", 90.0, 150.0, 10.0),
        ];
        let out = reflow_words(&words, &ReflowConfig::default());
        assert_eq!(out.document.as_str(), "The quick fox.");
        let kept: Vec<_> = out.words.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(kept, ["The", "quick", "fox."]);
    }

    #[test]
    fn test_short_sentences_get_own_paragraphs() {
        let doc = reflow_text(
            "hello world this is great. and it works well. ok.",
            &ReflowConfig::default(),
        );
        // "ok." is under the five character floor and is dropped as junk.
        assert_eq!(doc.as_str(), "Hello world this is great.\n\nAnd it works well.");
        assert_eq!(doc.paragraphs().count(), 2);
    }

    #[test]
    fn test_low_confidence_word_never_survives() {
        let words = vec![
            word("Important", 55.0, 0.0, 0.0),
            word("sentence", 90.0, 60.0, 0.0),
        ];
        let out = reflow_words(&words, &ReflowConfig::default());
        assert!(out.words.iter().all(|w| w.text != "Important"));
        assert!(!out.document.as_str().contains("Important"));
    }

    #[test]
    fn test_empty_input_gives_empty_document() {
        let out = reflow_words(&[], &ReflowConfig::default());
        assert!(out.document.is_empty());
        assert!(out.words.is_empty());
        assert_eq!(out.document.as_str(), "");
    }

    #[test]
    fn test_navigation_menu_removed_from_text() {
        let doc = reflow_text(
            "Home News Sport Business Innovation Culture Arts Travel Earth Audio Video Live \
             Markets rallied sharply on Tuesday after the announcement.",
            &ReflowConfig::default(),
        );
        assert_eq!(
            doc.as_str(),
            "Markets rallied sharply on Tuesday after the announcement."
        );
    }

    #[test]
    fn test_reflow_is_idempotent() {
        let config = ReflowConfig::default();
        let inputs = [
            "hello world this is great. and it works well. ok.",
            "the council met on monday , and voted to approve the budget . it was a close vote ! \
             critics say the plan is rushed ; supporters disagree . \"we need this now\" , said one member .",
            "A long opening sentence that easily runs past thirty characters. A second sentence \
             that also runs long enough to stay. A third one that is similarly long enough. \
             A fourth sentence which should start a new paragraph.",
            "on. - 3.14 end: ",
            "- ok. -\nA café (note) Dr. ",
            "it ended.then we said;\"yes\" to items:1 and 2.",
        ];
        for input in inputs {
            let once = reflow_text(input, &config);
            let twice = reflow_text(once.as_str(), &config);
            assert_eq!(once, twice, "input: {input}");
        }
    }

    #[test]
    fn test_decoration_after_dropped_sentence_is_stripped() {
        let config = ReflowConfig::default();
        let once = reflow_text("on. - 3.14 end: ", &config);
        assert_eq!(once.as_str(), "3.14 end:");
        assert_eq!(reflow_text(once.as_str(), &config), once);
    }

    #[test]
    fn test_paragraphs_never_empty_and_single_blank_line() {
        let config = ReflowConfig::default();
        let doc = reflow_text(
            "Short one. Another short. A much longer sentence that keeps on going for a while. \
             Yet another long sentence that keeps the paragraph going. [ ] ... !!! ?",
            &config,
        );
        assert!(!doc.as_str().contains("\n\n\n"));
        for paragraph in doc.as_str().split("\n\n") {
            assert!(!paragraph.trim().is_empty());
        }
    }

    #[test]
    fn test_multi_line_words_reflow_in_reading_order() {
        let words = vec![
            word("second", 95.0, 10.0, 40.0),
            word("line.", 95.0, 80.0, 42.0),
            word("First", 95.0, 10.0, 0.0),
            word("line", 95.0, 70.0, 3.0),
            word("here", 95.0, 120.0, 1.0),
            word("and", 95.0, 170.0, 0.0),
        ];
        let out = reflow_words(&words, &ReflowConfig::default());
        assert_eq!(out.document.as_str(), "First line here and second line.");
    }

    #[test]
    fn test_custom_thresholds_are_honoured() {
        let config = ReflowConfig {
            min_confidence: 0.95,
            ..ReflowConfig::default()
        };
        let words = vec![word("Confident", 96.0, 0.0, 0.0), word("unsure", 90.0, 50.0, 0.0)];
        let out = reflow_words(&words, &config);
        assert_eq!(out.words.len(), 1);
        assert_eq!(out.words[0].text, "Confident");
    }
}

//! Sentence segmentation and per-sentence cleanup.

use std::sync::LazyLock;

use super::rules::{apply_rules, Rule};

const MIN_SENTENCE_CHARS: usize = 5;
const MAX_FRAGMENT_CHARS: usize = 5;
const LEADING_DECORATIONS: [char; 5] = ['=', '-', '@', '®', '©'];

static SENTENCE_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        Rule::new("collapse_whitespace", r"\s+", " "),
        // A suffix followed by another quote is a quoted letter ('t'), not a contraction.
        Rule::new(
            "contractions",
            r"(?i)(\p{L})\s*'+\s*(s|t|re|ve|ll|d|m)\b([^']|$)",
            "$1'$2$3",
        ),
        Rule::new("space_before_punctuation", r" +([,.!?;:])", "$1"),
        // A quote directly after the mark opens a quotation; `"yes,"` keeps its closing quote.
        Rule::new("space_after_mark", r#"([,!?;:])(["']?\p{L})"#, "$1 $2"),
        // Digit on both sides is a number ("1,000", "3:30").
        Rule::new("space_after_mark_digit", r#"(^|\D)([,!?;:])(["']?\d)"#, "$1$2 $3"),
        // A single letter followed by another period is an abbreviation ("e.g.", "U.S.").
        Rule::new("space_after_period", r"\.(\p{L})(\p{L}|[^\p{L}.]|$)", ". $1$2"),
        Rule::new("trim", r"^ +| +$", ""),
    ]
});

/// Splits after `.`, `!` or `?` when whitespace follows. Pieces are trimmed; empty ones dropped.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((_, c)) = chars.next() {
        if matches!(c, '.' | '!' | '?') {
            if let Some(&(next, n)) = chars.peek() {
                if n.is_whitespace() {
                    sentences.push(&text[start..next]);
                    start = next;
                }
            }
        }
    }
    sentences.push(&text[start..]);
    sentences
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Stray header fragments such as "UK" or "BBC A".
fn is_caps_fragment(sentence: &str) -> bool {
    let len = sentence.chars().count();
    (1..=MAX_FRAGMENT_CHARS).contains(&len)
        && sentence
            .chars()
            .all(|c| c.is_uppercase() || c == ' ')
}

fn is_junk(sentence: &str) -> bool {
    sentence.chars().count() < MIN_SENTENCE_CHARS
        || is_caps_fragment(sentence)
        || !sentence.chars().any(char::is_alphabetic)
}

fn capitalize_first(sentence: &str) -> String {
    let mut chars = sentence.chars();
    match chars.next() {
        Some(first) if first.is_lowercase() => first.to_uppercase().chain(chars).collect(),
        _ => sentence.to_string(),
    }
}

/// Cleans one candidate sentence, or returns `None` if it is junk.
pub fn clean_sentence(candidate: &str) -> Option<String> {
    // Dropping a junk sentence can leave a decoration at the start of the next one.
    let sentence = candidate
        .trim_start_matches(|c: char| c.is_whitespace() || LEADING_DECORATIONS.contains(&c))
        .trim_end();
    if is_junk(sentence) {
        return None;
    }
    let cleaned = apply_rules(&SENTENCE_RULES, &capitalize_first(sentence));
    (!cleaned.is_empty()).then_some(cleaned)
}

/// Segments normalized text and keeps the sentences worth reading, in order.
pub fn clean_sentences(text: &str) -> Vec<String> {
    split_sentences(text)
        .into_iter()
        .filter_map(clean_sentence)
        // Spacing fixes can open a new split point ("today.Then" -> "today. Then").
        .flat_map(|cleaned| {
            split_sentences(&cleaned)
                .into_iter()
                .filter_map(clean_sentence)
                .collect::<Vec<_>>()
        })
        .collect()
}

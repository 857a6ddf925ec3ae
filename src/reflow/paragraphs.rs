//! Groups cleaned sentences into paragraphs.

use super::{CleanedDocument, ReflowConfig};

fn starts_with_quote(sentence: &str) -> bool {
    sentence.starts_with(['"', '\''])
}

fn ends_with_colon(sentence: &str) -> bool {
    sentence.trim_end().ends_with(':')
}

/// True when `sentence` should open a new paragraph instead of extending `current`.
fn breaks_paragraph(current: &[&str], sentence: &str, config: &ReflowConfig) -> bool {
    !current.is_empty()
        && (current.len() >= config.max_sentences_per_paragraph
            || starts_with_quote(sentence)
            || sentence.chars().count() < config.short_sentence_chars
            || ends_with_colon(sentence))
}

/// Folds sentences into paragraphs separated by a blank line.
pub fn compose_paragraphs<S: AsRef<str>>(sentences: &[S], config: &ReflowConfig) -> CleanedDocument {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for sentence in sentences {
        let sentence: &str = sentence.as_ref();
        if breaks_paragraph(&current, sentence, config) {
            paragraphs.push(current.join(" "));
            current.clear();
        }
        current.push(sentence);
    }
    if !current.is_empty() {
        paragraphs.push(current.join(" "));
    }

    paragraphs.retain(|p| !p.trim().is_empty());
    CleanedDocument::from_paragraphs(paragraphs)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LONG_A: &str = "This first sentence is comfortably longer than thirty characters.";
    const LONG_B: &str = "The second sentence is also well over the short threshold.";
    const LONG_C: &str = "A third sentence keeps the same paragraph going for now.";
    const LONG_D: &str = "The fourth sentence has to start a brand new paragraph.";

    fn compose(sentences: &[&str]) -> String {
        compose_paragraphs(sentences, &ReflowConfig::default()).into_string()
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(compose(&[]), "");
    }

    #[test]
    fn test_three_sentence_limit() {
        assert_eq!(
            compose(&[LONG_A, LONG_B, LONG_C, LONG_D]),
            format!("{LONG_A} {LONG_B} {LONG_C}\n\n{LONG_D}")
        );
    }

    #[test]
    fn test_short_sentence_breaks() {
        assert_eq!(
            compose(&[LONG_A, "Short one.", LONG_B]),
            format!("{LONG_A}\n\nShort one. {LONG_B}")
        );
    }

    #[test]
    fn test_short_first_sentence_does_not_create_empty_paragraph() {
        assert_eq!(compose(&["Tiny start."]), "Tiny start.");
    }

    #[test]
    fn test_quote_start_breaks() {
        let quoted = "\"We will not back down from this fight,\" she said.";
        let single = "'Nobody expected the result to be this close,' he added.";
        assert_eq!(
            compose(&[LONG_A, quoted, single]),
            format!("{LONG_A}\n\n{quoted}\n\n{single}")
        );
    }

    #[test]
    fn test_colon_end_breaks() {
        let lead = "The committee published the following findings today:";
        assert_eq!(
            compose(&[LONG_A, lead, LONG_B]),
            format!("{LONG_A}\n\n{lead} {LONG_B}")
        );
        assert_eq!(
            compose(&[LONG_A, "Here is what happened next in order:  "]),
            format!("{LONG_A}\n\nHere is what happened next in order:  ")
        );
    }

    #[test]
    fn test_custom_limits() {
        let config = ReflowConfig {
            max_sentences_per_paragraph: 1,
            short_sentence_chars: 0,
            ..ReflowConfig::default()
        };
        let doc = compose_paragraphs(&["Tiny.", "Also tiny."], &config);
        assert_eq!(doc.as_str(), "Tiny.\n\nAlso tiny.");
    }

    #[test]
    fn test_blank_sentences_never_make_blank_paragraphs() {
        let doc = compose(&["", "   ", LONG_A]);
        assert!(!doc.starts_with('\n'));
        assert!(doc.split("\n\n").all(|p| !p.trim().is_empty()));
    }
}

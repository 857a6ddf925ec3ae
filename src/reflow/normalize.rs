//! Character-level cleanup of the concatenated word stream.

use std::sync::LazyLock;

use super::rules::{apply_rules, Rule};

/// Navigation bar text that shows up verbatim when a news page header is captured.
const NAVIGATION_MENU: &str =
    "Home News Sport Business Innovation Culture Arts Travel Earth Audio Video Live";

// Order matters: quotes and brackets must survive `disallowed_chars` so the later rules
// can rewrite them.
static NORMALIZE_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    let flexible_menu = NAVIGATION_MENU.split(' ').collect::<Vec<_>>().join(r"\s*");
    vec![
        Rule::new("leading_decorations", r"^[\s=\-@®©]+", ""),
        Rule::new("navigation_menu", &regex::escape(NAVIGATION_MENU), ""),
        Rule::new("navigation_menu_flexible", &flexible_menu, ""),
        Rule::new(
            "disallowed_chars",
            r#"[^\p{L}\p{N}\s.,!?;:'"()\-$£\[\]‘’‚‛“”„‟]"#,
            " ",
        ),
        Rule::new("brackets", r"[\[\]]", ""),
        Rule::new("space_before_open_paren", r"\s+\(", "("),
        Rule::new("space_after_close_paren", r"\)\s*", ") "),
        Rule::new("smart_single_quotes", "[‘’‚‛]", "'"),
        Rule::new("smart_double_quotes", "[“”„‟]", "\""),
        Rule::new("trim", r"^\s+|\s+$", ""),
    ]
});

/// Strips boilerplate and non-content characters. May return an empty string.
pub fn normalize_text(text: &str) -> String {
    apply_rules(&NORMALIZE_RULES, text)
}

//! Ordered regex rewrite rules shared by the normalizer and the sentence cleaner.

use regex::Regex;
use tracing::trace;

/// A single `(pattern, replacement)` rewrite. Replacements may use `$1`-style group refs.
pub(crate) struct Rule {
    pub name: &'static str,
    pattern: Regex,
    replacement: &'static str,
}

impl Rule {
    /// Compiles a rule. Patterns are compile-time constants, so a bad one is a programming error.
    pub fn new(name: &'static str, pattern: &str, replacement: &'static str) -> Self {
        let pattern = Regex::new(pattern)
            .unwrap_or_else(|e| panic!("invalid pattern for rule {name}: {e}"));
        Self {
            name,
            pattern,
            replacement,
        }
    }

    pub fn apply(&self, text: &str) -> String {
        self.pattern.replace_all(text, self.replacement).into_owned()
    }
}

/// Runs every rule in order, each one seeing the previous rule's output.
pub(crate) fn apply_rules(rules: &[Rule], text: &str) -> String {
    rules.iter().fold(text.to_string(), |acc, rule| {
        let next = rule.apply(&acc);
        if next != acc {
            trace!(rule = rule.name, "Rule rewrote text");
        }
        next
    })
}

/// Looks a rule up by name; only used to exercise rules in isolation.
#[cfg(test)]
pub(crate) fn rule<'a>(rules: &'a [Rule], name: &str) -> &'a Rule {
    rules
        .iter()
        .find(|r| r.name == name)
        .unwrap_or_else(|| panic!("no rule named {name}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rules_apply_in_order() {
        let rules = [
            Rule::new("a_to_b", "a", "b"),
            Rule::new("b_to_c", "b", "c"),
        ];
        assert_eq!(apply_rules(&rules, "aab"), "ccc");
    }

    #[test]
    fn test_rule_group_references() {
        let r = Rule::new("swap", r"(\w)-(\w)", "$2-$1");
        assert_eq!(r.apply("a-b c-d"), "b-a d-c");
    }
}

//! Jurisdiction detection over raw (case-preserved) text.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::categorizer::taxonomy::US_STATES;

/// One whole-token pattern per state code, in scan order.
static CODE_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    US_STATES
        .iter()
        .map(|(code, _)| (*code, Regex::new(&format!(r"\b{code}\b")).unwrap()))
        .collect()
});

/// Alternation of full state names, longest first.
static NAME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    let mut names: Vec<&str> = US_STATES.iter().map(|(_, name)| *name).collect();
    names.sort_by_key(|name| std::cmp::Reverse(name.len()));
    let alternation = names
        .iter()
        .map(|name| regex::escape(name))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"\b(?:{alternation})\b")).unwrap()
});

/// Returns the first state code (in list order) present as a whole token.
///
/// Falls back to the leftmost full state name when no code is present.
pub fn extract_jurisdiction(text: &str) -> Option<String> {
    if let Some((code, _)) = CODE_PATTERNS.iter().find(|(_, re)| re.is_match(text)) {
        return Some((*code).to_string());
    }

    let found = NAME_PATTERN.find(text)?;
    US_STATES
        .iter()
        .find(|(_, name)| *name == found.as_str())
        .map(|(code, _)| (*code).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_as_whole_token() {
        assert_eq!(extract_jurisdiction("Filed in Richmond, VA 23219").as_deref(), Some("VA"));
    }

    #[test]
    fn test_code_inside_word_is_ignored() {
        // "VAT" and "CAT" contain codes but not as whole tokens
        assert_eq!(extract_jurisdiction("VAT and CAT numbers"), None);
    }

    #[test]
    fn test_codes_are_case_sensitive() {
        assert_eq!(extract_jurisdiction("call me at va office"), None);
    }

    #[test]
    fn test_list_order_beats_text_order() {
        // TX appears first in the text, but CA is earlier in the code list
        assert_eq!(extract_jurisdiction("Offices: TX, CA").as_deref(), Some("CA"));
    }

    #[test]
    fn test_state_name_fallback() {
        assert_eq!(
            extract_jurisdiction("Building A, Virginia. Contact us.").as_deref(),
            Some("VA")
        );
    }

    #[test]
    fn test_longest_state_name_wins() {
        assert_eq!(
            extract_jurisdiction("Plant site in West Virginia").as_deref(),
            Some("WV")
        );
        assert_eq!(extract_jurisdiction("Offices in New York").as_deref(), Some("NY"));
    }

    #[test]
    fn test_code_preferred_over_name() {
        assert_eq!(extract_jurisdiction("Texas office, OH branch").as_deref(), Some("OH"));
    }

    #[test]
    fn test_no_jurisdiction() {
        assert_eq!(extract_jurisdiction("nothing regional here"), None);
    }
}

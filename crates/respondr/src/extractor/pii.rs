//! Sensitive-data presence check.

use once_cell::sync::Lazy;
use regex::Regex;

static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{3}[-.]?\d{3}[-.]?\d{4}\b").unwrap());
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Z|a-z]{2,}\b").unwrap());
static SSN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").unwrap());

/// True when the text contains a phone number, email address or SSN shape.
pub fn contains_pii(text: &str) -> bool {
    [&*PHONE_RE, &*EMAIL_RE, &*SSN_RE]
        .iter()
        .any(|re| re.is_match(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_each_family() {
        assert!(contains_pii("Call 555-123-4567 for help"));
        assert!(contains_pii("call 555.123.4567"));
        assert!(contains_pii("Reach jane@example.com today"));
        assert!(contains_pii("SSN on file: 123-45-6789"));
    }

    #[test]
    fn test_clean_text() {
        assert!(!contains_pii("Evacuate via the north stairwell, Building A."));
        assert!(!contains_pii("Version 2.1 effective 01/15/2024"));
    }

    #[test]
    fn test_digit_run_inside_longer_number_is_ignored() {
        assert!(!contains_pii("order 12345678901234"));
    }
}

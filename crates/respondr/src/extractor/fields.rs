//! Ordered-pattern field extractors.
//!
//! Each extractor holds a list of alternative patterns. The first pattern (in
//! list order) that matches anywhere in the text decides the value; later
//! patterns are not consulted. Facility extraction is the exception and
//! collects matches from every pattern.

use once_cell::sync::Lazy;
use regex::Regex;

/// Maximum number of distinct facility references kept.
pub const MAX_FACILITIES: usize = 3;

const FACILITY_SEPARATOR: &str = ", ";

/// A list of alternative patterns, each with one capture group.
#[derive(Debug)]
pub struct PatternExtractor {
    patterns: Vec<Regex>,
}

impl PatternExtractor {
    /// Compiles `sources` in order. Panics on an invalid pattern; only used
    /// with the literals below.
    fn compile(sources: &[&str]) -> Self {
        let patterns = sources
            .iter()
            .map(|source| Regex::new(source).unwrap_or_else(|e| panic!("invalid pattern {source}: {e}")))
            .collect();
        Self { patterns }
    }

    /// Capture group 1 of the first pattern that matches.
    pub fn first_match(&self, text: &str) -> Option<String> {
        self.patterns.iter().find_map(|pattern| {
            pattern
                .captures(text)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string())
        })
    }

    /// Capture group 1 of every match, pattern by pattern.
    pub fn all_matches(&self, text: &str) -> Vec<String> {
        self.patterns
            .iter()
            .flat_map(|pattern| {
                pattern
                    .captures_iter(text)
                    .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
            })
            .collect()
    }
}

static VERSION: Lazy<PatternExtractor> = Lazy::new(|| {
    PatternExtractor::compile(&[
        r"(?i)version\s+(\d+\.\d+)",
        r"(?i)v(\d+\.\d+)",
        r"(?i)rev\.?\s+(\d+\.\d+)",
    ])
});

static EFFECTIVE_DATE: Lazy<PatternExtractor> = Lazy::new(|| {
    PatternExtractor::compile(&[
        r"(?i)effective\s+date:\s*(\d{1,2}[/-]\d{1,2}[/-]\d{2,4})",
        r"(?i)effective:\s*(\d{1,2}[/-]\d{1,2}[/-]\d{2,4})",
        r"(?i)date:\s*(\d{1,2}[/-]\d{1,2}[/-]\d{2,4})",
    ])
});

// Labels are case-insensitive; the name itself must be two capitalised words.
static AUTHOR: Lazy<PatternExtractor> = Lazy::new(|| {
    PatternExtractor::compile(&[
        r"(?i:author):\s*([A-Z][a-z]+\s+[A-Z][a-z]+)",
        r"(?i:prepared\s+by):\s*([A-Z][a-z]+\s+[A-Z][a-z]+)",
        r"(?i:written\s+by):\s*([A-Z][a-z]+\s+[A-Z][a-z]+)",
    ])
});

static FACILITY: Lazy<PatternExtractor> = Lazy::new(|| {
    PatternExtractor::compile(&[
        r"(?i)(Building\s+[A-Z0-9]+)",
        r"(?i)(Room\s+\d+)",
        r"(?i)(Floor\s+\d+)",
    ])
});

pub fn extract_version(text: &str) -> Option<String> {
    VERSION.first_match(text)
}

/// Effective date as the raw matched token (not parsed).
pub fn extract_effective_date(text: &str) -> Option<String> {
    EFFECTIVE_DATE.first_match(text)
}

pub fn extract_author(text: &str) -> Option<String> {
    AUTHOR.first_match(text)
}

/// Up to three distinct facility references joined with `", "`.
pub fn extract_facility(text: &str) -> Option<String> {
    let mut unique: Vec<String> = Vec::new();
    for found in FACILITY.all_matches(text) {
        if unique.len() == MAX_FACILITIES {
            break;
        }
        if !unique.contains(&found) {
            unique.push(found);
        }
    }

    if unique.is_empty() {
        None
    } else {
        Some(unique.join(FACILITY_SEPARATOR))
    }
}

//! Field extraction from raw document text.

pub mod coverage;
pub mod fields;
pub mod jurisdiction;
pub mod pii;

pub use coverage::{estimate_ocr_coverage, WORDS_PER_PAGE};
pub use fields::{extract_author, extract_effective_date, extract_facility, extract_version};
pub use jurisdiction::extract_jurisdiction;
pub use pii::contains_pii;

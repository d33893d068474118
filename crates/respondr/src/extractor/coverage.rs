/// Expected word count of a fully recognised page.
pub const WORDS_PER_PAGE: usize = 300;

/// Heuristic OCR coverage in percent: observed words against
/// [`WORDS_PER_PAGE`] per page, clamped to 100 and rounded to 2 decimals.
pub fn estimate_ocr_coverage(text: &str, page_count: u32) -> f64 {
    if page_count == 0 {
        return 0.0;
    }

    let words = text.split_whitespace().count() as f64;
    let expected = page_count as f64 * WORDS_PER_PAGE as f64;
    let coverage = (words / expected * 100.0).min(100.0);

    (coverage * 100.0).round() / 100.0
}

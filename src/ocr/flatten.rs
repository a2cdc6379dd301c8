//! Text flattening
//!
//! Converts a recognition result into plain text in reading order:
//!
//! - words of a line are joined with a single space, one line per row
//! - every block is followed by a blank line
//! - pages after the first are preceded by `----- Page N -----`
//!   surrounded by blank lines
//!
//! Engine order is kept as-is. Nothing is sorted, deduplicated or
//! filtered by confidence.

use super::types::{Page, RecognitionResult};

/// Returned when the result holds no text at all
pub const NO_TEXT_FALLBACK: &str = "No text was extracted from the document.";

/// Marker emitted before the page with the given 1-based number
pub fn page_separator(page_number: usize) -> String {
    format!("\n----- Page {} -----\n\n", page_number)
}

/// Flatten a full result into display text
///
/// Empty or whitespace-only output is replaced by [`NO_TEXT_FALLBACK`].
pub fn flatten(result: &RecognitionResult) -> String {
    let mut text = String::new();

    for (index, page) in result.pages.iter().enumerate() {
        if index > 0 {
            text.push_str(&page_separator(index + 1));
        }
        push_page(&mut text, page);
    }

    if text.trim().is_empty() {
        return NO_TEXT_FALLBACK.to_string();
    }
    text
}

/// Text of a single page, without separator or fallback
pub fn flatten_page(page: &Page) -> String {
    let mut text = String::new();
    push_page(&mut text, page);
    text
}

fn push_page(text: &mut String, page: &Page) {
    for block in &page.blocks {
        for line in &block.lines {
            let mut words = line.words.iter();
            if let Some(first) = words.next() {
                text.push_str(&first.value);
                for word in words {
                    text.push(' ');
                    text.push_str(&word.value);
                }
            }
            text.push('\n');
        }
        text.push('\n');
    }
}

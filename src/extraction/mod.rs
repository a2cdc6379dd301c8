//! Extraction
//!
//! Drives one upload through loading, recognition and flattening, and
//! holds the resulting outcome.

mod service;
mod types;

pub use service::ExtractionService;
pub use types::{ExtractionOutcome, ExtractionSummary, PageFailure};

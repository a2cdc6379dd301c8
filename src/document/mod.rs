//! Document loading
//!
//! Validates uploads and converts them into page images for OCR.
//!
//! ```text
//!   Upload (bytes + file name)
//!        │  DocumentKind::from_file_name
//!        ▼
//!   DocumentLoader::load ──► temp file ──► image::open      (jpg/png/bmp/tiff)
//!                                    └──► PdfRasterizer     (pdf, MuPDF)
//!        │
//!        ▼
//!   Vec<PageImage>
//! ```

mod error;
mod loader;
mod pdf;
mod types;

pub use error::{LoaderError, Result};
pub use loader::{DocumentLoader, FileLoader};
pub use pdf::PdfRasterizer;
pub use types::{DocumentKind, PageImage, Upload, ACCEPTED_EXTENSIONS};

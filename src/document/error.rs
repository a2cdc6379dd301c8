//! Document loader errors

use thiserror::Error;

/// Errors raised while turning uploaded bytes into page images
#[derive(Debug, Error)]
pub enum LoaderError {
    /// Upload contained no data
    #[error("Uploaded file is empty")]
    Empty,

    /// Image could not be decoded
    #[error("Failed to decode image: {0}")]
    Decode(String),

    /// PDF could not be opened or rasterized
    #[error("Failed to rasterize PDF: {0}")]
    Pdf(String),

    /// Page image could not be encoded
    #[error("Failed to encode page image: {0}")]
    Encode(String),

    /// PDF exceeds the configured page limit
    #[error("Document has {count} pages (max: {max})")]
    TooManyPages { count: usize, max: usize },

    /// Document has no pages at all
    #[error("Document has no pages")]
    NoPages,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Blocking task failed to complete
    #[error("Loader task failed: {0}")]
    Task(String),
}

pub type Result<T> = std::result::Result<T, LoaderError>;

impl From<mupdf::Error> for LoaderError {
    fn from(err: mupdf::Error) -> Self {
        LoaderError::Pdf(err.to_string())
    }
}

impl From<image::ImageError> for LoaderError {
    fn from(err: image::ImageError) -> Self {
        LoaderError::Decode(err.to_string())
    }
}

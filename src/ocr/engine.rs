//! OCR engine traits
//!
//! An `EngineFactory` represents one external OCR backend. It can check
//! that the backend's system dependency is present and build engines for a
//! given configuration. Built engines are cached by `EngineCache`.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::config::EngineConfig;
use super::types::RecognitionResult;
use crate::document::PageImage;

/// OCR backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineBackend {
    /// docTR HTTP service
    Doctr,
    /// Local `tesseract` binary
    Tesseract,
}

impl Default for EngineBackend {
    fn default() -> Self {
        Self::Doctr
    }
}

impl FromStr for EngineBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "doctr" => Ok(Self::Doctr),
            "tesseract" => Ok(Self::Tesseract),
            other => Err(format!("unknown OCR backend '{}'", other)),
        }
    }
}

/// OCR error types
#[derive(Debug, Clone, thiserror::Error)]
pub enum OcrError {
    /// Required system dependency is absent (binary, service)
    #[error("Missing system dependency: {0}")]
    MissingDependency(String),

    /// Engine could not be built for the requested configuration
    #[error("Failed to load OCR model: {0}")]
    ModelLoad(String),

    #[error("OCR processing failed: {0}")]
    ProcessingError(String),

    #[error("API error: {0}")]
    ApiError(String),

    /// Engine output could not be interpreted
    #[error("Invalid engine response: {0}")]
    InvalidResponse(String),

    #[error("Failed to encode page image: {0}")]
    ImageEncoding(String),
}

/// A ready-to-run OCR engine for one configuration
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Human-readable engine name for logs
    fn name(&self) -> String;

    /// Recognize text on the given pages
    ///
    /// Returns exactly one result page per input page, in input order.
    async fn run(&self, pages: &[PageImage]) -> Result<RecognitionResult, OcrError>;
}

/// Builds engines for one backend
#[async_trait]
pub trait EngineFactory: Send + Sync {
    fn backend(&self) -> EngineBackend;

    /// Check the backend's external dependency is reachable
    async fn probe(&self) -> Result<(), OcrError>;

    /// Build an engine for `config`
    async fn build(&self, config: &EngineConfig) -> Result<Arc<dyn OcrEngine>, OcrError>;
}

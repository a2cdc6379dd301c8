//! OCR Module
//!
//! Wraps external OCR engines and owns the text produced from their output.
//!
//! Supports two backends:
//! - docTR (HTTP service, selectable detector/recognizer architectures)
//! - Tesseract (local binary)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ocr_desk_server::ocr::{flatten, DoctrFactory, EngineCache, EngineConfig};
//!
//! let cache = EngineCache::new(Arc::new(DoctrFactory::default_url()));
//! let engine = cache.get_or_build(&EngineConfig::default()).await?;
//!
//! let result = engine.run(&pages).await?;
//! println!("{}", flatten(&result));
//! ```

mod cache;
mod config;
mod doctr;
mod engine;
mod flatten;
mod synthesize;
mod tesseract;
mod types;

pub use cache::{CacheStats, EngineCache};
pub use config::{
    DetectorArch, EngineConfig, EngineConfigError, Language, ModelPreset, RawEngineConfig,
    RecognizerArch,
};
pub use doctr::{DoctrEngine, DoctrFactory};
pub use engine::{EngineBackend, EngineFactory, OcrEngine, OcrError};
pub use flatten::{flatten, flatten_page, page_separator, NO_TEXT_FALLBACK};
pub use synthesize::{encode_png, synthesize, OverlayStyle, VisualizationError};
pub use tesseract::{parse_tsv, TesseractEngine, TesseractFactory};
pub use types::{Block, Geometry, Line, Page, PixelRect, RecognitionResult, Word};

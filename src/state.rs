//! Application state management

use std::sync::Arc;

use crate::config::Config;
use crate::document::{DocumentLoader, FileLoader, PdfRasterizer};
use crate::extraction::ExtractionService;
use crate::ocr::{DoctrFactory, EngineBackend, EngineCache, EngineFactory, TesseractFactory};
use crate::session::SessionStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    sessions: SessionStore,
    extraction: ExtractionService,
}

impl AppState {
    /// Create state around the given loader and engine factory
    pub fn new(
        config: Config,
        loader: Arc<dyn DocumentLoader>,
        factory: Arc<dyn EngineFactory>,
    ) -> Self {
        let engines = EngineCache::new(factory);
        let extraction = ExtractionService::new(loader, engines, config.loader.visualize);
        let sessions = SessionStore::new(config.sessions.ttl_minutes);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                sessions,
                extraction,
            }),
        }
    }

    /// Create state with the MuPDF loader and the configured OCR backend
    pub fn from_config(config: Config) -> Self {
        let rasterizer = PdfRasterizer::new(config.loader.pdf_dpi, config.loader.max_pages);
        let loader = Arc::new(FileLoader::new(rasterizer, config.loader.temp_dir.clone()));

        let factory: Arc<dyn EngineFactory> = match config.engine.backend {
            EngineBackend::Doctr => Arc::new(DoctrFactory::new(
                &config.engine.doctr_url,
                config.engine.request_timeout(),
            )),
            EngineBackend::Tesseract => Arc::new(TesseractFactory::new(&config.engine.tesseract_path)),
        };

        Self::new(config, loader, factory)
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the session store
    pub fn sessions(&self) -> &SessionStore {
        &self.inner.sessions
    }

    /// Get the extraction service
    pub fn extraction(&self) -> &ExtractionService {
        &self.inner.extraction
    }
}

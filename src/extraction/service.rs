//! Extraction pipeline
//!
//! Upload → kind check → loader → cached engine → per-page OCR →
//! flattened text → optional annotated pages.

use std::sync::Arc;
use std::time::Instant;

use super::types::{ExtractionOutcome, PageFailure};
use crate::document::{DocumentLoader, LoaderError, PageImage, Upload, ACCEPTED_EXTENSIONS};
use crate::error::{AppError, Result};
use crate::ocr::{
    encode_png, synthesize, EngineCache, EngineConfig, OcrEngine, OcrError, OverlayStyle, Page,
    RecognitionResult, VisualizationError,
};

/// Runs uploads through loader and engine
#[derive(Clone)]
pub struct ExtractionService {
    loader: Arc<dyn DocumentLoader>,
    engines: EngineCache,
    /// Render annotated pages after recognition
    visualize: bool,
    style: OverlayStyle,
}

impl ExtractionService {
    pub fn new(loader: Arc<dyn DocumentLoader>, engines: EngineCache, visualize: bool) -> Self {
        Self {
            loader,
            engines,
            visualize,
            style: OverlayStyle::default(),
        }
    }

    pub fn engines(&self) -> &EngineCache {
        &self.engines
    }

    /// Check the OCR backend's system dependency
    pub async fn check_dependencies(&self) -> std::result::Result<(), OcrError> {
        self.engines.factory().probe().await
    }

    /// Extract text from an upload with the given configuration
    pub async fn extract(&self, upload: Upload, config: &EngineConfig) -> Result<ExtractionOutcome> {
        let started = Instant::now();

        let kind = upload.kind().ok_or_else(|| {
            AppError::UnsupportedInput(format!(
                "'{}' is not a supported file type (accepted: {})",
                upload.file_name,
                ACCEPTED_EXTENSIONS.join(", ")
            ))
        })?;

        self.check_dependencies().await?;

        let pages = self.loader.load(&upload.bytes, kind).await?;
        if pages.is_empty() {
            return Err(LoaderError::NoPages.into());
        }

        let engine = self.engines.get_or_build(config).await?;

        tracing::info!(
            file = %upload.file_name,
            kind = ?kind,
            pages = pages.len(),
            engine = %engine.name(),
            "Starting extraction"
        );

        let (result, page_failures) = recognize(engine.as_ref(), &pages).await?;

        let mut outcome = ExtractionOutcome::new(upload.file_name, kind, *config, result);
        outcome.page_failures = page_failures;

        if self.visualize {
            match self.annotate(outcome.result.clone(), pages).await {
                Ok(images) => outcome.annotated_pages = images,
                Err(e) => {
                    tracing::warn!(error = %e, "Visualization failed");
                    outcome
                        .warnings
                        .push(format!("Annotated pages unavailable: {}", e));
                }
            }
        }

        outcome.elapsed_ms = started.elapsed().as_millis() as u64;

        tracing::info!(
            id = %outcome.id,
            pages = outcome.page_count(),
            failed_pages = outcome.page_failures.len(),
            words = outcome.result.word_count(),
            elapsed_ms = outcome.elapsed_ms,
            "Extraction complete"
        );

        Ok(outcome)
    }

    async fn annotate(
        &self,
        result: Arc<RecognitionResult>,
        pages: Vec<PageImage>,
    ) -> std::result::Result<Vec<Vec<u8>>, VisualizationError> {
        let style = self.style.clone();

        tokio::task::spawn_blocking(move || -> std::result::Result<Vec<Vec<u8>>, VisualizationError> {
            synthesize(&result, &pages, &style)?
                .iter()
                .map(encode_png)
                .collect()
        })
        .await
        .map_err(|e| VisualizationError::Encode(format!("render task failed: {}", e)))?
    }
}

/// Run the engine one page at a time
///
/// A failed page is replaced by an empty page of the same size. A missing
/// dependency aborts the whole run, as does failure on every page.
async fn recognize(
    engine: &dyn OcrEngine,
    pages: &[PageImage],
) -> Result<(RecognitionResult, Vec<PageFailure>)> {
    let mut recognized = Vec::with_capacity(pages.len());
    let mut failures = Vec::new();

    for page in pages {
        let number = page.index + 1;

        let failure = match engine.run(std::slice::from_ref(page)).await {
            Ok(mut result) if result.pages.len() == 1 => {
                recognized.push(result.pages.remove(0));
                continue;
            }
            Ok(result) => format!(
                "engine returned {} pages for a single page",
                result.pages.len()
            ),
            Err(OcrError::MissingDependency(msg)) => return Err(AppError::MissingDependency(msg)),
            Err(e) => e.to_string(),
        };

        tracing::warn!(page = number, error = %failure, "Page OCR failed");
        failures.push(PageFailure {
            page: number,
            message: failure,
        });
        recognized.push(Page::empty(page.width(), page.height()));
    }

    if !pages.is_empty() && failures.len() == pages.len() {
        return Err(AppError::Extraction(format!(
            "OCR failed on every page ({} pages); first error: {}",
            pages.len(),
            failures[0].message
        )));
    }

    Ok((RecognitionResult::new(recognized), failures))
}

//! docTR backend
//!
//! Client for a docTR OCR HTTP service (`POST /ocr/`). Pages are sent as
//! PNG files in one multipart request together with the architecture ids
//! and orientation flags; the service answers with one document per page.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use super::config::EngineConfig;
use super::engine::{EngineBackend, EngineFactory, OcrEngine, OcrError};
use super::types::{Block, Geometry, Line, Page, RecognitionResult, Word};
use crate::document::PageImage;

/// Builds docTR engines sharing one HTTP client
pub struct DoctrFactory {
    /// docTR service URL
    base_url: String,
    client: reqwest::Client,
}

impl DoctrFactory {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(
                    error = %e,
                    timeout_secs = timeout.as_secs(),
                    "Failed to build docTR HTTP client, using defaults without timeout"
                );
                reqwest::Client::new()
            });

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn default_url() -> Self {
        Self::new("http://localhost:8080", Duration::from_secs(300))
    }
}

#[async_trait]
impl EngineFactory for DoctrFactory {
    fn backend(&self) -> EngineBackend {
        EngineBackend::Doctr
    }

    async fn probe(&self) -> Result<(), OcrError> {
        // Any HTTP answer means the service is up
        self.client
            .get(format!("{}/", self.base_url))
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .map(|_| ())
            .map_err(|e| {
                OcrError::MissingDependency(format!(
                    "docTR service at {} is unreachable: {}",
                    self.base_url, e
                ))
            })
    }

    async fn build(&self, config: &EngineConfig) -> Result<Arc<dyn OcrEngine>, OcrError> {
        Ok(Arc::new(DoctrEngine {
            base_url: self.base_url.clone(),
            client: self.client.clone(),
            config: *config,
        }))
    }
}

/// docTR engine bound to one configuration
pub struct DoctrEngine {
    base_url: String,
    client: reqwest::Client,
    config: EngineConfig,
}

/// Form fields describing the model configuration
fn form_fields(config: &EngineConfig) -> Vec<(&'static str, String)> {
    vec![
        ("det_arch", config.detector.as_str().to_string()),
        ("reco_arch", config.recognizer.as_str().to_string()),
        (
            "assume_straight_pages",
            (!config.detect_orientation).to_string(),
        ),
        ("detect_orientation", config.detect_orientation.to_string()),
        ("export_as_straight_boxes", config.straight_boxes.to_string()),
    ]
}

#[async_trait]
impl OcrEngine for DoctrEngine {
    fn name(&self) -> String {
        format!(
            "doctr[{}+{}]",
            self.config.detector.as_str(),
            self.config.recognizer.as_str()
        )
    }

    async fn run(&self, pages: &[PageImage]) -> Result<RecognitionResult, OcrError> {
        let mut form = Form::new();
        for (name, value) in form_fields(&self.config) {
            form = form.text(name, value);
        }
        for page in pages {
            let png = page
                .to_png()
                .map_err(|e| OcrError::ImageEncoding(e.to_string()))?;
            let part = Part::bytes(png)
                .file_name(format!("page-{}.png", page.index + 1))
                .mime_str("image/png")
                .map_err(|e| OcrError::ProcessingError(e.to_string()))?;
            form = form.part("files", part);
        }

        let url = format!("{}/ocr/", self.base_url);
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| OcrError::ApiError(format!("Failed to call docTR: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OcrError::ApiError(format!(
                "docTR returned {}: {}",
                status, body
            )));
        }

        let outputs: Vec<OcrOut> = response
            .json()
            .await
            .map_err(|e| OcrError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        into_result(outputs, pages, &self.config)
    }
}

// ============================================================================
// Response mapping
// ============================================================================

#[derive(Debug, Deserialize)]
struct ValueConfidence<T> {
    value: Option<T>,
}

#[derive(Debug, Deserialize)]
struct OcrOut {
    #[serde(default)]
    orientation: Option<ValueConfidence<f32>>,
    #[serde(default)]
    language: Option<ValueConfidence<String>>,
    /// (height, width)
    #[serde(default)]
    dimensions: Option<(u32, u32)>,
    #[serde(default)]
    items: Vec<OcrItem>,
}

#[derive(Debug, Deserialize)]
struct OcrItem {
    #[serde(default)]
    blocks: Vec<OcrBlock>,
}

#[derive(Debug, Deserialize)]
struct OcrBlock {
    #[serde(default)]
    geometry: Vec<f32>,
    #[serde(default)]
    lines: Vec<OcrLine>,
}

#[derive(Debug, Deserialize)]
struct OcrLine {
    #[serde(default)]
    geometry: Vec<f32>,
    #[serde(default)]
    words: Vec<OcrWord>,
}

#[derive(Debug, Deserialize)]
struct OcrWord {
    value: String,
    #[serde(default)]
    confidence: f32,
    #[serde(default)]
    geometry: Vec<f32>,
}

/// Box enclosing a flat list of relative coordinates
///
/// Accepts both straight boxes `[xmin, ymin, xmax, ymax]` and polygons
/// `[x1, y1, x2, y2, ...]`.
fn geometry_from(coords: &[f32]) -> Option<Geometry> {
    if coords.len() < 4 || coords.len() % 2 != 0 {
        return None;
    }
    let xs = coords.iter().step_by(2);
    let ys = coords.iter().skip(1).step_by(2);
    let xmin = xs.clone().copied().fold(f32::INFINITY, f32::min);
    let xmax = xs.copied().fold(f32::NEG_INFINITY, f32::max);
    let ymin = ys.clone().copied().fold(f32::INFINITY, f32::min);
    let ymax = ys.copied().fold(f32::NEG_INFINITY, f32::max);
    Some(Geometry::new(xmin, ymin, xmax, ymax))
}

fn into_result(
    outputs: Vec<OcrOut>,
    pages: &[PageImage],
    config: &EngineConfig,
) -> Result<RecognitionResult, OcrError> {
    if outputs.len() != pages.len() {
        return Err(OcrError::InvalidResponse(format!(
            "expected {} pages, got {}",
            pages.len(),
            outputs.len()
        )));
    }

    let result_pages = outputs
        .into_iter()
        .zip(pages)
        .map(|(out, input)| {
            let (height, width) = out.dimensions.unwrap_or((input.height(), input.width()));

            let blocks = out
                .items
                .into_iter()
                .flat_map(|item| item.blocks)
                .map(|block| {
                    let lines: Vec<Line> = block
                        .lines
                        .into_iter()
                        .map(|line| {
                            let words: Vec<Word> = line
                                .words
                                .into_iter()
                                .map(|w| {
                                    Word::new(
                                        w.value,
                                        w.confidence,
                                        geometry_from(&w.geometry).unwrap_or_default(),
                                    )
                                })
                                .collect();
                            match geometry_from(&line.geometry) {
                                Some(geometry) => Line { geometry, words },
                                None => Line::from_words(words),
                            }
                        })
                        .collect();
                    match geometry_from(&block.geometry) {
                        Some(geometry) => Block { geometry, lines },
                        None => Block::from_lines(lines),
                    }
                })
                .collect();

            Page {
                width,
                height,
                orientation: out.orientation.and_then(|o| o.value),
                language: out
                    .language
                    .and_then(|l| l.value)
                    .or_else(|| Some(config.language.code().to_string())),
                blocks,
            }
        })
        .collect();

    Ok(RecognitionResult::new(result_pages))
}

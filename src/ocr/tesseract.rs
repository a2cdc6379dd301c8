//! Tesseract backend
//!
//! Runs the `tesseract` binary with TSV output and rebuilds the
//! page/block/line/word hierarchy from its rows.
//!
//! ## Requirements
//!
//! - `tesseract` must be installed and available in PATH (or configured)
//! - traineddata for the requested language must be installed
//!
//! Tesseract has a single detection/recognition pipeline, so the detector
//! and recognizer ids of the configuration do not change its behavior.
//! Orientation detection switches the page segmentation mode to automatic
//! segmentation with OSD.

use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::process::Command;

use super::config::EngineConfig;
use super::engine::{EngineBackend, EngineFactory, OcrEngine, OcrError};
use super::types::{Block, Geometry, Line, Page, RecognitionResult, Word};
use crate::document::PageImage;

/// TSV row level for words
const WORD_LEVEL: u32 = 5;
/// Fully automatic page segmentation, no OSD
const PSM_AUTO: &str = "3";
/// Automatic page segmentation with orientation and script detection
const PSM_AUTO_OSD: &str = "1";

/// Builds Tesseract engines
pub struct TesseractFactory {
    /// Path to the tesseract executable
    binary: String,
}

impl TesseractFactory {
    pub fn new(binary: &str) -> Self {
        Self {
            binary: binary.to_string(),
        }
    }

    async fn installed_languages(&self) -> Result<Vec<String>, OcrError> {
        let output = Command::new(&self.binary)
            .arg("--list-langs")
            .output()
            .await
            .map_err(|e| self.missing(e))?;

        // Older releases print the list on stderr
        let mut listing = String::from_utf8_lossy(&output.stdout).to_string();
        listing.push_str(&String::from_utf8_lossy(&output.stderr));

        Ok(listing
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with("List of"))
            .map(str::to_string)
            .collect())
    }

    fn missing(&self, err: std::io::Error) -> OcrError {
        OcrError::MissingDependency(format!("tesseract ({}): {}", self.binary, err))
    }
}

#[async_trait]
impl EngineFactory for TesseractFactory {
    fn backend(&self) -> EngineBackend {
        EngineBackend::Tesseract
    }

    async fn probe(&self) -> Result<(), OcrError> {
        let status = Command::new(&self.binary)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|e| self.missing(e))?;

        if !status.success() {
            return Err(OcrError::MissingDependency(format!(
                "tesseract ({}) exited with {}",
                self.binary, status
            )));
        }
        Ok(())
    }

    async fn build(&self, config: &EngineConfig) -> Result<Arc<dyn OcrEngine>, OcrError> {
        let lang = config.language.tesseract_code();
        let installed = self.installed_languages().await?;

        if !installed.iter().any(|l| l == lang) {
            return Err(OcrError::ModelLoad(format!(
                "tesseract language data '{}' is not installed",
                lang
            )));
        }

        Ok(Arc::new(TesseractEngine {
            binary: self.binary.clone(),
            config: *config,
        }))
    }
}

/// Tesseract engine bound to one configuration
pub struct TesseractEngine {
    binary: String,
    config: EngineConfig,
}

impl TesseractEngine {
    async fn run_page(&self, page: &PageImage) -> Result<Page, OcrError> {
        let png = page
            .to_png()
            .map_err(|e| OcrError::ImageEncoding(e.to_string()))?;

        // Removed on drop, including the early-return paths below
        let input = tempfile::Builder::new()
            .prefix("ocr_page_")
            .suffix(".png")
            .tempfile()
            .map_err(|e| OcrError::ProcessingError(format!("Failed to create temp file: {}", e)))?;

        tokio::fs::write(input.path(), &png)
            .await
            .map_err(|e| OcrError::ProcessingError(format!("Failed to write temp file: {}", e)))?;

        let psm = if self.config.detect_orientation {
            PSM_AUTO_OSD
        } else {
            PSM_AUTO
        };

        let output = Command::new(&self.binary)
            .arg(input.path())
            .arg("stdout")
            .arg("-l")
            .arg(self.config.language.tesseract_code())
            .arg("--psm")
            .arg(psm)
            .arg("tsv")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| OcrError::ProcessingError(format!("Failed to run tesseract: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::ProcessingError(format!(
                "Tesseract failed: {}",
                stderr.trim()
            )));
        }

        let tsv = String::from_utf8_lossy(&output.stdout);
        let mut parsed = parse_tsv(&tsv, page.width(), page.height())?;
        parsed.language = Some(self.config.language.code().to_string());
        Ok(parsed)
    }
}

#[async_trait]
impl OcrEngine for TesseractEngine {
    fn name(&self) -> String {
        format!("tesseract[{}]", self.config.language.tesseract_code())
    }

    async fn run(&self, pages: &[PageImage]) -> Result<RecognitionResult, OcrError> {
        let mut results = Vec::with_capacity(pages.len());
        for page in pages {
            results.push(self.run_page(page).await?);
        }
        Ok(RecognitionResult::new(results))
    }
}

/// Parse Tesseract TSV output into a page
///
/// Words are grouped by `block_num`, then by `(par_num, line_num)`, in the
/// order rows appear. Rows with blank text are dropped.
pub fn parse_tsv(tsv: &str, page_width: u32, page_height: u32) -> Result<Page, OcrError> {
    let mut rows = tsv.lines();

    let header = rows
        .next()
        .ok_or_else(|| OcrError::InvalidResponse("empty TSV output".to_string()))?;
    if !header.starts_with("level") {
        return Err(OcrError::InvalidResponse(format!(
            "unexpected TSV header: {}",
            header
        )));
    }

    // (block_num, [((par_num, line_num), words)])
    let mut blocks: Vec<(u32, Vec<((u32, u32), Vec<Word>)>)> = Vec::new();

    for row in rows {
        let cols: Vec<&str> = row.splitn(12, '\t').collect();
        if cols.len() < 12 {
            continue;
        }

        let num = |i: usize| -> Result<u32, OcrError> {
            cols[i]
                .trim()
                .parse::<u32>()
                .map_err(|_| OcrError::InvalidResponse(format!("bad TSV row: {}", row)))
        };

        if num(0)? != WORD_LEVEL {
            continue;
        }
        let text = cols[11].trim();
        if text.is_empty() {
            continue;
        }

        let block_num = num(2)?;
        let line_key = (num(3)?, num(4)?);
        let geometry = Geometry::from_pixels(
            num(6)?,
            num(7)?,
            num(8)?,
            num(9)?,
            page_width,
            page_height,
        );
        let confidence = cols[10].trim().parse::<f32>().unwrap_or(0.0).max(0.0) / 100.0;
        let word = Word::new(text, confidence, geometry);

        match blocks.last_mut() {
            Some((current, lines)) if *current == block_num => match lines.last_mut() {
                Some((key, words)) if *key == line_key => words.push(word),
                _ => lines.push((line_key, vec![word])),
            },
            _ => blocks.push((block_num, vec![(line_key, vec![word])])),
        }
    }

    let blocks = blocks
        .into_iter()
        .map(|(_, lines)| {
            Block::from_lines(
                lines
                    .into_iter()
                    .map(|(_, words)| Line::from_words(words))
                    .collect(),
            )
        })
        .collect();

    Ok(Page {
        width: page_width,
        height: page_height,
        orientation: None,
        language: None,
        blocks,
    })
}

//! Annotated page rendering
//!
//! Draws the detected blocks and words of a recognition result over the
//! page images it was computed from.

use std::io::Cursor;

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use thiserror::Error;

use super::types::{Geometry, RecognitionResult};
use crate::document::PageImage;

const WORD_COLOR: Rgb<u8> = Rgb([0, 200, 0]);

const BLOCK_COLOR: Rgb<u8> = Rgb([30, 90, 230]);

/// Visualization errors
#[derive(Debug, Error)]
pub enum VisualizationError {
    #[error("Result has {result} pages but {images} page images were given")]
    PageCountMismatch { result: usize, images: usize },

    #[error("Page {0} has zero size")]
    EmptyPage(usize),

    #[error("Failed to encode annotated page: {0}")]
    Encode(String),
}

/// Styling for annotated pages
#[derive(Debug, Clone)]
pub struct OverlayStyle {
    /// Thickness of word boxes in pixels
    pub word_thickness: u32,
    /// Thickness of block boxes in pixels
    pub block_thickness: u32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            word_thickness: 1,
            block_thickness: 2,
        }
    }
}

/// Render one annotated image per page
pub fn synthesize(
    result: &RecognitionResult,
    pages: &[PageImage],
    style: &OverlayStyle,
) -> Result<Vec<RgbImage>, VisualizationError> {
    if result.pages.len() != pages.len() {
        return Err(VisualizationError::PageCountMismatch {
            result: result.pages.len(),
            images: pages.len(),
        });
    }

    result
        .pages
        .iter()
        .zip(pages)
        .map(|(page, input)| {
            if input.width() == 0 || input.height() == 0 {
                return Err(VisualizationError::EmptyPage(input.index + 1));
            }

            let mut canvas = input.image.to_rgb8();
            for block in &page.blocks {
                draw_box(&mut canvas, &block.geometry, BLOCK_COLOR, style.block_thickness);
                for word in block.lines.iter().flat_map(|l| l.words.iter()) {
                    draw_box(&mut canvas, &word.geometry, WORD_COLOR, style.word_thickness);
                }
            }
            Ok(canvas)
        })
        .collect()
}

fn draw_box(canvas: &mut RgbImage, geometry: &Geometry, color: Rgb<u8>, thickness: u32) {
    let (width, height) = canvas.dimensions();
    let rect = geometry.to_pixels(width, height);

    for inset in 0..thickness {
        let w = rect.width.saturating_sub(2 * inset);
        let h = rect.height.saturating_sub(2 * inset);
        if w == 0 || h == 0 {
            break;
        }
        let r = Rect::at((rect.x + inset) as i32, (rect.y + inset) as i32).of_size(w, h);
        draw_hollow_rect_mut(canvas, r, color);
    }
}

/// Encode an annotated page as PNG
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>, VisualizationError> {
    let mut buffer = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)
        .map_err(|e| VisualizationError::Encode(e.to_string()))?;
    Ok(buffer)
}

//! PDF rasterization via MuPDF
//!
//! MuPDF's `fz_context` is not thread-safe. Every call opens a fresh
//! document and all calls are serialized through a `parking_lot::Mutex`,
//! so a single rasterizer can be shared across requests.

use std::path::Path;

use image::{DynamicImage, RgbaImage};
use mupdf::{Colorspace, Document, Matrix};
use parking_lot::Mutex;

use super::error::{LoaderError, Result};

/// PDF points per inch
const POINTS_PER_INCH: f32 = 72.0;

/// Renders PDF pages to images at a fixed resolution
pub struct PdfRasterizer {
    /// Rendering resolution in dots per inch
    dpi: u32,
    /// Maximum number of pages accepted per document
    max_pages: usize,
    lock: Mutex<()>,
}

impl PdfRasterizer {
    pub fn new(dpi: u32, max_pages: usize) -> Self {
        Self {
            dpi: dpi.clamp(36, 600),
            max_pages,
            lock: Mutex::new(()),
        }
    }

    pub fn dpi(&self) -> u32 {
        self.dpi
    }

    /// Scale factor from PDF points to pixels
    pub fn scale(&self) -> f32 {
        self.dpi as f32 / POINTS_PER_INCH
    }

    /// Rasterize every page of the PDF at `path`
    ///
    /// Blocking; call from `spawn_blocking`.
    pub fn rasterize<P: AsRef<Path>>(&self, path: P) -> Result<Vec<DynamicImage>> {
        let _guard = self.lock.lock();

        let path_str = path.as_ref().to_string_lossy();
        let doc = Document::open(&*path_str)?;
        let count = doc.page_count()? as usize;

        if count == 0 {
            return Err(LoaderError::NoPages);
        }
        if count > self.max_pages {
            return Err(LoaderError::TooManyPages {
                count,
                max: self.max_pages,
            });
        }

        let scale = self.scale();
        let matrix = Matrix::new_scale(scale, scale);
        let colorspace = Colorspace::device_rgb();

        let mut pages = Vec::with_capacity(count);
        for index in 0..count {
            let page = doc.load_page(index as i32)?;
            let pixmap = page.to_pixmap(&matrix, &colorspace, true, true)?;
            pages.push(pixmap_to_image(&pixmap)?);
            tracing::debug!(page = index + 1, total = count, dpi = self.dpi, "Rasterized PDF page");
        }

        Ok(pages)
    }
}

fn pixmap_to_image(pixmap: &mupdf::Pixmap) -> Result<DynamicImage> {
    let width = pixmap.width() as u32;
    let height = pixmap.height() as u32;
    let samples = pixmap.samples();
    let n = pixmap.n() as usize;

    let mut rgba_buffer = Vec::with_capacity(rgba_len(width, height)?);

    for y in 0..height as usize {
        for x in 0..width as usize {
            let offset = (y * width as usize + x) * n;
            let r = samples.get(offset).copied().unwrap_or(0);
            let g = samples.get(offset + 1).copied().unwrap_or(0);
            let b = samples.get(offset + 2).copied().unwrap_or(0);
            let a = if n >= 4 {
                samples.get(offset + 3).copied().unwrap_or(255)
            } else {
                255
            };
            rgba_buffer.extend_from_slice(&[r, g, b, a]);
        }
    }

    let img = RgbaImage::from_raw(width, height, rgba_buffer)
        .ok_or_else(|| LoaderError::Pdf("Failed to create image buffer".to_string()))?;

    Ok(DynamicImage::ImageRgba8(img))
}

/// Byte length of an RGBA buffer for a `width` x `height` render
fn rgba_len(width: u32, height: u32) -> Result<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|pixels| pixels.checked_mul(4))
        .ok_or_else(|| LoaderError::Pdf(format!("Rendered page too large: {}x{}", width, height)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_from_dpi() {
        let rasterizer = PdfRasterizer::new(144, 10);
        assert!((rasterizer.scale() - 2.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_rgba_len_rejects_overflow() {
        assert_eq!(rgba_len(144, 72).unwrap(), 144 * 72 * 4);
        assert!(matches!(rgba_len(u32::MAX, u32::MAX), Err(LoaderError::Pdf(_))));
    }

    #[test]
    fn test_dpi_is_clamped() {
        assert_eq!(PdfRasterizer::new(5, 10).dpi(), 36);
        assert_eq!(PdfRasterizer::new(10_000, 10).dpi(), 600);
    }
}

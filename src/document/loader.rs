//! Document loaders
//!
//! Turns uploaded bytes into an ordered sequence of page images.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tempfile::NamedTempFile;

use super::error::{LoaderError, Result};
use super::pdf::PdfRasterizer;
use super::types::{DocumentKind, PageImage};

/// Format-aware page loader
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    /// Decode `bytes` of the given kind into page images, in document order
    async fn load(&self, bytes: &[u8], kind: DocumentKind) -> Result<Vec<PageImage>>;
}

/// Loader backed by the `image` crate and MuPDF
///
/// Bytes are handed to the decoders through a temporary file that is
/// removed when loading finishes, whether it succeeded or not.
pub struct FileLoader {
    rasterizer: Arc<PdfRasterizer>,
    /// Directory for temp files (system temp dir when `None`)
    temp_dir: Option<PathBuf>,
}

impl FileLoader {
    pub fn new(rasterizer: PdfRasterizer, temp_dir: Option<PathBuf>) -> Self {
        Self {
            rasterizer: Arc::new(rasterizer),
            temp_dir,
        }
    }

    fn temp_file(temp_dir: Option<&PathBuf>, kind: DocumentKind) -> Result<NamedTempFile> {
        let suffix = format!(".{}", kind.extension());
        let mut builder = tempfile::Builder::new();
        builder.prefix("ocr_upload_").suffix(&suffix);
        let file = match temp_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        Ok(file)
    }
}

#[async_trait]
impl DocumentLoader for FileLoader {
    async fn load(&self, bytes: &[u8], kind: DocumentKind) -> Result<Vec<PageImage>> {
        if bytes.is_empty() {
            return Err(LoaderError::Empty);
        }

        let data = bytes.to_vec();
        let rasterizer = self.rasterizer.clone();
        let temp_dir = self.temp_dir.clone();

        tokio::task::spawn_blocking(move || -> Result<Vec<PageImage>> {
            let mut temp = Self::temp_file(temp_dir.as_ref(), kind)?;
            temp.write_all(&data)?;
            temp.flush()?;

            let images = if kind.is_pdf() {
                rasterizer.rasterize(temp.path())?
            } else {
                // Sniff the real format; the extension only breaks ties
                vec![image::ImageReader::open(temp.path())?
                    .with_guessed_format()?
                    .decode()?]
            };

            tracing::debug!(
                kind = ?kind,
                pages = images.len(),
                size = data.len(),
                "Loaded document"
            );

            Ok(images
                .into_iter()
                .enumerate()
                .map(|(index, image)| PageImage::new(index, image))
                .collect())
            // `temp` dropped here: file removed on both paths
        })
        .await
        .map_err(|e| LoaderError::Task(e.to_string()))?
    }
}

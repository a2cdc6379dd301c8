//! Upload and page image types

use std::io::Cursor;
use std::path::Path;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use super::error::{LoaderError, Result};

/// Extensions accepted for upload, in display order
pub const ACCEPTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "pdf"];

/// Kind of uploaded document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Jpeg,
    Png,
    Bmp,
    Tiff,
    Pdf,
}

impl DocumentKind {
    /// Detect kind from a file extension (without the dot)
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "bmp" => Some(Self::Bmp),
            "tiff" => Some(Self::Tiff),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    /// Detect kind from the declared file name
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Extension used for temp files handed to decoders
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Bmp => "bmp",
            Self::Tiff => "tiff",
            Self::Pdf => "pdf",
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Bmp => "image/bmp",
            Self::Tiff => "image/tiff",
            Self::Pdf => "application/pdf",
        }
    }

    pub fn is_pdf(&self) -> bool {
        matches!(self, Self::Pdf)
    }
}

/// Raw uploaded file
#[derive(Debug, Clone)]
pub struct Upload {
    /// Declared file name (used for the extension check)
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    pub fn kind(&self) -> Option<DocumentKind> {
        DocumentKind::from_file_name(&self.file_name)
    }
}

/// One page of a loaded document
#[derive(Debug, Clone)]
pub struct PageImage {
    /// Zero-based position in the document
    pub index: usize,
    pub image: DynamicImage,
}

impl PageImage {
    pub fn new(index: usize, image: DynamicImage) -> Self {
        Self { index, image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Encode the page as PNG (format handed to OCR engines)
    pub fn to_png(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.image
            .write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)
            .map_err(|e| LoaderError::Encode(e.to_string()))?;
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_file_name() {
        assert_eq!(DocumentKind::from_file_name("scan.JPG"), Some(DocumentKind::Jpeg));
        assert_eq!(DocumentKind::from_file_name("scan.jpeg"), Some(DocumentKind::Jpeg));
        assert_eq!(DocumentKind::from_file_name("a.b.tiff"), Some(DocumentKind::Tiff));
        assert_eq!(DocumentKind::from_file_name("doc.pdf"), Some(DocumentKind::Pdf));
        assert_eq!(DocumentKind::from_file_name("report.docx"), None);
        assert_eq!(DocumentKind::from_file_name("scan.tif"), None);
        assert_eq!(DocumentKind::from_file_name("no_extension"), None);
    }

    #[test]
    fn test_accepted_extensions_all_parse() {
        for ext in ACCEPTED_EXTENSIONS {
            assert!(DocumentKind::from_extension(ext).is_some(), "{ext}");
        }
    }

    #[test]
    fn test_page_to_png() {
        let page = PageImage::new(0, DynamicImage::new_rgb8(4, 3));
        let png = page.to_png().unwrap();
        assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));
    }
}

//! Recognition result types
//!
//! The hierarchical output of an OCR engine run: a result holds pages,
//! pages hold blocks, blocks hold lines, lines hold words. Order is the
//! reading order reported by the engine and is never changed afterwards.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Relative bounding box (0-1 coordinates, origin at the top-left corner)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub xmin: f32,
    pub ymin: f32,
    pub xmax: f32,
    pub ymax: f32,
}

impl Geometry {
    pub fn new(xmin: f32, ymin: f32, xmax: f32, ymax: f32) -> Self {
        Self {
            xmin: xmin.clamp(0.0, 1.0),
            ymin: ymin.clamp(0.0, 1.0),
            xmax: xmax.clamp(0.0, 1.0),
            ymax: ymax.clamp(0.0, 1.0),
        }
    }

    /// Build from an absolute pixel box on a page of the given size
    pub fn from_pixels(
        left: u32,
        top: u32,
        width: u32,
        height: u32,
        page_width: u32,
        page_height: u32,
    ) -> Self {
        if page_width == 0 || page_height == 0 {
            return Self::default();
        }
        let pw = page_width as f32;
        let ph = page_height as f32;
        Self::new(
            left as f32 / pw,
            top as f32 / ph,
            (left + width) as f32 / pw,
            (top + height) as f32 / ph,
        )
    }

    /// Smallest box enclosing both boxes
    pub fn union(&self, other: &Geometry) -> Geometry {
        Geometry {
            xmin: self.xmin.min(other.xmin),
            ymin: self.ymin.min(other.ymin),
            xmax: self.xmax.max(other.xmax),
            ymax: self.ymax.max(other.ymax),
        }
    }

    /// Enclosing box of a sequence of boxes, `None` when empty
    pub fn enclosing<'a, I>(boxes: I) -> Option<Geometry>
    where
        I: IntoIterator<Item = &'a Geometry>,
    {
        boxes
            .into_iter()
            .fold(None, |acc: Option<Geometry>, g| match acc {
                Some(a) => Some(a.union(g)),
                None => Some(*g),
            })
    }

    /// Convert to pixel coordinates given page dimensions
    pub fn to_pixels(&self, page_width: u32, page_height: u32) -> PixelRect {
        let x0 = (self.xmin * page_width as f32).round() as u32;
        let y0 = (self.ymin * page_height as f32).round() as u32;
        let x1 = (self.xmax * page_width as f32).round() as u32;
        let y1 = (self.ymax * page_height as f32).round() as u32;
        PixelRect {
            x: x0.min(page_width.saturating_sub(1)),
            y: y0.min(page_height.saturating_sub(1)),
            width: x1.saturating_sub(x0).max(1),
            height: y1.saturating_sub(y0).max(1),
        }
    }

    fn to_json(self) -> Value {
        json!([[self.xmin, self.ymin], [self.xmax, self.ymax]])
    }
}

/// Pixel-based rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// A recognized word
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    /// Recognized text
    pub value: String,
    /// Recognition confidence (0-1)
    pub confidence: f32,
    pub geometry: Geometry,
}

impl Word {
    pub fn new(value: impl Into<String>, confidence: f32, geometry: Geometry) -> Self {
        Self {
            value: value.into(),
            confidence: confidence.clamp(0.0, 1.0),
            geometry,
        }
    }
}

/// A line of words
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub geometry: Geometry,
    pub words: Vec<Word>,
}

impl Line {
    /// Create a line whose geometry encloses its words
    pub fn from_words(words: Vec<Word>) -> Self {
        let geometry = Geometry::enclosing(words.iter().map(|w| &w.geometry)).unwrap_or_default();
        Self { geometry, words }
    }
}

/// A detected text region (paragraph-like)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub geometry: Geometry,
    pub lines: Vec<Line>,
}

impl Block {
    /// Create a block whose geometry encloses its lines
    pub fn from_lines(lines: Vec<Line>) -> Self {
        let geometry = Geometry::enclosing(lines.iter().map(|l| &l.geometry)).unwrap_or_default();
        Self { geometry, lines }
    }
}

/// One recognized page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Page width in pixels
    pub width: u32,
    /// Page height in pixels
    pub height: u32,
    /// Detected page rotation in degrees, if the engine reports one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation: Option<f32>,
    /// Language reported or requested for this page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub blocks: Vec<Block>,
}

impl Page {
    /// A page without any recognized content
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    pub fn words(&self) -> impl Iterator<Item = &Word> {
        self.blocks
            .iter()
            .flat_map(|b| b.lines.iter())
            .flat_map(|l| l.words.iter())
    }
}

/// Structured output of one engine run over a document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecognitionResult {
    pub pages: Vec<Page>,
}

impl RecognitionResult {
    pub fn new(pages: Vec<Page>) -> Self {
        Self { pages }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn word_count(&self) -> usize {
        self.pages.iter().map(|p| p.words().count()).sum()
    }

    /// Nested JSON export mirroring the page/block/line/word hierarchy
    pub fn export(&self) -> Value {
        let pages: Vec<Value> = self
            .pages
            .iter()
            .enumerate()
            .map(|(page_idx, page)| {
                let blocks: Vec<Value> = page
                    .blocks
                    .iter()
                    .map(|block| {
                        let lines: Vec<Value> = block
                            .lines
                            .iter()
                            .map(|line| {
                                let words: Vec<Value> = line
                                    .words
                                    .iter()
                                    .map(|word| {
                                        json!({
                                            "value": word.value,
                                            "confidence": word.confidence,
                                            "geometry": word.geometry.to_json(),
                                        })
                                    })
                                    .collect();
                                json!({ "geometry": line.geometry.to_json(), "words": words })
                            })
                            .collect();
                        json!({ "geometry": block.geometry.to_json(), "lines": lines })
                    })
                    .collect();

                json!({
                    "page_idx": page_idx,
                    "dimensions": [page.height, page.width],
                    "orientation": page.orientation,
                    "language": page.language,
                    "blocks": blocks,
                })
            })
            .collect();

        json!({ "pages": pages })
    }
}

//! Extraction outcome types

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::document::DocumentKind;
use crate::ocr::{flatten, EngineConfig, RecognitionResult};

/// A page the engine failed on
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageFailure {
    /// 1-based page number
    pub page: usize,
    pub message: String,
}

/// Everything produced by one extraction
#[derive(Debug, Clone)]
pub struct ExtractionOutcome {
    pub id: Uuid,
    pub file_name: String,
    pub kind: DocumentKind,
    pub config: EngineConfig,
    pub result: Arc<RecognitionResult>,
    /// Flattened text, never empty
    pub text: String,
    pub page_failures: Vec<PageFailure>,
    /// Non-fatal problems (visualization and the like)
    pub warnings: Vec<String>,
    /// PNG-encoded annotated pages, in page order
    pub annotated_pages: Vec<Vec<u8>>,
    pub elapsed_ms: u64,
    pub created_at: DateTime<Utc>,
}

impl ExtractionOutcome {
    pub fn new(
        file_name: String,
        kind: DocumentKind,
        config: EngineConfig,
        result: RecognitionResult,
    ) -> Self {
        let text = flatten(&result);
        Self {
            id: Uuid::new_v4(),
            file_name,
            kind,
            config,
            result: Arc::new(result),
            text,
            page_failures: Vec::new(),
            warnings: Vec::new(),
            annotated_pages: Vec::new(),
            elapsed_ms: 0,
            created_at: Utc::now(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.result.page_count()
    }

    /// Annotated PNG for a 1-based page number
    pub fn annotated_page(&self, page: usize) -> Option<&[u8]> {
        page.checked_sub(1)
            .and_then(|i| self.annotated_pages.get(i))
            .map(Vec::as_slice)
    }

    /// JSON export: the nested result plus extraction metadata
    pub fn export(&self) -> Value {
        let mut export = self.result.export();
        if let Value::Object(map) = &mut export {
            map.insert(
                "metadata".to_string(),
                json!({
                    "id": self.id,
                    "fileName": self.file_name,
                    "kind": self.kind,
                    "config": self.config,
                    "language": self.config.language.code(),
                    "createdAt": self.created_at,
                }),
            );
        }
        export
    }

    pub fn summary(&self) -> ExtractionSummary {
        ExtractionSummary {
            id: self.id,
            file_name: self.file_name.clone(),
            kind: self.kind,
            config: self.config,
            page_count: self.page_count(),
            word_count: self.result.word_count(),
            text: self.text.clone(),
            page_failures: self.page_failures.clone(),
            warnings: self.warnings.clone(),
            annotated_pages: self.annotated_pages.len(),
            elapsed_ms: self.elapsed_ms,
            created_at: self.created_at,
        }
    }
}

/// Serializable view of an outcome, without images or the full tree
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionSummary {
    pub id: Uuid,
    pub file_name: String,
    pub kind: DocumentKind,
    pub config: EngineConfig,
    pub page_count: usize,
    pub word_count: usize,
    pub text: String,
    pub page_failures: Vec<PageFailure>,
    pub warnings: Vec<String>,
    /// Number of annotated pages available
    pub annotated_pages: usize,
    pub elapsed_ms: u64,
    pub created_at: DateTime<Utc>,
}

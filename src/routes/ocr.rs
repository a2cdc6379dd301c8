//! One-shot OCR endpoint
//!
//! POST /api/v1/ocr extracts a single upload without a session. The engine
//! configuration comes from the form's text fields (`preset`, `detector`,
//! `recognizer`, `detectOrientation`, `straightBoxes`, `language`).

use axum::{
    extract::{Multipart, State},
    Json,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::Serialize;
use serde_json::Value;

use super::extract::read_form;
use crate::error::Result;
use crate::extraction::ExtractionSummary;
use crate::ocr::EngineConfig;
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrResponse {
    #[serde(flatten)]
    pub summary: ExtractionSummary,
    /// Nested page/block/line/word export
    pub result: Value,
    /// Annotated pages as PNG data URLs
    pub annotated_images: Vec<String>,
}

/// POST /api/v1/ocr
pub async fn ocr(State(state): State<AppState>, multipart: Multipart) -> Result<Json<OcrResponse>> {
    let form = read_form(multipart).await?;
    let config = EngineConfig::try_from(&form.config)?;

    tracing::debug!(file = %form.upload.file_name, config = %config, "One-shot OCR");

    let outcome = state.extraction().extract(form.upload, &config).await?;

    Ok(Json(OcrResponse {
        summary: outcome.summary(),
        result: outcome.export(),
        annotated_images: outcome
            .annotated_pages
            .iter()
            .map(|png| format!("data:image/png;base64,{}", BASE64.encode(png)))
            .collect(),
    }))
}

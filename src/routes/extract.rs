//! Extraction endpoints
//!
//! - POST /api/v1/sessions/:id/extract - Upload a document into a session
//!
//! Upload fields: `file` (or `document`) holds the document. Any other text
//! field is read as engine configuration (see `RawEngineConfig`).

use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    Json,
};

use crate::document::Upload;
use crate::error::{AppError, Result};
use crate::extraction::ExtractionSummary;
use crate::ocr::RawEngineConfig;
use crate::session::{Action, TransitionError};
use crate::state::AppState;

/// Parsed multipart upload
pub(crate) struct UploadForm {
    pub upload: Upload,
    pub config: RawEngineConfig,
}

/// Read the document and configuration fields of a multipart body
pub(crate) async fn read_form(mut multipart: Multipart) -> Result<UploadForm> {
    let mut upload = None;
    let mut config = RawEngineConfig::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" | "document" => {
                let file_name = field.file_name().unwrap_or("").to_string();
                let bytes = field.bytes().await?;
                tracing::debug!(file = %file_name, size = bytes.len(), "Received upload");
                upload = Some(Upload::new(file_name, bytes.to_vec()));
            }
            _ => {
                let value = field.text().await?;
                if !config.set_field(&name, value)? {
                    tracing::debug!(field = %name, "Ignoring unknown form field");
                }
            }
        }
    }

    let upload = upload
        .ok_or_else(|| AppError::BadRequest("Missing 'file' field in upload".to_string()))?;

    Ok(UploadForm { upload, config })
}

/// POST /api/v1/sessions/:id/extract
///
/// Runs the session's configuration over the uploaded document. Uploading
/// moves the session to the extraction screen. A missing OCR dependency
/// halts the session until it is reset.
pub async fn extract_for_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<ExtractionSummary>> {
    let session = state.sessions().get(&id).await?;
    if let Some(reason) = session.state.halted {
        return Err(TransitionError::Halted(reason).into());
    }

    let form = read_form(multipart).await?;
    let session = state.sessions().apply(&id, Action::OpenExtraction).await?;
    let config = session.state.config;

    match state.extraction().extract(form.upload, &config).await {
        Ok(outcome) => {
            let summary = outcome.summary();
            state
                .sessions()
                .apply(&id, Action::Completed(Arc::new(outcome)))
                .await?;
            Ok(Json(summary))
        }
        Err(AppError::MissingDependency(reason)) => {
            tracing::error!(session_id = %id, reason = %reason, "Halting session");
            state
                .sessions()
                .apply(&id, Action::Halt(reason.clone()))
                .await?;
            Err(AppError::MissingDependency(reason))
        }
        Err(e) => Err(e),
    }
}

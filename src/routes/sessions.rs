//! Session Routes
//!
//! Endpoints:
//! - POST /api/v1/sessions - Create a session
//! - GET /api/v1/sessions/:id - Get session state
//! - DELETE /api/v1/sessions/:id - Remove a session
//! - POST /api/v1/sessions/:id/actions - Navigate (open_config, open_extraction, go_home, reset)
//! - PUT /api/v1/sessions/:id/config - Apply engine configuration
//! - POST /api/v1/sessions/:id/extract - Upload and extract
//! - GET /api/v1/sessions/:id/text - Extracted text
//! - GET /api/v1/sessions/:id/text/download - Extracted text as attachment
//! - GET /api/v1/sessions/:id/export - Nested JSON export
//! - GET /api/v1/sessions/:id/pages/:page/annotated - Annotated page PNG

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::extract::extract_for_session;
use crate::error::{AppError, Result};
use crate::extraction::{ExtractionOutcome, ExtractionSummary};
use crate::ocr::{EngineConfig, RawEngineConfig};
use crate::session::{Action, Screen, Session};
use crate::state::AppState;

/// File name offered for text downloads
pub const DOWNLOAD_FILE_NAME: &str = "extracted_text.txt";

/// Create the session router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_session))
        .route("/:id", get(get_session).delete(delete_session))
        .route("/:id/actions", post(apply_action))
        .route("/:id/config", put(update_config))
        .route("/:id/extract", post(extract_for_session))
        .route("/:id/text", get(get_text))
        .route("/:id/text/download", get(download_text))
        .route("/:id/export", get(export_result))
        .route("/:id/pages/:page/annotated", get(annotated_page))
}

/// Session as returned to clients
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub id: Uuid,
    pub screen: Screen,
    pub config: EngineConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub halted: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extraction: Option<ExtractionSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Session> for SessionView {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id,
            screen: session.state.screen,
            config: session.state.config,
            halted: session.state.halted.clone(),
            extraction: session.state.outcome.as_ref().map(|o| o.summary()),
            created_at: session.created_at,
            updated_at: session.updated_at,
        }
    }
}

/// Navigation actions clients may send
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationAction {
    OpenConfig,
    OpenExtraction,
    GoHome,
    Reset,
}

impl From<NavigationAction> for Action {
    fn from(action: NavigationAction) -> Self {
        match action {
            NavigationAction::OpenConfig => Action::OpenConfig,
            NavigationAction::OpenExtraction => Action::OpenExtraction,
            NavigationAction::GoHome => Action::GoHome,
            NavigationAction::Reset => Action::Reset,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ActionRequest {
    pub action: NavigationAction,
}

/// POST /api/v1/sessions
async fn create_session(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.sessions().create().await;
    (StatusCode::CREATED, Json(SessionView::from(&session)))
}

/// GET /api/v1/sessions/:id
async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>> {
    let session = state.sessions().get(&id).await?;
    Ok(Json(SessionView::from(&session)))
}

/// DELETE /api/v1/sessions/:id
async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.sessions().remove(&id).await?;
    tracing::info!(session_id = %id, "Session removed");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/sessions/:id/actions
async fn apply_action(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ActionRequest>,
) -> Result<Json<SessionView>> {
    let session = state.sessions().apply(&id, request.action.into()).await?;
    Ok(Json(SessionView::from(&session)))
}

/// PUT /api/v1/sessions/:id/config
///
/// Values are applied on top of the session's current configuration.
async fn update_config(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(raw): Json<RawEngineConfig>,
) -> Result<Json<SessionView>> {
    let session = state.sessions().update_config(&id, &raw).await?;

    tracing::info!(session_id = %id, config = %session.state.config, "Configuration applied");
    Ok(Json(SessionView::from(&session)))
}

async fn outcome(state: &AppState, id: &str) -> Result<Arc<ExtractionOutcome>> {
    state
        .sessions()
        .get(id)
        .await?
        .state
        .outcome
        .ok_or_else(|| AppError::NotFound("No extraction result for this session".to_string()))
}

/// GET /api/v1/sessions/:id/text
async fn get_text(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let outcome = outcome(&state, &id).await?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        outcome.text.clone(),
    ))
}

/// GET /api/v1/sessions/:id/text/download
async fn download_text(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let outcome = outcome(&state, &id).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", DOWNLOAD_FILE_NAME),
            ),
        ],
        outcome.text.clone(),
    ))
}

/// GET /api/v1/sessions/:id/export
async fn export_result(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let outcome = outcome(&state, &id).await?;
    Ok(Json(outcome.export()))
}

/// GET /api/v1/sessions/:id/pages/:page/annotated
async fn annotated_page(
    State(state): State<AppState>,
    Path((id, page)): Path<(String, usize)>,
) -> Result<impl IntoResponse> {
    let outcome = outcome(&state, &id).await?;
    let png = outcome.annotated_page(page).ok_or_else(|| {
        AppError::NotFound(format!(
            "No annotated image for page {} ({} available)",
            page,
            outcome.annotated_pages.len()
        ))
    })?;

    Ok(([(header::CONTENT_TYPE, "image/png")], png.to_vec()))
}

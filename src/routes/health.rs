//! Health check endpoints

use axum::{extract::State, Json};
use serde::Serialize;

use crate::ocr::{CacheStats, EngineBackend};
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub service: &'static str,
    pub backend: EngineBackend,
    /// Loaded engines and cache hit counts
    pub engines: CacheStats,
    pub sessions: usize,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        service: "ocr-desk-server",
        backend: state.extraction().engines().factory().backend(),
        engines: state.extraction().engines().stats().await,
        sessions: state.sessions().len().await,
    })
}

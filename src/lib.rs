//! OCR Desk Server
//!
//! Upload an image or PDF, run it through an external OCR engine and get
//! the text back as plain text, a `.txt` download, a nested JSON export or
//! annotated page images.
//!
//! # Modules
//!
//! - `document`: Upload validation and page loading (image decoding, MuPDF)
//! - `ocr`: Engine backends, engine cache, recognition model, text flattening
//! - `extraction`: The upload → text pipeline
//! - `session`: Per-user screen state machine and session store
//! - `routes`: HTTP API

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod config;
pub mod document;
pub mod error;
pub mod extraction;
pub mod ocr;
pub mod routes;
pub mod session;
pub mod state;

pub use config::Config;
pub use error::{AppError, Result};
pub use state::AppState;

/// Build the HTTP application
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let body_limit = state.config().server.max_upload_bytes();

    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/api/v1/health", get(routes::health::health_check))
        .route("/api/v1/options", get(routes::options::options))
        .route("/api/v1/ocr", post(routes::ocr::ocr))
        .nest("/api/v1/sessions", routes::sessions::router())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

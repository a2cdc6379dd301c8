//! Shared fixtures for API tests: counting stub loader and scripted engine.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{HeaderMap, Request, StatusCode},
    Router,
};
use image::DynamicImage;
use serde_json::Value;
use tokio::sync::Notify;
use tower::ServiceExt;

use ocr_desk_server::document::{self, DocumentKind, DocumentLoader, PageImage};
use ocr_desk_server::ocr::{
    Block, EngineBackend, EngineConfig, EngineFactory, Geometry, Line, OcrEngine, OcrError, Page,
    RecognitionResult, Word,
};
use ocr_desk_server::{app, AppState, Config};

pub const BOUNDARY: &str = "X-OCR-DESK-BOUNDARY";

/// Loader producing blank pages and counting its calls
pub struct StubLoader {
    pub pages: usize,
    pub calls: AtomicUsize,
}

impl StubLoader {
    pub fn new(pages: usize) -> Arc<Self> {
        Arc::new(Self {
            pages,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentLoader for StubLoader {
    async fn load(&self, _bytes: &[u8], _kind: DocumentKind) -> document::Result<Vec<PageImage>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok((0..self.pages)
            .map(|i| PageImage::new(i, DynamicImage::new_rgb8(32, 32)))
            .collect())
    }
}

/// Holds engine runs until released
#[derive(Default)]
pub struct Gate {
    pub started: Notify,
    pub release: Notify,
}

/// Engine answering from a per-page script; `None` pages fail
pub struct StubEngine {
    script: Vec<Option<Page>>,
    runs: Arc<AtomicUsize>,
    gate: Option<Arc<Gate>>,
}

#[async_trait]
impl OcrEngine for StubEngine {
    fn name(&self) -> String {
        "stub".to_string()
    }

    async fn run(&self, pages: &[PageImage]) -> Result<RecognitionResult, OcrError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.started.notify_one();
            gate.release.notified().await;
        }
        let mut out = Vec::new();
        for page in pages {
            match self.script.get(page.index).cloned().flatten() {
                Some(mut recognized) => {
                    recognized.width = page.width();
                    recognized.height = page.height();
                    out.push(recognized);
                }
                None => {
                    return Err(OcrError::ProcessingError(format!(
                        "page {} could not be read",
                        page.index + 1
                    )))
                }
            }
        }
        Ok(RecognitionResult::new(out))
    }
}

/// Factory handing out `StubEngine`s
pub struct StubFactory {
    script: Vec<Option<Page>>,
    pub missing: AtomicBool,
    pub builds: AtomicUsize,
    pub runs: Arc<AtomicUsize>,
    pub gate: Option<Arc<Gate>>,
}

impl StubFactory {
    pub fn new(script: Vec<Option<Page>>) -> Arc<Self> {
        Arc::new(Self::with_gate(script, None))
    }

    /// Factory whose engines wait on `Gate::release` before answering
    pub fn gated(script: Vec<Option<Page>>) -> Arc<Self> {
        Arc::new(Self::with_gate(script, Some(Arc::new(Gate::default()))))
    }

    fn with_gate(script: Vec<Option<Page>>, gate: Option<Arc<Gate>>) -> Self {
        Self {
            script,
            missing: AtomicBool::new(false),
            builds: AtomicUsize::new(0),
            runs: Arc::new(AtomicUsize::new(0)),
            gate,
        }
    }

    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }

    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EngineFactory for StubFactory {
    fn backend(&self) -> EngineBackend {
        EngineBackend::Tesseract
    }

    async fn probe(&self) -> Result<(), OcrError> {
        if self.missing.load(Ordering::SeqCst) {
            return Err(OcrError::MissingDependency(
                "tesseract is not installed".to_string(),
            ));
        }
        Ok(())
    }

    async fn build(&self, _config: &EngineConfig) -> Result<Arc<dyn OcrEngine>, OcrError> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(StubEngine {
            script: self.script.clone(),
            runs: self.runs.clone(),
            gate: self.gate.clone(),
        }))
    }
}

/// A page with one block holding the given lines
pub fn page(lines: &[&[&str]]) -> Page {
    let lines = lines
        .iter()
        .map(|words| {
            Line::from_words(
                words
                    .iter()
                    .enumerate()
                    .map(|(i, w)| {
                        let x = 0.1 + 0.2 * i as f32;
                        Word::new(*w, 0.95, Geometry::new(x, 0.1, x + 0.15, 0.2))
                    })
                    .collect(),
            )
        })
        .collect();

    Page {
        blocks: vec![Block::from_lines(lines)],
        ..Page::empty(32, 32)
    }
}

pub fn test_state(loader: Arc<StubLoader>, factory: Arc<StubFactory>) -> AppState {
    AppState::new(Config::default(), loader, factory)
}

pub fn test_app(state: &AppState) -> Router {
    app(state.clone())
}

/// One multipart form part
pub struct FormPart {
    pub name: &'static str,
    pub file_name: Option<&'static str>,
    pub data: Vec<u8>,
}

pub fn file_part(file_name: &'static str, data: &[u8]) -> FormPart {
    FormPart {
        name: "file",
        file_name: Some(file_name),
        data: data.to_vec(),
    }
}

pub fn text_part(name: &'static str, value: &str) -> FormPart {
    FormPart {
        name,
        file_name: None,
        data: value.as_bytes().to_vec(),
    }
}

pub fn multipart_request(uri: &str, parts: &[FormPart]) -> Request<Body> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        let disposition = match part.file_name {
            Some(file_name) => format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
Content-Type: application/octet-stream\r\n\r\n",
                part.name, file_name
            ),
            None => format!(
                "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                part.name
            ),
        };
        body.extend_from_slice(disposition.as_bytes());
        body.extend_from_slice(&part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header("content-length", body.len())
        .body(Body::from(body))
        .expect("Failed to build request")
}

pub fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("Failed to build request")
}

pub fn json_request(method: &str, uri: &str, value: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(value.to_string()))
        .expect("Failed to build request")
}

/// Send a request and collect status, headers and body
pub async fn send(router: Router, request: Request<Body>) -> (StatusCode, HeaderMap, Vec<u8>) {
    let response = router.oneshot(request).await.expect("Request failed");
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), 50_000_000)
        .await
        .expect("Failed to read body");
    (status, headers, bytes.to_vec())
}

pub fn json(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).expect("Response JSON parse failed")
}

/// Create a session and return its id
pub async fn create_session(state: &AppState) -> String {
    let (status, _, body) = send(test_app(state), empty_request("POST", "/api/v1/sessions")).await;
    assert_eq!(status, StatusCode::CREATED);
    json(&body)["id"]
        .as_str()
        .expect("session id")
        .to_string()
}

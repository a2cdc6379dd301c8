//! Configuration management for OCR Desk Server

use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::ocr::EngineBackend;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub engine: EngineSettings,
    pub loader: LoaderConfig,
    pub sessions: SessionConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upload body limit in megabytes
    pub max_upload_mb: usize,
}

impl ServerConfig {
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineSettings {
    pub backend: EngineBackend,
    /// docTR service URL
    pub doctr_url: String,
    /// Path or name of the tesseract binary
    pub tesseract_path: String,
    pub request_timeout_secs: u64,
}

impl EngineSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoaderConfig {
    /// PDF rasterization resolution
    pub pdf_dpi: u32,
    pub max_pages: usize,
    pub temp_dir: Option<PathBuf>,
    /// Render annotated pages after each extraction
    pub visualize: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub ttl_minutes: i64,
    pub purge_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
                max_upload_mb: 50,
            },
            engine: EngineSettings {
                backend: EngineBackend::Doctr,
                doctr_url: "http://localhost:8080".to_string(),
                tesseract_path: "tesseract".to_string(),
                request_timeout_secs: 300,
            },
            loader: LoaderConfig {
                pdf_dpi: 300,
                max_pages: 50,
                temp_dir: None,
                visualize: true,
            },
            sessions: SessionConfig {
                ttl_minutes: 60,
                purge_interval_secs: 300,
            },
        }
    }
}

impl Config {
    /// Read configuration from the environment
    ///
    /// Unset variables take their default. A malformed value is logged and
    /// replaced by that variable's default; other settings are kept.
    pub fn from_env() -> Self {
        let defaults = Config::default();

        Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or(defaults.server.host),
                port: parse_var("SERVER_PORT", defaults.server.port),
                max_upload_mb: parse_var("MAX_UPLOAD_MB", defaults.server.max_upload_mb),
            },
            engine: EngineSettings {
                backend: parse_var("OCR_BACKEND", defaults.engine.backend),
                doctr_url: env::var("DOCTR_URL").unwrap_or(defaults.engine.doctr_url),
                tesseract_path: env::var("TESSERACT_PATH")
                    .unwrap_or(defaults.engine.tesseract_path),
                request_timeout_secs: parse_var(
                    "OCR_TIMEOUT_SECS",
                    defaults.engine.request_timeout_secs,
                ),
            },
            loader: LoaderConfig {
                pdf_dpi: parse_var("PDF_DPI", defaults.loader.pdf_dpi),
                max_pages: parse_var("MAX_PAGES", defaults.loader.max_pages),
                temp_dir: env::var("OCR_TEMP_DIR").ok().map(PathBuf::from),
                visualize: parse_var("OCR_VISUALIZE", defaults.loader.visualize),
            },
            sessions: SessionConfig {
                ttl_minutes: parse_var("SESSION_TTL_MINUTES", defaults.sessions.ttl_minutes),
                purge_interval_secs: parse_var(
                    "SESSION_PURGE_INTERVAL_SECS",
                    defaults.sessions.purge_interval_secs,
                ),
            },
        }
    }
}

fn parse_var<T: FromStr>(var: &'static str, default: T) -> T {
    match env::var(var) {
        Ok(value) if !value.trim().is_empty() => value.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(var, value = %value, "Invalid configuration value, using default");
            default
        }),
        _ => default,
    }
}

//! Configuration surface
//!
//! Lists every value the configuration screen can offer.

use axum::Json;
use serde::Serialize;

use crate::document::ACCEPTED_EXTENSIONS;
use crate::ocr::{DetectorArch, EngineConfig, Language, ModelPreset, RecognizerArch};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionsResponse {
    pub detectors: Vec<&'static str>,
    pub recognizers: Vec<&'static str>,
    pub presets: Vec<PresetOption>,
    pub languages: Vec<LanguageOption>,
    pub accepted_extensions: Vec<&'static str>,
    pub defaults: EngineConfig,
}

#[derive(Serialize)]
pub struct PresetOption {
    pub name: &'static str,
    pub detector: &'static str,
    pub recognizer: &'static str,
}

#[derive(Serialize)]
pub struct LanguageOption {
    pub code: &'static str,
    pub tesseract: &'static str,
}

/// GET /api/v1/options
pub async fn options() -> Json<OptionsResponse> {
    Json(OptionsResponse {
        detectors: DetectorArch::ALL.iter().map(|a| a.as_str()).collect(),
        recognizers: RecognizerArch::ALL.iter().map(|a| a.as_str()).collect(),
        presets: ModelPreset::ALL
            .iter()
            .map(|preset| {
                let (detector, recognizer) = preset.architectures();
                PresetOption {
                    name: preset.as_str(),
                    detector: detector.as_str(),
                    recognizer: recognizer.as_str(),
                }
            })
            .collect(),
        languages: Language::ALL
            .iter()
            .map(|lang| LanguageOption {
                code: lang.code(),
                tesseract: lang.tesseract_code(),
            })
            .collect(),
        accepted_extensions: ACCEPTED_EXTENSIONS.to_vec(),
        defaults: EngineConfig::default(),
    })
}

//! Engine configuration
//!
//! Closed sets of model architectures and languages, and the validated
//! configuration record used as the engine cache key.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Text detection model variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DetectorArch {
    #[serde(rename = "db_resnet50")]
    DbResnet50,
    #[serde(rename = "db_mobilenet_v3_large")]
    DbMobilenetV3Large,
    #[serde(rename = "linknet_resnet18")]
    LinknetResnet18,
    #[serde(rename = "fast_base")]
    FastBase,
}

impl DetectorArch {
    pub const ALL: [DetectorArch; 4] = [
        Self::DbResnet50,
        Self::DbMobilenetV3Large,
        Self::LinknetResnet18,
        Self::FastBase,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DbResnet50 => "db_resnet50",
            Self::DbMobilenetV3Large => "db_mobilenet_v3_large",
            Self::LinknetResnet18 => "linknet_resnet18",
            Self::FastBase => "fast_base",
        }
    }
}

impl FromStr for DetectorArch {
    type Err = EngineConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|arch| arch.as_str() == s.trim())
            .ok_or_else(|| EngineConfigError::UnknownDetector(s.to_string()))
    }
}

/// Text recognition model variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecognizerArch {
    #[serde(rename = "crnn_vgg16_bn")]
    CrnnVgg16Bn,
    #[serde(rename = "crnn_mobilenet_v3_small")]
    CrnnMobilenetV3Small,
    #[serde(rename = "master")]
    Master,
    #[serde(rename = "sar_resnet31")]
    SarResnet31,
    #[serde(rename = "parseq")]
    Parseq,
}

impl RecognizerArch {
    pub const ALL: [RecognizerArch; 5] = [
        Self::CrnnVgg16Bn,
        Self::CrnnMobilenetV3Small,
        Self::Master,
        Self::SarResnet31,
        Self::Parseq,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CrnnVgg16Bn => "crnn_vgg16_bn",
            Self::CrnnMobilenetV3Small => "crnn_mobilenet_v3_small",
            Self::Master => "master",
            Self::SarResnet31 => "sar_resnet31",
            Self::Parseq => "parseq",
        }
    }
}

impl FromStr for RecognizerArch {
    type Err = EngineConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|arch| arch.as_str() == s.trim())
            .ok_or_else(|| EngineConfigError::UnknownRecognizer(s.to_string()))
    }
}

/// Named detector/recognizer pairs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelPreset {
    /// Slower, more precise models
    Accurate,
    /// Lighter mobile models
    Fast,
}

impl ModelPreset {
    pub const ALL: [ModelPreset; 2] = [Self::Accurate, Self::Fast];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accurate => "accurate",
            Self::Fast => "fast",
        }
    }

    pub fn architectures(&self) -> (DetectorArch, RecognizerArch) {
        match self {
            Self::Accurate => (DetectorArch::DbResnet50, RecognizerArch::CrnnVgg16Bn),
            Self::Fast => (
                DetectorArch::DbMobilenetV3Large,
                RecognizerArch::CrnnMobilenetV3Small,
            ),
        }
    }
}

impl FromStr for ModelPreset {
    type Err = EngineConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "accurate" => Ok(Self::Accurate),
            "fast" => Ok(Self::Fast),
            _ => Err(EngineConfigError::UnknownPreset(s.to_string())),
        }
    }
}

/// Document language hint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Pt,
    Es,
    Fr,
    De,
}

impl Language {
    pub const ALL: [Language; 5] = [Self::En, Self::Pt, Self::Es, Self::Fr, Self::De];

    /// ISO 639-1 code
    pub fn code(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Pt => "pt",
            Self::Es => "es",
            Self::Fr => "fr",
            Self::De => "de",
        }
    }

    /// Tesseract traineddata name
    pub fn tesseract_code(&self) -> &'static str {
        match self {
            Self::En => "eng",
            Self::Pt => "por",
            Self::Es => "spa",
            Self::Fr => "fra",
            Self::De => "deu",
        }
    }
}

impl Default for Language {
    fn default() -> Self {
        Self::En
    }
}

impl FromStr for Language {
    type Err = EngineConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|lang| lang.code() == s || lang.tesseract_code() == s)
            .ok_or(EngineConfigError::UnknownLanguage(s))
    }
}

/// Engine configuration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineConfigError {
    #[error("Unknown detector architecture: {0}")]
    UnknownDetector(String),

    #[error("Unknown recognizer architecture: {0}")]
    UnknownRecognizer(String),

    #[error("Unknown model preset: {0}")]
    UnknownPreset(String),

    #[error("Unknown language: {0}")]
    UnknownLanguage(String),

    #[error("Invalid boolean for {field}: {value}")]
    InvalidFlag { field: &'static str, value: String },
}

/// Validated engine configuration
///
/// Every field comes from a closed set, so two equal configurations always
/// describe the same engine. Used as the engine cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    pub detector: DetectorArch,
    pub recognizer: RecognizerArch,
    /// Detect page rotation instead of assuming upright pages
    pub detect_orientation: bool,
    /// Export axis-aligned boxes even for rotated text
    pub straight_boxes: bool,
    pub language: Language,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from_preset(ModelPreset::Accurate)
    }
}

impl EngineConfig {
    pub fn from_preset(preset: ModelPreset) -> Self {
        let (detector, recognizer) = preset.architectures();
        Self {
            detector,
            recognizer,
            detect_orientation: false,
            straight_boxes: false,
            language: Language::default(),
        }
    }

    /// Apply user-supplied values on top of `self`
    ///
    /// A preset replaces both architectures first; explicit architecture
    /// fields then override the preset.
    pub fn merge(&self, raw: &RawEngineConfig) -> Result<Self, EngineConfigError> {
        let mut config = *self;

        if let Some(preset) = non_empty(&raw.preset) {
            let (detector, recognizer) = preset.parse::<ModelPreset>()?.architectures();
            config.detector = detector;
            config.recognizer = recognizer;
        }
        if let Some(detector) = non_empty(&raw.detector) {
            config.detector = detector.parse()?;
        }
        if let Some(recognizer) = non_empty(&raw.recognizer) {
            config.recognizer = recognizer.parse()?;
        }
        if let Some(flag) = raw.detect_orientation {
            config.detect_orientation = flag;
        }
        if let Some(flag) = raw.straight_boxes {
            config.straight_boxes = flag;
        }
        if let Some(language) = non_empty(&raw.language) {
            config.language = language.parse()?;
        }

        Ok(config)
    }
}

impl TryFrom<&RawEngineConfig> for EngineConfig {
    type Error = EngineConfigError;

    /// Validate a raw configuration against the default engine
    fn try_from(raw: &RawEngineConfig) -> Result<Self, Self::Error> {
        Self::default().merge(raw)
    }
}

impl fmt::Display for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}+{} (orientation={}, straight_boxes={}, lang={})",
            self.detector.as_str(),
            self.recognizer.as_str(),
            self.detect_orientation,
            self.straight_boxes,
            self.language.code()
        )
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Unvalidated configuration as received from clients
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEngineConfig {
    #[serde(default)]
    pub preset: Option<String>,
    #[serde(default)]
    pub detector: Option<String>,
    #[serde(default)]
    pub recognizer: Option<String>,
    #[serde(default)]
    pub detect_orientation: Option<bool>,
    #[serde(default)]
    pub straight_boxes: Option<bool>,
    #[serde(default)]
    pub language: Option<String>,
}

impl RawEngineConfig {
    /// Set a field from a text form value (multipart uploads)
    pub fn set_field(&mut self, name: &str, value: String) -> Result<bool, EngineConfigError> {
        match name {
            "preset" => self.preset = Some(value),
            "detector" => self.detector = Some(value),
            "recognizer" => self.recognizer = Some(value),
            "language" => self.language = Some(value),
            "detectOrientation" | "detect_orientation" => {
                self.detect_orientation = Some(parse_flag("detectOrientation", &value)?)
            }
            "straightBoxes" | "straight_boxes" => {
                self.straight_boxes = Some(parse_flag("straightBoxes", &value)?)
            }
            _ => return Ok(false),
        }
        Ok(true)
    }
}

fn parse_flag(field: &'static str, value: &str) -> Result<bool, EngineConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(EngineConfigError::InvalidFlag {
            field,
            value: value.to_string(),
        }),
    }
}

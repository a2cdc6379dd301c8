//! Session state machine
//!
//! A session is on one of three screens and carries the engine
//! configuration plus the outcome of its last extraction. Transitions are
//! pure: `transition(state, action)` returns the next state and never
//! mutates shared data.
//!
//! ```text
//!            OpenConfig            OpenExtraction
//!   Home ───────────────► Config ─────────────────► Extraction
//!     ▲  ◄─── GoHome ───    │  ApplyConfig ↺            │
//!     └──────────────── GoHome ──────────────────────────┘
//!   Reset: any → default        Halt: any → halted (only Reset leaves it)
//!   Completed: any → stores the outcome, screen unchanged
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::extraction::ExtractionOutcome;
use crate::ocr::EngineConfig;

/// Screen the session is currently on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Screen {
    #[default]
    Home,
    Config,
    Extraction,
}

/// User-triggered events
#[derive(Debug, Clone)]
pub enum Action {
    OpenConfig,
    ApplyConfig(EngineConfig),
    OpenExtraction,
    Completed(Arc<ExtractionOutcome>),
    GoHome,
    Reset,
    /// A required system dependency is missing; stop processing
    Halt(String),
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Self::OpenConfig => "open_config",
            Self::ApplyConfig(_) => "apply_config",
            Self::OpenExtraction => "open_extraction",
            Self::Completed(_) => "completed",
            Self::GoHome => "go_home",
            Self::Reset => "reset",
            Self::Halt(_) => "halt",
        }
    }
}

/// Rejected transitions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Action '{action}' is not allowed on the {screen:?} screen")]
    NotAllowed { action: &'static str, screen: Screen },

    #[error("Session halted: {0}")]
    Halted(String),
}

/// Per-session state
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub screen: Screen,
    pub config: EngineConfig,
    /// Last successful extraction
    pub outcome: Option<Arc<ExtractionOutcome>>,
    /// Diagnostic of the dependency failure that stopped this session
    pub halted: Option<String>,
}

impl SessionState {
    pub fn is_halted(&self) -> bool {
        self.halted.is_some()
    }
}

/// Compute the state following `action`
pub fn transition(state: &SessionState, action: Action) -> Result<SessionState, TransitionError> {
    if let Some(reason) = &state.halted {
        if !matches!(action, Action::Reset) {
            return Err(TransitionError::Halted(reason.clone()));
        }
    }

    let mut next = state.clone();
    match action {
        Action::OpenConfig => next.screen = Screen::Config,
        Action::ApplyConfig(config) => {
            if state.screen != Screen::Config {
                return Err(not_allowed("apply_config", state.screen));
            }
            next.config = config;
        }
        Action::OpenExtraction => next.screen = Screen::Extraction,
        // Extractions outlive navigation; the result lands on any screen
        Action::Completed(outcome) => next.outcome = Some(outcome),
        Action::GoHome => next.screen = Screen::Home,
        Action::Reset => next = SessionState::default(),
        Action::Halt(reason) => next.halted = Some(reason),
    }
    Ok(next)
}

fn not_allowed(action: &'static str, screen: Screen) -> TransitionError {
    TransitionError::NotAllowed { action, screen }
}

//! Session Store
//!
//! Keeps session state in memory:
//! - sessions indexed by UUID behind a `tokio::sync::RwLock`
//! - state changes go through the pure `transition` function
//! - idle sessions expire and are purged periodically

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::state::{transition, Action, SessionState, TransitionError};
use crate::ocr::{EngineConfigError, RawEngineConfig};

/// Session store errors
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error(transparent)]
    Config(#[from] EngineConfigError),
}

/// A stored session
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub state: SessionState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            state: SessionState::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_idle_since(&self, cutoff: DateTime<Utc>) -> bool {
        self.updated_at < cutoff
    }
}

/// In-memory session store
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionStoreInner>,
}

struct SessionStoreInner {
    sessions: RwLock<HashMap<Uuid, Session>>,
    /// Idle time after which a session is purged
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl_minutes: i64) -> Self {
        Self {
            inner: Arc::new(SessionStoreInner {
                sessions: RwLock::new(HashMap::new()),
                ttl: Duration::minutes(ttl_minutes.max(1)),
            }),
        }
    }

    /// Create a new session on the home screen
    pub async fn create(&self) -> Session {
        let session = Session::new();
        self.inner
            .sessions
            .write()
            .await
            .insert(session.id, session.clone());

        tracing::info!(session_id = %session.id, "Created session");
        session
    }

    /// Get a session by string ID
    pub async fn get(&self, id: &str) -> Result<Session, SessionError> {
        let uuid = parse_id(id)?;
        let sessions = self.inner.sessions.read().await;
        sessions
            .get(&uuid)
            .cloned()
            .ok_or_else(|| SessionError::NotFound(id.to_string()))
    }

    /// Apply an action and store the resulting state
    pub async fn apply(&self, id: &str, action: Action) -> Result<Session, SessionError> {
        let uuid = parse_id(id)?;
        let mut sessions = self.inner.sessions.write().await;

        let session = sessions
            .get_mut(&uuid)
            .ok_or_else(|| SessionError::NotFound(id.to_string()))?;

        let action_name = action.name();
        let next = transition(&session.state, action).map_err(|e| {
            tracing::debug!(session_id = %uuid, action = action_name, error = %e, "Transition rejected");
            e
        })?;

        tracing::debug!(
            session_id = %uuid,
            action = action_name,
            from = ?session.state.screen,
            to = ?next.screen,
            "Session transition"
        );

        session.state = next;
        session.updated_at = Utc::now();
        Ok(session.clone())
    }

    /// Merge `raw` onto the session's current configuration and apply it
    ///
    /// Read, merge and write happen under one write lock so concurrent
    /// updates never start from the same base.
    pub async fn update_config(
        &self,
        id: &str,
        raw: &RawEngineConfig,
    ) -> Result<Session, SessionError> {
        let uuid = parse_id(id)?;
        let mut sessions = self.inner.sessions.write().await;

        let session = sessions
            .get_mut(&uuid)
            .ok_or_else(|| SessionError::NotFound(id.to_string()))?;

        let config = session.state.config.merge(raw)?;
        session.state = transition(&session.state, Action::ApplyConfig(config))?;
        session.updated_at = Utc::now();

        tracing::debug!(session_id = %uuid, config = %config, "Session configuration merged");
        Ok(session.clone())
    }

    /// Remove a session
    pub async fn remove(&self, id: &str) -> Result<(), SessionError> {
        let uuid = parse_id(id)?;
        self.inner
            .sessions
            .write()
            .await
            .remove(&uuid)
            .map(|_| ())
            .ok_or_else(|| SessionError::NotFound(id.to_string()))
    }

    pub async fn len(&self) -> usize {
        self.inner.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop sessions idle for longer than the TTL, returns how many
    pub async fn purge_expired(&self) -> usize {
        self.purge_idle_since(Utc::now() - self.inner.ttl).await
    }

    async fn purge_idle_since(&self, cutoff: DateTime<Utc>) -> usize {
        let mut sessions = self.inner.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_idle_since(cutoff));
        let purged = before - sessions.len();

        if purged > 0 {
            tracing::info!(purged, remaining = sessions.len(), "Purged idle sessions");
        }
        purged
    }
}

fn parse_id(id: &str) -> Result<Uuid, SessionError> {
    Uuid::parse_str(id).map_err(|_| SessionError::NotFound(id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::{DetectorArch, EngineConfig, Language};
    use crate::session::Screen;

    #[tokio::test]
    async fn test_create_and_get() {
        let store = SessionStore::new(60);
        let session = store.create().await;

        let fetched = store.get(&session.id.to_string()).await.unwrap();
        assert_eq!(fetched.id, session.id);
        assert_eq!(fetched.state.screen, Screen::Home);
    }

    #[tokio::test]
    async fn test_get_unknown_and_malformed() {
        let store = SessionStore::new(60);
        assert!(matches!(
            store.get(&Uuid::new_v4().to_string()).await,
            Err(SessionError::NotFound(_))
        ));
        assert!(matches!(store.get("nope").await, Err(SessionError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_apply_updates_state() {
        let store = SessionStore::new(60);
        let id = store.create().await.id.to_string();

        let session = store.apply(&id, Action::OpenConfig).await.unwrap();
        assert_eq!(session.state.screen, Screen::Config);
        assert_eq!(store.get(&id).await.unwrap().state.screen, Screen::Config);
    }

    #[tokio::test]
    async fn test_rejected_transition_leaves_state() {
        let store = SessionStore::new(60);
        let id = store.create().await.id.to_string();

        let result = store
            .apply(&id, Action::ApplyConfig(Default::default()))
            .await;

        assert!(matches!(result, Err(SessionError::Transition(_))));
        assert_eq!(store.get(&id).await.unwrap().state.screen, Screen::Home);
    }

    #[tokio::test]
    async fn test_concurrent_config_updates_all_land() {
        let store = SessionStore::new(60);
        let id = store.create().await.id.to_string();
        store.apply(&id, Action::OpenConfig).await.unwrap();

        let language = RawEngineConfig {
            language: Some("pt".into()),
            ..Default::default()
        };
        let detector = RawEngineConfig {
            detector: Some("fast_base".into()),
            ..Default::default()
        };
        let (a, b) = tokio::join!(
            store.update_config(&id, &language),
            store.update_config(&id, &detector)
        );
        a.unwrap();
        b.unwrap();

        let config = store.get(&id).await.unwrap().state.config;
        assert_eq!(config.language, Language::Pt);
        assert_eq!(config.detector, DetectorArch::FastBase);
    }

    #[tokio::test]
    async fn test_invalid_config_update_leaves_state() {
        let store = SessionStore::new(60);
        let id = store.create().await.id.to_string();
        store.apply(&id, Action::OpenConfig).await.unwrap();

        let raw = RawEngineConfig {
            recognizer: Some("tesseract_lstm".into()),
            ..Default::default()
        };
        assert!(matches!(
            store.update_config(&id, &raw).await,
            Err(SessionError::Config(_))
        ));
        assert_eq!(store.get(&id).await.unwrap().state.config, EngineConfig::default());
    }

    #[tokio::test]
    async fn test_remove() {
        let store = SessionStore::new(60);
        let id = store.create().await.id.to_string();

        store.remove(&id).await.unwrap();
        assert!(store.is_empty().await);
        assert!(store.remove(&id).await.is_err());
    }

    #[tokio::test]
    async fn test_purge_idle_sessions() {
        let store = SessionStore::new(60);
        store.create().await;
        store.create().await;

        assert_eq!(store.purge_expired().await, 0);
        assert_eq!(store.purge_idle_since(Utc::now() + Duration::seconds(1)).await, 2);
        assert!(store.is_empty().await);
    }
}

//! Engine cache
//!
//! Memoizes built engines by configuration for the lifetime of the
//! process. Entries are never evicted: the key space is the product of a
//! few closed enums. A failed build leaves the entry empty, so the next
//! request retries it.
//!
//! # Thread Safety
//!
//! Each configuration owns a `tokio::sync::OnceCell`. The map lock is only
//! held to look up the cell, so a slow build blocks callers waiting for the
//! same configuration and nobody else. Concurrent requests for one
//! configuration share a single build.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{Mutex, OnceCell};

use super::config::EngineConfig;
use super::engine::{EngineFactory, OcrEngine, OcrError};

type EngineCell = Arc<OnceCell<Arc<dyn OcrEngine>>>;

/// Cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

/// Process-wide engine cache keyed by `EngineConfig`
#[derive(Clone)]
pub struct EngineCache {
    factory: Arc<dyn EngineFactory>,
    engines: Arc<Mutex<HashMap<EngineConfig, EngineCell>>>,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
}

impl EngineCache {
    pub fn new(factory: Arc<dyn EngineFactory>) -> Self {
        Self {
            factory,
            engines: Arc::new(Mutex::new(HashMap::new())),
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
        }
    }

    /// The factory engines are built with
    pub fn factory(&self) -> &Arc<dyn EngineFactory> {
        &self.factory
    }

    /// Get the engine for `config`, building it on first use
    pub async fn get_or_build(&self, config: &EngineConfig) -> Result<Arc<dyn OcrEngine>, OcrError> {
        let cell = self.engines.lock().await.entry(*config).or_default().clone();

        let built = AtomicBool::new(false);
        let built_flag = &built;
        let engine = cell
            .get_or_try_init(move || async move {
                built_flag.store(true, Ordering::Relaxed);
                self.misses.fetch_add(1, Ordering::Relaxed);
                tracing::info!(config = %config, backend = ?self.factory.backend(), "Loading OCR engine");

                let engine = self.factory.build(config).await.map_err(|e| {
                    tracing::warn!(config = %config, error = %e, "OCR engine build failed");
                    e
                })?;
                tracing::info!(engine = %engine.name(), "OCR engine ready");
                Ok::<_, OcrError>(engine)
            })
            .await?
            .clone();

        if !built.load(Ordering::Relaxed) {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
        Ok(engine)
    }

    /// Whether an engine for `config` is already loaded
    pub async fn contains(&self, config: &EngineConfig) -> bool {
        self.engines
            .lock()
            .await
            .get(config)
            .is_some_and(|cell| cell.initialized())
    }

    pub async fn len(&self) -> usize {
        self.engines
            .lock()
            .await
            .values()
            .filter(|cell| cell.initialized())
            .count()
    }

    pub async fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len().await,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::PageImage;
    use crate::ocr::config::ModelPreset;
    use crate::ocr::engine::EngineBackend;
    use crate::ocr::types::RecognitionResult;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize};

    struct NullEngine;

    #[async_trait]
    impl OcrEngine for NullEngine {
        fn name(&self) -> String {
            "null".to_string()
        }

        async fn run(&self, _pages: &[PageImage]) -> Result<RecognitionResult, OcrError> {
            Ok(RecognitionResult::default())
        }
    }

    #[derive(Default)]
    struct CountingFactory {
        builds: AtomicUsize,
        fail: AtomicBool,
    }

    #[async_trait]
    impl EngineFactory for CountingFactory {
        fn backend(&self) -> EngineBackend {
            EngineBackend::Doctr
        }

        async fn probe(&self) -> Result<(), OcrError> {
            Ok(())
        }

        async fn build(&self, _config: &EngineConfig) -> Result<Arc<dyn OcrEngine>, OcrError> {
            self.builds.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(OcrError::ModelLoad("weights missing".into()));
            }
            Ok(Arc::new(NullEngine))
        }
    }

    #[tokio::test]
    async fn test_builds_once_per_config() {
        let factory = Arc::new(CountingFactory::default());
        let cache = EngineCache::new(factory.clone());
        let accurate = EngineConfig::from_preset(ModelPreset::Accurate);
        let fast = EngineConfig::from_preset(ModelPreset::Fast);

        cache.get_or_build(&accurate).await.unwrap();
        cache.get_or_build(&accurate).await.unwrap();
        cache.get_or_build(&fast).await.unwrap();

        assert_eq!(factory.builds.load(Ordering::SeqCst), 2);
        let stats = cache.stats().await;
        assert_eq!(stats, CacheStats { entries: 2, hits: 1, misses: 2 });
    }

    /// Factory whose `Fast` builds wait until released
    #[derive(Default)]
    struct GatedFactory {
        started: tokio::sync::Notify,
        release: tokio::sync::Notify,
    }

    #[async_trait]
    impl EngineFactory for GatedFactory {
        fn backend(&self) -> EngineBackend {
            EngineBackend::Doctr
        }

        async fn probe(&self) -> Result<(), OcrError> {
            Ok(())
        }

        async fn build(&self, config: &EngineConfig) -> Result<Arc<dyn OcrEngine>, OcrError> {
            if *config == EngineConfig::from_preset(ModelPreset::Fast) {
                self.started.notify_one();
                self.release.notified().await;
            }
            Ok(Arc::new(NullEngine))
        }
    }

    #[tokio::test]
    async fn test_slow_build_does_not_block_other_configs() {
        let factory = Arc::new(GatedFactory::default());
        let cache = EngineCache::new(factory.clone());
        let accurate = EngineConfig::from_preset(ModelPreset::Accurate);
        let fast = EngineConfig::from_preset(ModelPreset::Fast);
        cache.get_or_build(&accurate).await.unwrap();

        let pending = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.get_or_build(&fast).await.map(|_| ()) })
        };
        factory.started.notified().await;

        let timeout = std::time::Duration::from_secs(1);
        assert!(tokio::time::timeout(timeout, cache.get_or_build(&accurate))
            .await
            .is_ok());
        let stats = tokio::time::timeout(timeout, cache.stats()).await.unwrap();
        assert_eq!(stats, CacheStats { entries: 1, hits: 1, misses: 2 });

        factory.release.notify_one();
        pending.await.unwrap().unwrap();
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test]
    async fn test_failed_build_is_not_cached() {
        let factory = Arc::new(CountingFactory::default());
        factory.fail.store(true, Ordering::SeqCst);
        let cache = EngineCache::new(factory.clone());
        let config = EngineConfig::default();

        assert!(matches!(
            cache.get_or_build(&config).await,
            Err(OcrError::ModelLoad(_))
        ));
        assert!(!cache.contains(&config).await);

        factory.fail.store(false, Ordering::SeqCst);
        assert!(cache.get_or_build(&config).await.is_ok());
        assert!(cache.contains(&config).await);
        assert_eq!(factory.builds.load(Ordering::SeqCst), 2);
    }
}

//! Runtime orchestrator for scan report inspection.
//!
//! The orchestrator runs one uploaded report through the pipeline:
//! - Upload checks (a file was selected and is not empty)
//! - Cache lookup by image content (fallback results are never cached)
//! - Text recognition with timeout, retry and circuit breaker
//! - Entity recognition with timeout and circuit breaker, falling back to
//!   deterministic pattern recognition
//! - Deterministic validation through fete-core

use backon::Retryable;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use fete_core::{Assessment, Entity, ReferenceProfileStore, Validator};

use crate::cache::{CacheKey, RecognitionCache};
use crate::config::RuntimeConfig;
use crate::recognizers::{
    EntityRecognizer, PatternEntityRecognizer, RecognizerError, ScanImage, TextRecognizer,
};
use crate::resilience::{backoff, CircuitBreaker, Stage};

/// Errors from the runtime orchestrator.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("No image selected")]
    NoImageSelected,

    #[error("Uploaded image {0} is empty")]
    EmptyImage(String),

    #[error("Text recognition failed: {0}")]
    TextRecognition(#[from] RecognizerError),

    #[error("Circuit open for {0}")]
    CircuitOpen(Stage),

    #[error("Inspector not configured: {0}")]
    NotConfigured(String),
}

/// Result of inspecting one scan report.
#[derive(Debug)]
pub struct InspectionReport {
    /// Outcome plus the entities it was computed from
    pub assessment: Assessment,

    /// Whether recognition results came from the cache
    pub from_cache: bool,

    /// Whether entity recognition fell back to pattern matching
    pub used_fallback: bool,
}

/// Runs scan report images through recognition and validation.
pub struct ScanInspector {
    text_recognizer: Arc<dyn TextRecognizer>,
    entity_recognizer: Option<Arc<dyn EntityRecognizer>>,
    fallback: PatternEntityRecognizer,
    store: Arc<ReferenceProfileStore>,
    config: RuntimeConfig,
    circuit_breaker: CircuitBreaker,
    cache: RecognitionCache,
}

impl ScanInspector {
    /// Create an inspector over `store`.
    ///
    /// Without an entity recognizer, pattern recognition is the primary
    /// engine rather than a fallback.
    pub fn new(
        text_recognizer: Arc<dyn TextRecognizer>,
        entity_recognizer: Option<Arc<dyn EntityRecognizer>>,
        store: Arc<ReferenceProfileStore>,
        config: RuntimeConfig,
    ) -> Result<Self, RuntimeError> {
        let fallback = PatternEntityRecognizer::for_store(&store)
            .map_err(|e| RuntimeError::NotConfigured(e.to_string()))?;
        let circuit_breaker = CircuitBreaker::new(config.circuit_breaker.clone());
        let cache = RecognitionCache::from_config(&config.cache);

        Ok(Self {
            text_recognizer,
            entity_recognizer,
            fallback,
            store,
            config,
            circuit_breaker,
            cache,
        })
    }

    /// Inspect one uploaded scan report.
    pub async fn inspect(&self, image: &ScanImage) -> Result<InspectionReport, RuntimeError> {
        if image.file_name.trim().is_empty() {
            return Err(RuntimeError::NoImageSelected);
        }
        if image.bytes.is_empty() {
            return Err(RuntimeError::EmptyImage(image.file_name.clone()));
        }

        let key = CacheKey::for_image(image);
        let (entities, from_cache, used_fallback) = match self.cache.get(&key).await {
            Some(entities) => {
                debug!(file = %image.file_name, "Recognition cache hit");
                (entities, true, false)
            }
            None => {
                let text = self.recognize_text(image).await?;
                let (entities, used_fallback) = self.recognize_entities(&text).await;
                // Only the configured engine's answer is cached
                if !used_fallback {
                    self.cache.insert(key, entities.clone()).await;
                }
                (entities, false, used_fallback)
            }
        };

        let assessment = Assessment::from_entities(&Validator::new(&self.store), entities);
        info!(
            file = %image.file_name,
            entities = assessment.entities.len(),
            healthy = assessment.outcome.is_healthy(),
            unknown_profile = assessment.outcome.is_unknown_profile(),
            from_cache,
            used_fallback,
            "Inspection complete"
        );

        Ok(InspectionReport {
            assessment,
            from_cache,
            used_fallback,
        })
    }

    /// Text recognition with timeout per attempt and retries for
    /// transient failures. There is no fallback for this stage.
    async fn recognize_text(&self, image: &ScanImage) -> Result<String, RuntimeError> {
        let stage = Stage::TextRecognition;
        if self.circuit_breaker.is_open(stage) {
            warn!(stage = %stage, engine = self.text_recognizer.name(), "Circuit open, skipping");
            return Err(RuntimeError::CircuitOpen(stage));
        }

        let recognizer = self.text_recognizer.as_ref();
        let timeout = self.config.ocr_timeout;
        let attempt = move || async move { with_timeout(timeout, recognizer.recognize(image)).await };

        let result = attempt
            .retry(backoff(&self.config.retry))
            .when(RecognizerError::is_transient)
            .notify(|err: &RecognizerError, delay: Duration| {
                warn!(stage = %stage, error = %err, delay = ?delay, "Retrying text recognition");
            })
            .await;

        match result {
            Ok(text) => {
                self.circuit_breaker.record_success(stage);
                Ok(text)
            }
            Err(e) => {
                warn!(stage = %stage, error = %e, "Text recognition failed");
                self.circuit_breaker.record_failure(stage);
                Err(RuntimeError::TextRecognition(e))
            }
        }
    }

    /// Entity recognition. Returns the entities and whether the pattern
    /// fallback produced them.
    async fn recognize_entities(&self, text: &str) -> (Vec<Entity>, bool) {
        let stage = Stage::EntityRecognition;
        let Some(engine) = &self.entity_recognizer else {
            return (self.fallback.recognize_now(text), false);
        };

        if self.circuit_breaker.is_open(stage) {
            warn!(stage = %stage, engine = engine.name(), "Circuit open, falling back to patterns");
            return (self.fallback.recognize_now(text), true);
        }

        match with_timeout(self.config.ner_timeout, engine.recognize(text)).await {
            Ok(entities) => {
                self.circuit_breaker.record_success(stage);
                (entities, false)
            }
            Err(e) => {
                warn!(stage = %stage, engine = engine.name(), error = %e, "Falling back to patterns");
                self.circuit_breaker.record_failure(stage);
                (self.fallback.recognize_now(text), true)
            }
        }
    }

    /// The profile store assessments are made against.
    pub fn store(&self) -> &ReferenceProfileStore {
        &self.store
    }

    /// Drop all cached recognition results.
    pub fn clear_cache(&self) {
        self.cache.invalidate_all();
    }
}

async fn with_timeout<T>(
    timeout: Duration,
    fut: impl std::future::Future<Output = Result<T, RecognizerError>>,
) -> Result<T, RecognizerError> {
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(RecognizerError::Timeout(timeout)),
    }
}

/// Builder for ScanInspector.
pub struct ScanInspectorBuilder {
    text_recognizer: Option<Arc<dyn TextRecognizer>>,
    entity_recognizer: Option<Arc<dyn EntityRecognizer>>,
    store: Option<Arc<ReferenceProfileStore>>,
    config: RuntimeConfig,
}

impl ScanInspectorBuilder {
    pub fn new() -> Self {
        Self {
            text_recognizer: None,
            entity_recognizer: None,
            store: None,
            config: RuntimeConfig::default(),
        }
    }

    /// Set the OCR engine.
    pub fn text_recognizer(mut self, recognizer: Arc<dyn TextRecognizer>) -> Self {
        self.text_recognizer = Some(recognizer);
        self
    }

    /// Set the NER engine.
    pub fn entity_recognizer(mut self, recognizer: Arc<dyn EntityRecognizer>) -> Self {
        self.entity_recognizer = Some(recognizer);
        self
    }

    /// Use a custom profile store instead of the built-in one.
    pub fn store(mut self, store: Arc<ReferenceProfileStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the inspector. A text recognizer is required.
    pub fn build(self) -> Result<ScanInspector, RuntimeError> {
        let text_recognizer = self
            .text_recognizer
            .ok_or_else(|| RuntimeError::NotConfigured("No text recognizer set".to_string()))?;
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(ReferenceProfileStore::builtin().clone()));

        ScanInspector::new(text_recognizer, self.entity_recognizer, store, self.config)
    }
}

impl Default for ScanInspectorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetryConfig;
    use crate::recognizers::TranscriptRecognizer;
    use crate::resilience::CircuitBreakerConfig;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const REPORT: &str = "First Trimester Scan Report\n\
        LIQUOR: Normal\nCARDIAC ACTIVITY: present\nFETAL HEART BEAT: 148\n\
        CROWN LUMP LENGTH: 51\nBIPARIETAL DIAMETER: 25\nHEAD CIRCUMFERENCE: 66\n\
        ABDOMINAL CIRCUMFERENCE: 58";

    /// OCR mock that fails `failures` times with `error`, then returns REPORT.
    struct FlakyOcr {
        calls: AtomicUsize,
        failures: usize,
        error: RecognizerError,
    }

    impl FlakyOcr {
        fn new(failures: usize, error: RecognizerError) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                failures,
                error,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TextRecognizer for FlakyOcr {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn recognize(&self, _image: &ScanImage) -> Result<String, RecognizerError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(self.error.clone())
            } else {
                Ok(REPORT.to_string())
            }
        }
    }

    struct FixedNer(Vec<Entity>);

    #[async_trait]
    impl EntityRecognizer for FixedNer {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn recognize(&self, _text: &str) -> Result<Vec<Entity>, RecognizerError> {
            Ok(self.0.clone())
        }
    }

    struct BrokenNer;

    #[async_trait]
    impl EntityRecognizer for BrokenNer {
        fn name(&self) -> &str {
            "broken"
        }

        async fn recognize(&self, _text: &str) -> Result<Vec<Entity>, RecognizerError> {
            Err(RecognizerError::Failed("model not loaded".to_string()))
        }
    }

    struct SlowNer;

    #[async_trait]
    impl EntityRecognizer for SlowNer {
        fn name(&self) -> &str {
            "slow"
        }

        async fn recognize(&self, _text: &str) -> Result<Vec<Entity>, RecognizerError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(vec![])
        }
    }

    fn fast_retry_config() -> RuntimeConfig {
        RuntimeConfig {
            retry: RetryConfig {
                max_retries: 2,
                initial_delay: Duration::from_millis(1),
            },
            ..Default::default()
        }
    }

    fn image() -> ScanImage {
        ScanImage::new("scan.png", REPORT.as_bytes().to_vec())
    }

    #[tokio::test]
    async fn test_transcript_pipeline_is_healthy() {
        let inspector = ScanInspectorBuilder::new()
            .text_recognizer(Arc::new(TranscriptRecognizer::new()))
            .build()
            .unwrap();

        let report = inspector.inspect(&image()).await.unwrap();
        assert!(report.assessment.outcome.is_healthy());
        assert_eq!(report.assessment.summary(), "Fetus is in good condition");
        assert!(!report.used_fallback);
        assert!(!report.from_cache);
    }

    #[tokio::test]
    async fn test_ner_entities_are_used() {
        let inspector = ScanInspectorBuilder::new()
            .text_recognizer(Arc::new(TranscriptRecognizer::new()))
            .entity_recognizer(Arc::new(FixedNer(vec![
                Entity::new("First Trimester Scan Report", "TRIMESTER"),
                Entity::new("absent", "CARDIAC ACTIVITY"),
            ])))
            .build()
            .unwrap();

        let report = inspector.inspect(&image()).await.unwrap();
        let verdict = report.assessment.outcome.verdict().unwrap();
        assert!(verdict
            .messages()
            .contains(&"CARDIAC ACTIVITY: absent is not present"));
        assert_eq!(report.assessment.entities.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_ner_falls_back_to_patterns() {
        let inspector = ScanInspectorBuilder::new()
            .text_recognizer(Arc::new(TranscriptRecognizer::new()))
            .entity_recognizer(Arc::new(BrokenNer))
            .build()
            .unwrap();

        let report = inspector.inspect(&image()).await.unwrap();
        assert!(report.used_fallback);
        assert!(report.assessment.outcome.is_healthy());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_ner_times_out_and_falls_back() {
        let inspector = ScanInspectorBuilder::new()
            .text_recognizer(Arc::new(TranscriptRecognizer::new()))
            .entity_recognizer(Arc::new(SlowNer))
            .build()
            .unwrap();

        let report = inspector.inspect(&image()).await.unwrap();
        assert!(report.used_fallback);
        assert!(report.assessment.outcome.is_healthy());
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_ocr_failures_are_retried() {
        let ocr = Arc::new(FlakyOcr::new(
            2,
            RecognizerError::Unavailable("warming up".to_string()),
        ));
        let inspector = ScanInspectorBuilder::new()
            .text_recognizer(ocr.clone())
            .config(fast_retry_config())
            .build()
            .unwrap();

        let report = inspector.inspect(&image()).await.unwrap();
        assert!(report.assessment.outcome.is_healthy());
        assert_eq!(ocr.calls(), 3);
    }

    #[tokio::test]
    async fn test_permanent_ocr_failure_not_retried() {
        let ocr = Arc::new(FlakyOcr::new(
            10,
            RecognizerError::UnsupportedFormat("scan.tiff".to_string()),
        ));
        let inspector = ScanInspectorBuilder::new()
            .text_recognizer(ocr.clone())
            .config(fast_retry_config())
            .build()
            .unwrap();

        let result = inspector.inspect(&image()).await;
        assert!(matches!(result, Err(RuntimeError::TextRecognition(_))));
        assert_eq!(ocr.calls(), 1);
    }

    #[tokio::test]
    async fn test_open_ocr_circuit_short_circuits() {
        let ocr = Arc::new(FlakyOcr::new(
            10,
            RecognizerError::Failed("engine crashed".to_string()),
        ));
        let config = RuntimeConfig {
            circuit_breaker: CircuitBreakerConfig {
                failure_threshold: 1,
                ..Default::default()
            },
            ..fast_retry_config()
        };
        let inspector = ScanInspectorBuilder::new()
            .text_recognizer(ocr.clone())
            .config(config)
            .build()
            .unwrap();

        assert!(inspector.inspect(&image()).await.is_err());
        let second = inspector.inspect(&image()).await;
        assert!(matches!(
            second,
            Err(RuntimeError::CircuitOpen(Stage::TextRecognition))
        ));
        assert_eq!(ocr.calls(), 1);
    }

    #[tokio::test]
    async fn test_cache_skips_recognition() {
        let ocr = Arc::new(FlakyOcr::new(0, RecognizerError::Failed(String::new())));
        let inspector = ScanInspectorBuilder::new()
            .text_recognizer(ocr.clone())
            .build()
            .unwrap();

        let first = inspector.inspect(&image()).await.unwrap();
        let second = inspector
            .inspect(&ScanImage::new("same-scan-renamed.png", REPORT.as_bytes().to_vec()))
            .await
            .unwrap();

        assert!(!first.from_cache);
        assert!(second.from_cache);
        assert_eq!(ocr.calls(), 1);
        assert_eq!(first.assessment.outcome, second.assessment.outcome);
    }

    /// NER mock that is unavailable on its first call only.
    struct RecoveringNer {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl EntityRecognizer for RecoveringNer {
        fn name(&self) -> &str {
            "recovering"
        }

        async fn recognize(&self, _text: &str) -> Result<Vec<Entity>, RecognizerError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(RecognizerError::Unavailable("loading model".to_string()));
            }
            Ok(vec![
                Entity::new("First Trimester Scan Report", "TRIMESTER"),
                Entity::new("absent", "CARDIAC ACTIVITY"),
            ])
        }
    }

    #[tokio::test]
    async fn test_fallback_entities_not_cached() {
        let ner = Arc::new(RecoveringNer {
            calls: AtomicUsize::new(0),
        });
        let inspector = ScanInspectorBuilder::new()
            .text_recognizer(Arc::new(TranscriptRecognizer::new()))
            .entity_recognizer(ner.clone())
            .build()
            .unwrap();

        let first = inspector.inspect(&image()).await.unwrap();
        assert!(first.used_fallback);
        assert!(first.assessment.outcome.is_healthy());

        let second = inspector.inspect(&image()).await.unwrap();
        assert!(!second.from_cache);
        assert!(!second.used_fallback);
        assert_eq!(ner.calls.load(Ordering::SeqCst), 2);
        assert!(second
            .assessment
            .outcome
            .verdict()
            .unwrap()
            .messages()
            .contains(&"CARDIAC ACTIVITY: absent is not present"));

        // The engine's own answer is cached
        let third = inspector.inspect(&image()).await.unwrap();
        assert!(third.from_cache);
        assert_eq!(ner.calls.load(Ordering::SeqCst), 2);
        assert_eq!(third.assessment.outcome, second.assessment.outcome);
    }

    #[tokio::test]
    async fn test_upload_checks() {
        let inspector = ScanInspectorBuilder::new()
            .text_recognizer(Arc::new(TranscriptRecognizer::new()))
            .build()
            .unwrap();

        let no_file = inspector.inspect(&ScanImage::new("", vec![1])).await;
        assert!(matches!(no_file, Err(RuntimeError::NoImageSelected)));

        let empty = inspector.inspect(&ScanImage::new("scan.png", vec![])).await;
        assert!(matches!(empty, Err(RuntimeError::EmptyImage(_))));
    }

    #[test]
    fn test_builder_requires_text_recognizer() {
        let result = ScanInspectorBuilder::new().build();
        assert!(matches!(result, Err(RuntimeError::NotConfigured(_))));
    }
}

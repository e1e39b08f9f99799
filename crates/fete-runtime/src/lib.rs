//! # fete-runtime
//!
//! Async inspection pipeline for fetal scan reports.
//!
//! This crate wraps the deterministic validation in `fete-core` with the
//! parts that talk to the outside world: OCR and NER engines behind traits,
//! timeouts, retries, a circuit breaker per stage, and a recognition cache.
//!
//! Validation itself never leaves `fete-core`. When the NER engine is
//! missing or failing, entities come from the pattern recognizer instead.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use fete_runtime::{ScanImage, ScanInspectorBuilder, TranscriptRecognizer};
//!
//! let inspector = ScanInspectorBuilder::new()
//!     .text_recognizer(Arc::new(TranscriptRecognizer::new()))
//!     .build()?;
//!
//! let report = inspector.inspect(&ScanImage::new("scan.txt", text)).await?;
//! println!("{}", report.assessment.summary());
//! ```

pub mod cache;
pub mod config;
pub mod orchestrator;
pub mod recognizers;
pub mod resilience;

pub use cache::{CacheKey, RecognitionCache};
pub use config::{CacheConfig, ConfigError, RetryConfig, RuntimeConfig};
pub use orchestrator::{InspectionReport, RuntimeError, ScanInspector, ScanInspectorBuilder};
pub use recognizers::{
    EntityRecognizer, PatternEntityRecognizer, RecognizerError, ScanImage, TextRecognizer,
    TranscriptRecognizer,
};
pub use resilience::{CircuitBreaker, CircuitBreakerConfig, CircuitState, Stage};

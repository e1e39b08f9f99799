//! Recognizer traits and common types.

use async_trait::async_trait;
use fete_core::Entity;
use std::time::Duration;
use thiserror::Error;

/// Errors from recognition engines.
#[derive(Error, Debug, Clone)]
pub enum RecognizerError {
    #[error("Engine unavailable: {0}")]
    Unavailable(String),

    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("Recognition failed: {0}")]
    Failed(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),
}

impl RecognizerError {
    /// Whether another attempt could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, RecognizerError::Unavailable(_) | RecognizerError::Timeout(_))
    }
}

/// An uploaded scan report image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanImage {
    /// Name the file was uploaded under
    pub file_name: String,

    /// Raw image bytes
    pub bytes: Vec<u8>,
}

impl ScanImage {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Turns a scan image into text.
///
/// Implementations wrap an OCR engine. Line order should follow reading
/// order; lines may be joined with any whitespace.
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    /// Engine name, for logs.
    fn name(&self) -> &str;

    /// Recognize the text of one image.
    async fn recognize(&self, image: &ScanImage) -> Result<String, RecognizerError>;
}

/// Assigns measurement labels to spans of recognized text.
///
/// Implementations wrap an NER model. Entities are returned in text order.
#[async_trait]
pub trait EntityRecognizer: Send + Sync {
    /// Engine name, for logs.
    fn name(&self) -> &str;

    /// Recognize labeled entities in `text`.
    async fn recognize(&self, text: &str) -> Result<Vec<Entity>, RecognizerError>;
}

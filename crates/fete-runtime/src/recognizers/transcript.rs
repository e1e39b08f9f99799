//! Text "recognition" for reports that already are text.
//!
//! Scanners often export a text layer next to the image, and test fixtures
//! are easier to write as text. This recognizer accepts UTF-8 uploads and
//! returns them unchanged.

use async_trait::async_trait;

use super::traits::{RecognizerError, ScanImage, TextRecognizer};

/// Treats the uploaded bytes as an already-recognized UTF-8 transcript.
#[derive(Debug, Clone, Copy, Default)]
pub struct TranscriptRecognizer;

impl TranscriptRecognizer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TextRecognizer for TranscriptRecognizer {
    fn name(&self) -> &str {
        "transcript"
    }

    async fn recognize(&self, image: &ScanImage) -> Result<String, RecognizerError> {
        String::from_utf8(image.bytes.clone())
            .map_err(|_| RecognizerError::UnsupportedFormat(image.file_name.clone()))
    }
}

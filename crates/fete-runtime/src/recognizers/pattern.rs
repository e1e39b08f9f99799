//! Deterministic entity recognition backed by fete-core patterns.

use async_trait::async_trait;
use fete_core::{Entity, PatternRecognizer, ReferenceProfileStore};

use super::traits::{EntityRecognizer, RecognizerError};

/// Rule-based entity recognizer.
///
/// Used as the fallback when the configured NER engine fails, and on its
/// own when no model is available.
pub struct PatternEntityRecognizer {
    inner: PatternRecognizer,
}

impl PatternEntityRecognizer {
    /// Build a recognizer for the labels of `store`.
    pub fn for_store(store: &ReferenceProfileStore) -> Result<Self, RecognizerError> {
        let inner = PatternRecognizer::for_store(store)
            .map_err(|e| RecognizerError::Failed(format!("Invalid label pattern: {}", e)))?;
        Ok(Self { inner })
    }

    /// Recognize synchronously. Never fails.
    pub fn recognize_now(&self, text: &str) -> Vec<Entity> {
        self.inner.recognize(text)
    }
}

#[async_trait]
impl EntityRecognizer for PatternEntityRecognizer {
    fn name(&self) -> &str {
        "pattern"
    }

    async fn recognize(&self, text: &str) -> Result<Vec<Entity>, RecognizerError> {
        Ok(self.recognize_now(text))
    }
}

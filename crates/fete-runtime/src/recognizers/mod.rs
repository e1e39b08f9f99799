//! Recognition engines for the inspection pipeline.
//!
//! OCR and NER engines are external collaborators behind traits. The
//! built-in implementations are deterministic: a pass-through for text
//! transcripts and the pattern recognizer from fete-core.

mod pattern;
mod traits;
mod transcript;

pub use pattern::PatternEntityRecognizer;
pub use traits::{EntityRecognizer, RecognizerError, ScanImage, TextRecognizer};
pub use transcript::TranscriptRecognizer;

use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::types::ExtractionOutput;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("structured extraction unavailable: {0}")]
    Unavailable(String),
    #[error("extraction engine error: {0}")]
    Engine(String),
}

/// Abstraction over the upstream document-understanding step.
/// Implementations accept the raw document bytes and return either a
/// structured record or the recognized text.
pub trait ExtractionBackend: Send + Sync {
    fn extract_structured(&self, document: &[u8]) -> Result<Value, BackendError>;
    fn extract_text(&self, document: &[u8]) -> Result<String, BackendError>;
}

/// Ask `backend` for a structured record, falling back to raw text when the
/// structured path fails.
pub fn extract_document<B: ExtractionBackend + ?Sized>(
    backend: &B,
    document: &[u8],
) -> Result<ExtractionOutput, BackendError> {
    match backend.extract_structured(document) {
        Ok(record) => Ok(ExtractionOutput::Structured(record)),
        Err(e) => {
            warn!(error = %e, "structured extraction failed, falling back to raw text");
            backend.extract_text(document).map(ExtractionOutput::RawText)
        }
    }
}

// ── Mock backend (always available, used for tests) ───────────────────────────

/// Returns pre-set output regardless of the document, for exercising the
/// pipeline without a real extraction service.
pub struct MockBackend {
    pub structured: Option<Value>,
    pub text: Option<String>,
}

impl MockBackend {
    /// A backend whose structured path succeeds.
    pub fn structured(record: Value) -> Self {
        Self { structured: Some(record), text: None }
    }

    /// A backend that only produces text.
    pub fn text(text: impl Into<String>) -> Self {
        Self { structured: None, text: Some(text.into()) }
    }
}

impl ExtractionBackend for MockBackend {
    fn extract_structured(&self, _document: &[u8]) -> Result<Value, BackendError> {
        self.structured
            .clone()
            .ok_or_else(|| BackendError::Unavailable("mock has no structured record".into()))
    }

    fn extract_text(&self, _document: &[u8]) -> Result<String, BackendError> {
        self.text
            .clone()
            .ok_or_else(|| BackendError::Engine("mock has no text".into()))
    }
}

use serde::{Deserialize, Serialize};
use serde_json::Value;

use reckon_core::Receipt;

use crate::structured::StructuredIngestor;
use crate::text::TextExtractor;

/// What the upstream extraction step handed back: either a partially
/// structured record or plain text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum ExtractionOutput {
    Structured(Value),
    RawText(String),
}

impl ExtractionOutput {
    /// Classify an untyped payload: a JSON object is a structured record,
    /// anything else is treated as receipt text.
    pub fn detect(payload: &str) -> Self {
        if payload.trim_start().starts_with('{') {
            if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(payload) {
                return ExtractionOutput::Structured(value);
            }
        }
        ExtractionOutput::RawText(payload.to_string())
    }

    /// Route to the matching ingestion path.
    pub fn parse(&self) -> Receipt {
        match self {
            ExtractionOutput::Structured(record) => StructuredIngestor::ingest(record),
            ExtractionOutput::RawText(text) => TextExtractor::extract(text),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ExtractionOutput::Structured(_) => "structured",
            ExtractionOutput::RawText(_) => "raw_text",
        }
    }
}

/// Parse either kind of extraction output into a canonical receipt.
pub fn parse(input: &ExtractionOutput) -> Receipt {
    input.parse()
}

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{error, info};

use reckon_core::{parse_amount, round_cents, Receipt, ReceiptDraft, ReceiptLineItem};

/// Confidence given to items that arrive already structured.
const STRUCTURED_CONFIDENCE: f64 = 0.95;

const UNKNOWN_ITEM: &str = "Unknown Item";

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("structured record must be a JSON object, got {0}")]
    NotARecord(&'static str),
    #[error("field `items` must be a list, got {0}")]
    ItemsNotAList(&'static str),
    #[error("items[{0}] must be an object")]
    ItemNotAnObject(usize),
    #[error("field `{field}` is not numeric: {value}")]
    NotNumeric { field: String, value: String },
    #[error("field `{field}` must be a string")]
    NotText { field: String },
}

/// Converts a loosely-typed extraction record into a canonical receipt.
pub struct StructuredIngestor;

impl StructuredIngestor {
    /// Ingest `record`, falling back to an empty receipt carrying the
    /// stringified input if the record is malformed.
    pub fn ingest(record: &Value) -> Receipt {
        match Self::try_ingest(record) {
            Ok(receipt) => {
                info!(items = receipt.items().len(), "parsed receipt from structured record");
                receipt
            }
            Err(e) => {
                error!(error = %e, "structured ingestion failed; returning empty receipt");
                Receipt::empty(Some(record.to_string()))
            }
        }
    }

    /// Strict variant of [`StructuredIngestor::ingest`] that reports why a
    /// record was rejected.
    pub fn try_ingest(record: &Value) -> Result<Receipt, IngestError> {
        let record = record
            .as_object()
            .ok_or_else(|| IngestError::NotARecord(json_type(record)))?;

        let raw_items: &[Value] = match record.get("items") {
            None | Some(Value::Null) => &[],
            Some(Value::Array(items)) => items.as_slice(),
            Some(other) => return Err(IngestError::ItemsNotAList(json_type(other))),
        };

        let mut items = Vec::with_capacity(raw_items.len());
        for (index, raw) in raw_items.iter().enumerate() {
            let raw = raw.as_object().ok_or(IngestError::ItemNotAnObject(index))?;
            if let Some(item) = reconcile_item(index, raw)? {
                items.push(item);
            }
        }

        Ok(Receipt::from_draft(ReceiptDraft {
            items,
            subtotal: number_field(record, "subtotal", 0.0)?,
            tax: number_field(record, "tax", 0.0)?,
            total: number_field(record, "total", 0.0)?,
            store_name: text_field(record, "store_name")?,
            date: text_field(record, "date")?,
            raw_source_text: text_field(record, "raw_text")?,
        }))
    }
}

// ── Item reconciliation ───────────────────────────────────────────────────────

/// Fill in whichever of unit/total price is missing. Items still priced at
/// zero afterwards are dropped (`Ok(None)`).
fn reconcile_item(index: usize, raw: &Map<String, Value>) -> Result<Option<ReceiptLineItem>, IngestError> {
    let field = |name: &str| format!("items[{index}].{name}");

    let name = match raw.get("name") {
        None | Some(Value::Null) => UNKNOWN_ITEM.to_string(),
        Some(Value::String(s)) if s.trim().is_empty() => UNKNOWN_ITEM.to_string(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(_) => return Err(IngestError::NotText { field: field("name") }),
    };

    let quantity = coerce_number(raw.get("quantity"), &field("quantity"), 1.0)?;
    let mut unit_price = coerce_number(raw.get("unit_price"), &field("unit_price"), 0.0)?;
    let mut total_price = coerce_number(raw.get("total_price"), &field("total_price"), 0.0)?;

    if total_price == 0.0 && unit_price > 0.0 {
        total_price = round_cents(quantity * unit_price);
    }
    if unit_price == 0.0 && total_price > 0.0 {
        unit_price = round_cents(total_price / quantity.max(1.0));
    }

    if unit_price <= 0.0 {
        return Ok(None);
    }

    Ok(Some(
        ReceiptLineItem::new(name, quantity, unit_price, total_price)
            .with_confidence(STRUCTURED_CONFIDENCE),
    ))
}

// ── Coercion ──────────────────────────────────────────────────────────────────

fn number_field(record: &Map<String, Value>, name: &str, default: f64) -> Result<f64, IngestError> {
    coerce_number(record.get(name), name, default)
}

/// Falsy values (`null`, `false`, `0`, `""`, `[]`, `{}`) take `default`.
fn coerce_number(value: Option<&Value>, field: &str, default: f64) -> Result<f64, IngestError> {
    let not_numeric = |v: &Value| IngestError::NotNumeric {
        field: field.to_string(),
        value: v.to_string(),
    };

    let Some(value) = value else {
        return Ok(default);
    };

    match value {
        Value::Null | Value::Bool(false) => Ok(default),
        Value::Bool(true) => Ok(1.0),
        Value::Number(n) => match n.as_f64() {
            Some(v) if v == 0.0 => Ok(default),
            Some(v) => Ok(v),
            None => Err(not_numeric(value)),
        },
        Value::String(s) if s.trim().is_empty() => Ok(default),
        Value::String(s) => {
            parse_amount(s.trim().trim_start_matches('$')).ok_or_else(|| not_numeric(value))
        }
        Value::Array(a) if a.is_empty() => Ok(default),
        Value::Object(o) if o.is_empty() => Ok(default),
        other => Err(not_numeric(other)),
    }
}

/// Strings pass through unchanged; `null`, missing and `""` become `None`.
fn text_field(record: &Map<String, Value>, name: &str) -> Result<Option<String>, IngestError> {
    match record.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(IngestError::NotText { field: name.to_string() }),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

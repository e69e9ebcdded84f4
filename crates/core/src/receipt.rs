use serde::Serialize;

use crate::item::ReceiptLineItem;
use crate::money::round_cents;

/// Receipt fields as an ingestion path assembled them, before the
/// subtotal/total invariants are applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReceiptDraft {
    pub items: Vec<ReceiptLineItem>,
    pub subtotal: f64,
    pub tax: f64,
    pub total: f64,
    pub store_name: Option<String>,
    /// Free-form; never parsed into a calendar date.
    pub date: Option<String>,
    pub raw_source_text: Option<String>,
}

/// The canonical receipt every downstream component works on.
///
/// Immutable once built, apart from a single [`Receipt::record_processing_time`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Receipt {
    items: Vec<ReceiptLineItem>,
    subtotal: f64,
    tax: f64,
    total: f64,
    store_name: Option<String>,
    date: Option<String>,
    raw_source_text: Option<String>,
    processing_time: Option<f64>,
}

impl Receipt {
    /// Build a receipt, filling a zero subtotal from the items and a zero
    /// total from subtotal + tax.
    pub fn from_draft(draft: ReceiptDraft) -> Self {
        let ReceiptDraft {
            items,
            mut subtotal,
            tax,
            mut total,
            store_name,
            date,
            raw_source_text,
        } = draft;

        if !items.is_empty() {
            if subtotal == 0.0 {
                subtotal = round_cents(items.iter().map(ReceiptLineItem::total_price).sum());
            }
            if total == 0.0 {
                total = round_cents(subtotal + tax);
            }
        }

        Self {
            items,
            subtotal,
            tax,
            total,
            store_name,
            date,
            raw_source_text,
            processing_time: None,
        }
    }

    /// A receipt with no items and zero amounts.
    pub fn empty(raw_source_text: Option<String>) -> Self {
        Self::from_draft(ReceiptDraft {
            raw_source_text,
            ..ReceiptDraft::default()
        })
    }

    pub fn items(&self) -> &[ReceiptLineItem] {
        &self.items
    }

    pub fn subtotal(&self) -> f64 {
        self.subtotal
    }

    pub fn tax(&self) -> f64 {
        self.tax
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn store_name(&self) -> Option<&str> {
        self.store_name.as_deref()
    }

    pub fn date(&self) -> Option<&str> {
        self.date.as_deref()
    }

    pub fn raw_source_text(&self) -> Option<&str> {
        self.raw_source_text.as_deref()
    }

    pub fn processing_time(&self) -> Option<f64> {
        self.processing_time
    }

    /// Sum of item totals, rounded to cents.
    pub fn item_total(&self) -> f64 {
        round_cents(self.items.iter().map(ReceiptLineItem::total_price).sum())
    }

    /// Record how long the pipeline took, in seconds. Only the first write
    /// is kept; returns `false` if a time was already recorded.
    pub fn record_processing_time(&mut self, seconds: f64) -> bool {
        if self.processing_time.is_some() {
            return false;
        }
        self.processing_time = Some(seconds);
        true
    }

    /// Rebuild the receipt with each item labelled by the matching entry of
    /// `categories`. Items past the end of `categories` keep their label.
    pub fn into_categorized<I>(self, categories: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let mut categories = categories.into_iter();
        let items = self
            .items
            .into_iter()
            .map(|item| match categories.next() {
                Some(category) => item.with_category(category),
                None => item,
            })
            .collect();
        Self { items, ..self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, qty: f64, unit: f64) -> ReceiptLineItem {
        ReceiptLineItem::new(name, qty, unit, round_cents(qty * unit))
    }

    #[test]
    fn zero_subtotal_is_filled_from_items() {
        let r = Receipt::from_draft(ReceiptDraft {
            items: vec![item("Milk", 1.0, 3.49), item("Chips", 2.0, 1.99)],
            tax: 0.50,
            ..ReceiptDraft::default()
        });
        assert_eq!(r.subtotal(), 7.47);
        assert_eq!(r.total(), 7.97);
    }

    #[test]
    fn supplied_amounts_are_kept() {
        let r = Receipt::from_draft(ReceiptDraft {
            items: vec![item("Milk", 1.0, 3.49)],
            subtotal: 47.44,
            tax: 3.80,
            total: 51.24,
            ..ReceiptDraft::default()
        });
        assert_eq!(r.subtotal(), 47.44);
        assert_eq!(r.total(), 51.24);
    }

    #[test]
    fn empty_receipt_keeps_zero_amounts() {
        let r = Receipt::empty(None);
        assert!(r.items().is_empty());
        assert_eq!(r.subtotal(), 0.0);
        assert_eq!(r.total(), 0.0);
        assert_eq!(r.processing_time(), None);
    }

    #[test]
    fn processing_time_written_once() {
        let mut r = Receipt::empty(None);
        assert!(r.record_processing_time(0.25));
        assert!(!r.record_processing_time(9.0));
        assert_eq!(r.processing_time(), Some(0.25));
    }

    #[test]
    fn into_categorized_labels_in_order() {
        let r = Receipt::from_draft(ReceiptDraft {
            items: vec![item("Milk", 1.0, 3.49), item("Chips", 1.0, 1.99), item("Soap", 1.0, 2.00)],
            ..ReceiptDraft::default()
        });
        let r = r.into_categorized(["Dairy", "Snacks"]);
        let cats: Vec<&str> = r.items().iter().map(ReceiptLineItem::category).collect();
        assert_eq!(cats, vec!["Dairy", "Snacks", crate::item::UNCATEGORIZED]);
        assert_eq!(r.total(), 7.48);
    }

    #[test]
    fn serializes_field_names() {
        let r = Receipt::from_draft(ReceiptDraft {
            items: vec![item("Milk", 1.0, 3.49)],
            store_name: Some("Walmart".into()),
            ..ReceiptDraft::default()
        });
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["store_name"], "Walmart");
        assert_eq!(v["items"][0]["unit_price"], 3.49);
        assert_eq!(v["items"][0]["category"], "Uncategorized");
        assert!(v["processing_time"].is_null());
    }
}

use serde::Serialize;

use crate::money::round_cents;

/// Category carried by an item before any categorizer has seen it.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Confidence assigned when the extraction path does not supply one.
pub const DEFAULT_CONFIDENCE: f64 = 0.9;

/// Largest accepted gap between `total_price` and `quantity × unit_price`.
const TOTAL_TOLERANCE: f64 = 0.05;

/// One purchased entry on a receipt.
///
/// `quantity × unit_price` is authoritative: a supplied total that drifts more
/// than five cents from it is replaced on construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReceiptLineItem {
    name: String,
    quantity: f64,
    unit_price: f64,
    total_price: f64,
    category: String,
    confidence: f64,
}

impl ReceiptLineItem {
    pub fn new(name: impl Into<String>, quantity: f64, unit_price: f64, total_price: f64) -> Self {
        let expected = round_cents(quantity * unit_price);
        let total_price = if (total_price - expected).abs() > TOTAL_TOLERANCE {
            expected
        } else {
            total_price
        };

        Self {
            name: name.into(),
            quantity,
            unit_price,
            total_price,
            category: UNCATEGORIZED.to_string(),
            confidence: DEFAULT_CONFIDENCE,
        }
    }

    /// Confidence is clamped to 0.0–1.0.
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    /// Returns a copy of this item labelled with `category`.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn quantity(&self) -> f64 {
        self.quantity
    }

    pub fn unit_price(&self) -> f64 {
        self.unit_price
    }

    pub fn total_price(&self) -> f64 {
        self.total_price
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consistent_total_is_kept() {
        let item = ReceiptLineItem::new("Chips", 2.0, 1.99, 3.98);
        assert_eq!(item.total_price(), 3.98);
    }

    #[test]
    fn total_within_tolerance_is_kept() {
        let item = ReceiptLineItem::new("Tomatoes", 3.0, 0.99, 3.00);
        assert_eq!(item.total_price(), 3.00);
    }

    #[test]
    fn inconsistent_total_is_recomputed() {
        let item = ReceiptLineItem::new("Chips", 2.0, 1.99, 1.99);
        assert_eq!(item.total_price(), 3.98);
    }

    #[test]
    fn defaults() {
        let item = ReceiptLineItem::new("Milk", 1.0, 3.49, 3.49);
        assert_eq!(item.category(), UNCATEGORIZED);
        assert_eq!(item.confidence(), DEFAULT_CONFIDENCE);
    }

    #[test]
    fn confidence_is_clamped() {
        let item = ReceiptLineItem::new("Milk", 1.0, 3.49, 3.49).with_confidence(1.5);
        assert_eq!(item.confidence(), 1.0);
        let item = item.with_confidence(-0.2);
        assert_eq!(item.confidence(), 0.0);
    }

    #[test]
    fn with_category_keeps_prices() {
        let item = ReceiptLineItem::new("Milk", 1.0, 3.49, 3.49).with_category("Dairy & Eggs");
        assert_eq!(item.category(), "Dairy & Eggs");
        assert_eq!(item.total_price(), 3.49);
        assert_eq!(item.name(), "Milk");
    }
}

use serde::{Deserialize, Serialize};

/// All items sharing one category label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryBucket {
    pub category: String,
    /// Rounded to cents.
    pub total_spent: f64,
    /// Share of total spending, rounded to one decimal place.
    pub percentage: f64,
    pub item_count: usize,
    /// Item names in the order they appear on the receipt.
    pub item_names: Vec<String>,
}

/// Deterministic spending aggregates for one receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendingAnalysis {
    pub total_spending: f64,
    /// Sorted by `total_spent`, largest first; ties keep first-seen order.
    pub category_breakdown: Vec<CategoryBucket>,
    pub top_category: Option<String>,
    pub overspending_categories: Vec<String>,
    pub anomalies: Vec<String>,
}

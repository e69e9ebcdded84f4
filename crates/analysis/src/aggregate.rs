use std::collections::{HashMap, HashSet};

use tracing::info;

use reckon_core::{
    round_cents, round_dp, CategoryBucket, Receipt, ReceiptLineItem, SpendingAnalysis,
};

use crate::config::AnalysisConfig;

/// Turns a categorized receipt into spending aggregates.
///
/// Pure and deterministic: the same receipt always yields byte-identical
/// output, including bucket order and every message string.
#[derive(Debug, Clone, Default)]
pub struct SpendingAnalyzer {
    config: AnalysisConfig,
}

impl SpendingAnalyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn analyze(&self, receipt: &Receipt) -> SpendingAnalysis {
        let items = receipt.items();

        // No recovered items but a printed total: analyze against the total.
        let mut total_spending = receipt.item_total();
        if total_spending == 0.0 {
            total_spending = receipt.total();
        }

        let category_breakdown = build_breakdown(items, total_spending);
        let top_category = category_breakdown.first().map(|b| b.category.clone());
        let overspending_categories = self.detect_overspending(&category_breakdown);
        let anomalies = self.find_anomalies(items, total_spending);

        info!(
            total = total_spending,
            categories = category_breakdown.len(),
            anomalies = anomalies.len(),
            "spending analysis complete"
        );

        SpendingAnalysis {
            total_spending,
            category_breakdown,
            top_category,
            overspending_categories,
            anomalies,
        }
    }

    fn detect_overspending(&self, breakdown: &[CategoryBucket]) -> Vec<String> {
        breakdown
            .iter()
            .filter(|b| b.percentage > self.config.overspend_threshold_pct)
            .map(|b| format!("{} ({:.1}% of total)", b.category, b.percentage))
            .collect()
    }

    fn find_anomalies(&self, items: &[ReceiptLineItem], total_spending: f64) -> Vec<String> {
        if items.is_empty() {
            return Vec::new();
        }

        let mean = total_spending / items.len() as f64;
        let ceiling = mean * self.config.anomaly_multiplier;
        let mut anomalies: Vec<String> = items
            .iter()
            .filter(|i| i.total_price() > ceiling)
            .map(|i| format!("{} is unusually expensive (${:.2})", i.name(), i.total_price()))
            .collect();

        let distinct: HashSet<&str> = items.iter().map(ReceiptLineItem::category).collect();
        if distinct.len() == 1 && items.len() > self.config.single_category_min_items {
            anomalies.push(format!(
                "All items fall under one category: {}",
                items[0].category()
            ));
        }

        anomalies
    }
}

/// Analyze with the default thresholds.
pub fn analyze(receipt: &Receipt) -> SpendingAnalysis {
    SpendingAnalyzer::default().analyze(receipt)
}

/// Group items by exact category label in first-seen order, then sort by
/// spend, largest first. The sort is stable, so equal spends keep their
/// first-seen order.
fn build_breakdown(items: &[ReceiptLineItem], total_spending: f64) -> Vec<CategoryBucket> {
    let mut groups: Vec<(&str, Vec<&ReceiptLineItem>)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for item in items {
        let category = item.category();
        match index.get(category) {
            Some(&i) => groups[i].1.push(item),
            None => {
                index.insert(category, groups.len());
                groups.push((category, vec![item]));
            }
        }
    }

    let mut breakdown: Vec<CategoryBucket> = groups
        .into_iter()
        .map(|(category, members)| {
            let total_spent = round_cents(members.iter().map(|i| i.total_price()).sum());
            let percentage = if total_spending > 0.0 {
                round_dp(total_spent / total_spending * 100.0, 1)
            } else {
                0.0
            };
            CategoryBucket {
                category: category.to_string(),
                total_spent,
                percentage,
                item_count: members.len(),
                item_names: members.iter().map(|i| i.name().to_string()).collect(),
            }
        })
        .collect();

    breakdown.sort_by(|a, b| b.total_spent.total_cmp(&a.total_spent));
    breakdown
}

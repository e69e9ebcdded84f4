use std::collections::HashMap;

use thiserror::Error;
use tracing::{info, warn};

use reckon_core::Receipt;

#[derive(Debug, Error)]
pub enum CategorizeError {
    #[error("categorizer unavailable: {0}")]
    Unavailable(String),
    #[error("categorizer returned malformed output: {0}")]
    Malformed(String),
}

/// Assigns open-vocabulary category labels to item names.
///
/// Implementations may be remote services; every failure is recovered by
/// [`assign_categories`], so nothing here needs to retry.
pub trait Categorizer: Send + Sync {
    /// Label a batch of item names. The returned map may omit names or key
    /// them with different case or surrounding whitespace.
    fn categorize_batch(&self, names: &[&str]) -> Result<HashMap<String, String>, CategorizeError>;

    /// Label one item; used for names the batch call left unanswered.
    fn categorize_one(&self, name: &str) -> Result<String, CategorizeError>;
}

impl<C: Categorizer + ?Sized> Categorizer for Box<C> {
    fn categorize_batch(&self, names: &[&str]) -> Result<HashMap<String, String>, CategorizeError> {
        (**self).categorize_batch(names)
    }

    fn categorize_one(&self, name: &str) -> Result<String, CategorizeError> {
        (**self).categorize_one(name)
    }
}

/// Label every item of `receipt` and return the re-labelled receipt.
///
/// Lookup tries the exact name, then the trimmed, lower-cased name. Items
/// still unlabelled go through [`Categorizer::categorize_one`]; if that fails
/// or answers blank they get `fallback`.
pub fn assign_categories<C: Categorizer + ?Sized>(
    receipt: Receipt,
    categorizer: &C,
    fallback: &str,
) -> Receipt {
    let names: Vec<&str> = receipt.items().iter().map(|i| i.name()).collect();
    if names.is_empty() {
        return receipt;
    }

    let categories: Vec<String> = match categorizer.categorize_batch(&names) {
        Ok(mapping) => {
            let lookup = CategoryLookup::new(&mapping);
            let mut matched = 0usize;
            let categories: Vec<String> = names
                .iter()
                .map(|name| match lookup.get(name) {
                    Some(category) => {
                        matched += 1;
                        category.to_string()
                    }
                    None => single_item_category(categorizer, name, fallback),
                })
                .collect();
            info!(matched, items = names.len(), "assigned categories from batch");
            categories
        }
        Err(e) => {
            warn!(error = %e, "batch categorization failed, using single-item fallback");
            names
                .iter()
                .map(|name| single_item_category(categorizer, name, fallback))
                .collect()
        }
    };

    receipt.into_categorized(categories)
}

fn single_item_category<C: Categorizer + ?Sized>(categorizer: &C, name: &str, fallback: &str) -> String {
    match categorizer.categorize_one(name) {
        Ok(answer) => {
            let label = answer.trim().trim_matches(|c: char| c == '"' || c == '\'').trim();
            if label.is_empty() {
                fallback.to_string()
            } else {
                label.to_string()
            }
        }
        Err(e) => {
            warn!(item = name, error = %e, "single-item categorization failed");
            fallback.to_string()
        }
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Name → label lookup tolerant of case and surrounding whitespace.
struct CategoryLookup<'a> {
    exact: &'a HashMap<String, String>,
    normalized: HashMap<String, &'a str>,
}

impl<'a> CategoryLookup<'a> {
    fn new(mapping: &'a HashMap<String, String>) -> Self {
        // Keys that normalize to the same string resolve to the smallest
        // original key, independent of hash order.
        let mut keys: Vec<&String> = mapping.keys().collect();
        keys.sort();
        let mut normalized = HashMap::new();
        for key in keys {
            let label = mapping[key].trim();
            if !label.is_empty() {
                normalized.entry(normalize(key)).or_insert(label);
            }
        }
        Self { exact: mapping, normalized }
    }

    fn get(&self, name: &str) -> Option<&'a str> {
        self.exact
            .get(name)
            .map(|label| label.trim())
            .filter(|label| !label.is_empty())
            .or_else(|| self.normalized.get(&normalize(name)).copied())
    }
}

// ── Mapping categorizer ───────────────────────────────────────────────────────

/// A fixed name → category table, e.g. loaded from a JSON file.
#[derive(Debug, Clone, Default)]
pub struct MappingCategorizer {
    mapping: HashMap<String, String>,
}

impl MappingCategorizer {
    pub fn new(mapping: HashMap<String, String>) -> Self {
        Self { mapping }
    }

    /// Parse a JSON object of `{"item name": "category"}`.
    pub fn from_json(json: &str) -> Result<Self, CategorizeError> {
        let mapping: HashMap<String, String> =
            serde_json::from_str(json).map_err(|e| CategorizeError::Malformed(e.to_string()))?;
        Ok(Self::new(mapping))
    }
}

impl Categorizer for MappingCategorizer {
    fn categorize_batch(&self, _names: &[&str]) -> Result<HashMap<String, String>, CategorizeError> {
        Ok(self.mapping.clone())
    }

    fn categorize_one(&self, name: &str) -> Result<String, CategorizeError> {
        CategoryLookup::new(&self.mapping)
            .get(name)
            .map(str::to_string)
            .ok_or_else(|| CategorizeError::Unavailable(format!("no mapping for '{name}'")))
    }
}

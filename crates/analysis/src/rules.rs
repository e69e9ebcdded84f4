use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::categorize::{CategorizeError, Categorizer};
use crate::config::ConfigError;
use crate::util::similarity;

/// Maps item names matching `pattern` to `category`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRule {
    pub name: String,
    #[serde(default)]
    pub priority: i32,
    pub pattern: String,
    #[serde(default)]
    pub match_type: MatchType,
    pub category: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub enum MatchType {
    #[default]
    Contains,
    Exact,
    Regex,
    Fuzzy {
        threshold: f32,
    },
}

impl std::str::FromStr for MatchType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "contains" => Ok(MatchType::Contains),
            "exact" => Ok(MatchType::Exact),
            "regex" => Ok(MatchType::Regex),
            s if s.starts_with("fuzzy:") => {
                let threshold = s["fuzzy:".len()..]
                    .parse::<f32>()
                    .map_err(|_| "Invalid fuzzy threshold".to_string())?;
                Ok(MatchType::Fuzzy { threshold })
            }
            other => Err(format!("Unknown match type: '{other}'")),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RuleFile {
    #[serde(default)]
    rules: Vec<CategoryRule>,
}

/// A rule paired with its precompiled regex, if it has one.
struct CompiledRule {
    rule: CategoryRule,
    compiled_regex: Option<regex::Regex>,
}

/// Local categorizer driven by user-written rules. The highest-priority
/// matching rule decides; ties go to the rule listed first.
pub struct RuleCategorizer {
    rules: Vec<CompiledRule>,
}

impl RuleCategorizer {
    pub fn new(rules: Vec<CategoryRule>) -> Self {
        let mut compiled: Vec<CompiledRule> = rules
            .into_iter()
            .map(|rule| {
                let compiled_regex = if let MatchType::Regex = &rule.match_type {
                    regex::RegexBuilder::new(&rule.pattern)
                        .case_insensitive(true)
                        .build()
                        .ok()
                } else {
                    None
                };
                CompiledRule { rule, compiled_regex }
            })
            .collect();
        // Highest priority first.
        compiled.sort_by(|a, b| b.rule.priority.cmp(&a.rule.priority));
        Self { rules: compiled }
    }

    /// Load rules from a TOML document of `[[rules]]` tables.
    pub fn from_toml(toml_content: &str) -> Result<Self, ConfigError> {
        let file: RuleFile = toml::from_str(toml_content)?;
        if let Some(bad) = file.rules.iter().find(|r| r.category.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!("rule '{}' has an empty category", bad.name)));
        }
        Ok(Self::new(file.rules))
    }

    pub fn find_matching_rule(&self, item_name: &str) -> Option<&CategoryRule> {
        let text = item_name.trim().to_lowercase();
        self.rules
            .iter()
            .find(|cr| rule_matches(cr, item_name, &text))
            .map(|cr| &cr.rule)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn rule_matches(cr: &CompiledRule, raw: &str, text: &str) -> bool {
    let pattern = cr.rule.pattern.trim().to_lowercase();
    match &cr.rule.match_type {
        MatchType::Contains => text.contains(&pattern),
        MatchType::Exact => text == pattern,
        MatchType::Regex => cr
            .compiled_regex
            .as_ref()
            .is_some_and(|re| re.is_match(raw)),
        MatchType::Fuzzy { threshold } => similarity(text, &pattern) >= *threshold,
    }
}

impl Categorizer for RuleCategorizer {
    fn categorize_batch(&self, names: &[&str]) -> Result<HashMap<String, String>, CategorizeError> {
        Ok(names
            .iter()
            .filter_map(|name| {
                self.find_matching_rule(name)
                    .map(|rule| (name.to_string(), rule.category.clone()))
            })
            .collect())
    }

    fn categorize_one(&self, name: &str) -> Result<String, CategorizeError> {
        self.find_matching_rule(name)
            .map(|rule| rule.category.clone())
            .ok_or_else(|| CategorizeError::Unavailable(format!("no rule matches '{name}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_rule(pattern: &str, match_type: MatchType, category: &str, priority: i32) -> CategoryRule {
        CategoryRule {
            name: "test".to_string(),
            priority,
            pattern: pattern.to_string(),
            match_type,
            category: category.to_string(),
        }
    }

    #[test]
    fn contains_match_case_insensitive() {
        let engine = RuleCategorizer::new(vec![make_rule("milk", MatchType::Contains, "Dairy", 1)]);
        assert_eq!(engine.find_matching_rule("2% MILK 1 GALLON").unwrap().category, "Dairy");
        assert!(engine.find_matching_rule("Cheddar Cheese").is_none());
    }

    #[test]
    fn exact_match_ignores_case_and_padding() {
        let engine = RuleCategorizer::new(vec![make_rule("bananas", MatchType::Exact, "Produce", 1)]);
        assert!(engine.find_matching_rule("  Bananas ").is_some());
        assert!(engine.find_matching_rule("Banana Bunch").is_none());
    }

    #[test]
    fn regex_match() {
        let engine = RuleCategorizer::new(vec![make_rule(
            r"^(tide|gain)\b|detergent",
            MatchType::Regex,
            "Laundry",
            1,
        )]);
        assert!(engine.find_matching_rule("Tide Pods 31ct").is_some());
        assert!(engine.find_matching_rule("Store Brand Detergent").is_some());
        assert!(engine.find_matching_rule("Tidewater Crackers").is_none());
    }

    #[test]
    fn invalid_regex_never_matches() {
        let engine = RuleCategorizer::new(vec![make_rule("(", MatchType::Regex, "Broken", 1)]);
        assert!(engine.find_matching_rule("(").is_none());
    }

    #[test]
    fn fuzzy_match_similar_strings() {
        let engine = RuleCategorizer::new(vec![make_rule(
            "tomatoes",
            MatchType::Fuzzy { threshold: 0.8 },
            "Produce",
            1,
        )]);
        // One edit away.
        assert!(engine.find_matching_rule("Tomatos").is_some());
        assert!(engine.find_matching_rule("Potato Chips").is_none());
    }

    #[test]
    fn priority_ordering_highest_wins() {
        let engine = RuleCategorizer::new(vec![
            make_rule("chips", MatchType::Contains, "Snacks", 1),
            make_rule("chips", MatchType::Contains, "Chips & Dips", 10),
        ]);
        assert_eq!(engine.find_matching_rule("Lays Chips").unwrap().category, "Chips & Dips");
    }

    #[test]
    fn batch_omits_unmatched_names() {
        let engine = RuleCategorizer::new(vec![make_rule("juice", MatchType::Contains, "Beverages", 1)]);
        let mapping = engine.categorize_batch(&["Orange Juice", "Bread"]).unwrap();
        assert_eq!(mapping.len(), 1);
        assert_eq!(mapping["Orange Juice"], "Beverages");
        assert!(engine.categorize_one("Bread").is_err());
    }

    #[test]
    fn from_toml_rules() {
        let toml = r#"
[[rules]]
name = "dairy"
pattern = "cheese"
category = "Dairy & Eggs"

[[rules]]
name = "fuzzy produce"
priority = 5
pattern = "bananas"
match_type = { Fuzzy = { threshold = 0.7 } }
category = "Fresh Produce"
"#;
        let engine = RuleCategorizer::from_toml(toml).unwrap();
        assert_eq!(engine.len(), 2);
        assert_eq!(engine.categorize_one("Cheddar Cheese").unwrap(), "Dairy & Eggs");
        assert_eq!(engine.categorize_one("Banana").unwrap(), "Fresh Produce");
    }

    #[test]
    fn from_toml_rejects_empty_category() {
        let toml = "[[rules]]\nname = \"x\"\npattern = \"y\"\ncategory = \"\"\n";
        assert!(matches!(RuleCategorizer::from_toml(toml), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn match_type_from_str() {
        use std::str::FromStr;
        assert_eq!(MatchType::from_str("Regex").unwrap(), MatchType::Regex);
        assert_eq!(
            MatchType::from_str("fuzzy:0.75").unwrap(),
            MatchType::Fuzzy { threshold: 0.75 }
        );
        assert!(MatchType::from_str("fuzzy:abc").is_err());
        assert!(MatchType::from_str("glob").is_err());
    }
}

pub mod aggregate;
pub mod categorize;
pub mod config;
pub mod pipeline;
pub mod rules;
pub(crate) mod util;

pub use aggregate::{analyze, SpendingAnalyzer};
pub use categorize::{assign_categories, CategorizeError, Categorizer, MappingCategorizer};
pub use config::{AnalysisConfig, ConfigError};
pub use pipeline::{AnalysisOutcome, PipelineError, ReceiptPipeline};
pub use rules::{CategoryRule, MatchType, RuleCategorizer};

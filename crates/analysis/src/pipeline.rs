use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use reckon_core::{Receipt, SpendingAnalysis};
use reckon_extract::{extract_document, BackendError, ExtractionBackend, ExtractionOutput};

use crate::aggregate::SpendingAnalyzer;
use crate::categorize::{assign_categories, Categorizer};
use crate::config::AnalysisConfig;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Extraction backend failed: {0}")]
    Backend(#[from] BackendError),
}

/// The result of a single receipt processing run.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisOutcome {
    /// The categorized receipt, with `processing_time` recorded.
    pub receipt: Receipt,
    pub analysis: SpendingAnalysis,
    pub processed_at: DateTime<Utc>,
}

/// Orchestrates: parse → categorize → analyze → record processing time.
pub struct ReceiptPipeline<C: Categorizer> {
    categorizer: C,
    analyzer: SpendingAnalyzer,
    fallback_category: String,
}

impl<C: Categorizer> ReceiptPipeline<C> {
    pub fn new(categorizer: C, config: AnalysisConfig) -> Self {
        let fallback_category = config.fallback_category.clone();
        Self {
            categorizer,
            analyzer: SpendingAnalyzer::new(config),
            fallback_category,
        }
    }

    /// Run one extraction output through the whole pipeline. Never fails:
    /// malformed input yields an empty receipt and an empty analysis.
    pub fn process(&self, output: &ExtractionOutput) -> AnalysisOutcome {
        let started = Instant::now();
        debug!(kind = output.kind(), "processing receipt");

        // 1. Normalize into a receipt.
        let receipt = output.parse();

        // 2. Label every item.
        let mut receipt = assign_categories(receipt, &self.categorizer, &self.fallback_category);

        // 3. Aggregate.
        let analysis = self.analyzer.analyze(&receipt);

        // 4. Stamp the wall-clock time spent.
        let elapsed = started.elapsed().as_secs_f64();
        receipt.record_processing_time(elapsed);

        info!(
            items = receipt.items().len(),
            total = analysis.total_spending,
            seconds = elapsed,
            "receipt processed"
        );

        AnalysisOutcome {
            receipt,
            analysis,
            processed_at: Utc::now(),
        }
    }

    /// Extract `document` with `backend`, then process the result.
    pub fn process_document<B: ExtractionBackend + ?Sized>(
        &self,
        backend: &B,
        document: &[u8],
    ) -> Result<AnalysisOutcome, PipelineError> {
        let output = extract_document(backend, document)?;
        Ok(self.process(&output))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

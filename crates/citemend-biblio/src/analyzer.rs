use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::enrichment::stats::{compute_statistics, generate_recommendations};
use crate::enrichment::{EnrichedReference, Recommendation, ReferencePipeline, Statistics};
use crate::error::{BiblioError, Result};
use crate::extraction::{ReferenceExtraction, find_bibliography_section};
use crate::types::RawReference;

/// Full pipeline result: one report per analyzed document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub success: bool,
    pub total_references: usize,
    pub processing_time_ms: String,
    pub statistics: Statistics,
    pub references: Vec<EnrichedReference>,
    pub recommendations: Vec<Recommendation>,
}

/// Top-level failure shape. `detail` carries diagnostics only in development
/// mode; production reports keep the category and message alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorReport {
    pub success: bool,
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ErrorReport {
    pub fn from_error(err: &BiblioError, development: bool) -> Self {
        Self {
            success: false,
            error: err.category().to_string(),
            message: "failed to process the bibliography".to_string(),
            detail: development.then(|| err.to_string()),
        }
    }
}

/// Wires the injected extraction client to the enrichment pipeline and the
/// aggregator. Owns nothing global; build one per process or per request.
pub struct BibliographyAnalyzer {
    extractor: Arc<dyn ReferenceExtraction>,
    pipeline: ReferencePipeline,
}

impl BibliographyAnalyzer {
    pub fn new(extractor: Arc<dyn ReferenceExtraction>, pipeline: ReferencePipeline) -> Self {
        Self {
            extractor,
            pipeline,
        }
    }

    /// Analyze a document's text: cut out the bibliography, extract records,
    /// enrich them, and aggregate.
    pub async fn analyze(&self, text: &str) -> Result<AnalysisReport> {
        if text.trim().is_empty() {
            return Err(BiblioError::EmptyInput);
        }
        let started = Instant::now();

        let section = find_bibliography_section(text);
        let references = self.extractor.extract_references(&section).await?;
        info!(count = references.len(), "references extracted");

        Ok(self.finish(references, started).await)
    }

    /// Enrich pre-extracted records, skipping the LLM stage.
    pub async fn enrich(&self, references: Vec<RawReference>) -> AnalysisReport {
        let started = Instant::now();
        self.finish(references, started).await
    }

    async fn finish(&self, references: Vec<RawReference>, started: Instant) -> AnalysisReport {
        let enriched = self.pipeline.enrich_batch(references).await;
        let statistics = compute_statistics(&enriched);
        let recommendations = generate_recommendations(&enriched);

        AnalysisReport {
            success: true,
            total_references: enriched.len(),
            processing_time_ms: format!("{}ms", started.elapsed().as_millis()),
            statistics,
            references: enriched,
            recommendations,
        }
    }
}

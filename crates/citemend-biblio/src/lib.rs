//! Citemend Biblio — bibliography reference enrichment.
//!
//! Takes the citation records extracted from an academic document, re-derives
//! embedded identifiers (DOI/ISBN/ISSN/URL) from their source text, verifies
//! them against public registries, and falls back to type-specific search
//! strategies when nothing is embedded.

pub mod analyzer;
pub mod config;
pub mod enrichment;
pub mod error;
pub mod extraction;
pub mod http;
pub mod identifiers;
pub mod sources;
pub mod types;

pub use analyzer::{AnalysisReport, BibliographyAnalyzer, ErrorReport};
pub use config::EnrichConfig;
pub use enrichment::{EnrichedReference, Enrichment, ReferencePipeline, ReferenceState};
pub use error::{BiblioError, Result};
pub use extraction::{GroqExtractor, ReferenceExtraction};
pub use types::{InferredType, RawReference};

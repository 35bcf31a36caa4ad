use std::sync::Arc;

use tracing::debug;

use crate::config::EnrichConfig;
use crate::enrichment::strategies::{
    book_strategy, generic_strategy, journal_strategy, official_document_strategy, thesis_strategy,
    website_strategy,
};
use crate::enrichment::verify::{verify_doi, verify_isbn};
use crate::enrichment::{
    EnrichedReference, Enrichment, FoundIdentifiers, IdentifierEnrichment, Links, ReferenceState,
};
use crate::http::Throttle;
use crate::identifiers::{ExtractedIdentifiers, extract_identifiers};
use crate::sources::{CrossRefSource, DoiOrgResolver, OpenLibrarySource};
use crate::types::{InferredType, RawReference};

/// Sequences the enrichment of a reference batch: one record at a time, an
/// identifier path when the source text carries identifiers, a type-dispatch
/// path otherwise, and a throttle pause between records.
#[derive(Clone)]
pub struct ReferencePipeline {
    crossref: Arc<CrossRefSource>,
    openlibrary: Arc<OpenLibrarySource>,
    doi_org: Arc<DoiOrgResolver>,
    throttle: Throttle,
}

impl ReferencePipeline {
    pub fn new(
        crossref: Arc<CrossRefSource>,
        openlibrary: Arc<OpenLibrarySource>,
        doi_org: Arc<DoiOrgResolver>,
        throttle: Throttle,
    ) -> Self {
        Self {
            crossref,
            openlibrary,
            doi_org,
            throttle,
        }
    }

    pub fn from_config(config: &EnrichConfig) -> Self {
        Self::new(
            Arc::new(CrossRefSource::from_config(config)),
            Arc::new(OpenLibrarySource::from_config(config)),
            Arc::new(DoiOrgResolver::from_config(config)),
            Throttle::new(config.inter_reference_delay()),
        )
    }

    /// Enrich a whole batch. Never drops a record and never aborts on a
    /// single record's registry trouble; output order matches input order.
    pub async fn enrich_batch(&self, references: Vec<RawReference>) -> Vec<EnrichedReference> {
        let total = references.len();
        let mut enriched = Vec::with_capacity(total);

        for (index, reference) in references.into_iter().enumerate() {
            debug!(index, total, title = %reference.title, "enriching reference");
            enriched.push(self.enrich_reference(&reference).await);
            if index + 1 < total {
                self.throttle.pause().await;
            }
        }

        enriched
    }

    pub async fn enrich_reference(&self, reference: &RawReference) -> EnrichedReference {
        let found = extract_identifiers(&reference.source);
        if found.has_any() {
            self.enrich_with_identifiers(reference, found).await
        } else {
            self.enrich_by_type(reference).await
        }
    }

    /// Identifier path. The checks run in a fixed order — DOI, ISBN, ISSN,
    /// URL — and each reassigns `state` only per its own branch's rule; a
    /// later check can overwrite an earlier one's outcome. That sequential
    /// overwrite order is the compatibility contract documented in DESIGN.md.
    async fn enrich_with_identifiers(
        &self,
        reference: &RawReference,
        found: ExtractedIdentifiers,
    ) -> EnrichedReference {
        let mut state = ReferenceState::IdentifierFound;
        let mut note = String::new();
        let mut links = Links::new();
        let mut data = IdentifierEnrichment {
            found: FoundIdentifiers {
                doi: found.doi.as_ref().map(|doi| doi.normalized.clone()),
                isbn: found.isbn.as_ref().map(|isbn| isbn.normalized.clone()),
                issn: found.issn.clone(),
                url: found.url.clone(),
            },
            ..Default::default()
        };

        if let Some(doi) = &found.doi {
            let verdict = verify_doi(&self.crossref, &self.doi_org, doi, reference).await;
            data.doi_valid = Some(verdict.valid);
            data.doi_type = verdict.work_type.clone();
            links.insert("doi".to_string(), doi.resolver_url());

            if verdict.is_book {
                state = ReferenceState::BookWithDoi;
                note = "Book DOI found in source".to_string();
                if verdict
                    .publisher
                    .as_deref()
                    .is_some_and(|publisher| publisher.contains("Springer"))
                {
                    links.insert(
                        "springer".to_string(),
                        format!("https://link.springer.com/book/{}", doi.normalized),
                    );
                }
            } else if matches!(
                verdict.work_type.as_deref(),
                Some("article") | Some("journal-article")
            ) {
                state = ReferenceState::ArticleWithDoi;
                note = "Article DOI found in source".to_string();
                links.insert(
                    "crossref".to_string(),
                    format!("https://api.crossref.org/works/{}", doi.normalized),
                );
            }
        }

        if let Some(isbn) = &found.isbn {
            let verdict = verify_isbn(&self.openlibrary, isbn).await;
            if verdict.found {
                data.isbn_valid = Some(true);
                data.isbn_title = verdict.title;
                data.isbn_publisher = verdict.publisher;
                links.insert(
                    "isbn_search".to_string(),
                    format!("https://isbnsearch.org/isbn/{}", isbn.normalized),
                );
                links.insert(
                    "worldcat".to_string(),
                    format!("https://www.worldcat.org/isbn/{}", isbn.normalized),
                );
                state = ReferenceState::IsbnValidated;
                note = "ISBN verified against the catalog".to_string();
            }
        }

        if let Some(issn) = &found.issn {
            links.insert(
                "issn_portal".to_string(),
                format!("https://portal.issn.org/resource/ISSN/{issn}"),
            );
            if state == ReferenceState::IdentifierFound {
                state = ReferenceState::IssnFound;
            }
        }

        if let Some(url) = &found.url {
            links.insert("direct_url".to_string(), url.clone());
            links.insert(
                "web_archive".to_string(),
                format!("https://web.archive.org/web/*/{url}"),
            );
            if url.contains(".pdf") {
                state = ReferenceState::PdfDocument;
                note = "Direct link to a PDF document".to_string();
            }
        }

        // Supplementary search links follow the inferred type regardless of
        // which identifiers matched.
        match reference.inferred_type {
            InferredType::Journal => {
                links.insert(
                    "google_scholar".to_string(),
                    format!(
                        "https://scholar.google.com/scholar?q={}",
                        urlencoding::encode(&format!(
                            "\"{}\" {}",
                            reference.title, reference.author
                        ))
                    ),
                );
                let title_prefix: String = reference.title.chars().take(100).collect();
                links.insert(
                    "scielo".to_string(),
                    format!(
                        "https://search.scielo.org/?q={}&lang=es",
                        urlencoding::encode(&title_prefix)
                    ),
                );
            }
            InferredType::Book => {
                links.insert(
                    "google_books".to_string(),
                    format!(
                        "https://www.google.com/search?tbm=bks&q={}",
                        urlencoding::encode(&reference.title)
                    ),
                );
                links.insert(
                    "openlibrary".to_string(),
                    format!(
                        "https://openlibrary.org/search?q={}",
                        urlencoding::encode(&reference.title)
                    ),
                );
            }
            _ => {}
        }

        if note.is_empty() {
            note = "Identifier found in source".to_string();
        }

        EnrichedReference {
            reference: reference.clone(),
            resolved_type: reference.inferred_type.label().to_string(),
            enrichment: Enrichment::Identifier(data),
            links,
            state,
            note,
        }
    }

    async fn enrich_by_type(&self, reference: &RawReference) -> EnrichedReference {
        match reference.inferred_type {
            InferredType::Journal => journal_strategy(&self.crossref, reference).await,
            InferredType::Book => book_strategy(&self.openlibrary, reference).await,
            InferredType::OfficialDocument => official_document_strategy(reference),
            InferredType::Website => website_strategy(reference),
            InferredType::Thesis => thesis_strategy(reference),
            InferredType::Other(_) => generic_strategy(reference),
        }
    }
}

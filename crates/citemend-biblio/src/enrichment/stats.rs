use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::enrichment::strategies::is_latin_american_journal;
use crate::enrichment::{EnrichedReference, Enrichment};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdentifierCounts {
    pub total: usize,
    pub doi: usize,
    pub isbn: usize,
    pub issn: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Statistics {
    pub total_references: usize,
    pub by_type: BTreeMap<String, usize>,
    pub by_state: BTreeMap<String, usize>,
    pub identifiers_found: IdentifierCounts,
    pub success_percentage: u32,
}

/// Pure summary of an enriched batch: identical input yields identical
/// output, however many times it runs.
pub fn compute_statistics(references: &[EnrichedReference]) -> Statistics {
    let total = references.len();

    let mut by_type: BTreeMap<String, usize> = BTreeMap::new();
    let mut by_state: BTreeMap<String, usize> = BTreeMap::new();
    for reference in references {
        *by_type.entry(reference.resolved_type.clone()).or_default() += 1;
        *by_state
            .entry(reference.state.label().to_string())
            .or_default() += 1;
    }

    let with_identifiers = references
        .iter()
        .filter(|r| r.has_any_identifier())
        .count();
    let identifiers_found = IdentifierCounts {
        total: with_identifiers,
        doi: references
            .iter()
            .filter(|r| r.enrichment.doi().is_some())
            .count(),
        isbn: references
            .iter()
            .filter(|r| r.enrichment.isbn().is_some())
            .count(),
        issn: references
            .iter()
            .filter(|r| r.enrichment.issn().is_some())
            .count(),
    };

    let success_percentage = if total > 0 {
        (100.0 * with_identifiers as f64 / total as f64).round() as u32
    } else {
        0
    };

    Statistics {
        total_references: total,
        by_type,
        by_state,
        identifiers_found,
        success_percentage,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Recommendation {
    pub category: String,
    pub message: String,
    pub action: String,
}

impl Recommendation {
    fn new(category: &str, message: &str, action: &str) -> Self {
        Self {
            category: category.to_string(),
            message: message.to_string(),
            action: action.to_string(),
        }
    }
}

/// Advisory notes over the whole batch. Conditions are evaluated in a fixed
/// order; when none matches, a single generic advisory is emitted.
pub fn generate_recommendations(references: &[EnrichedReference]) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    let has_official_documents = references
        .iter()
        .any(|r| matches!(r.enrichment, Enrichment::OfficialDocument(_)));
    if has_official_documents {
        recommendations.push(Recommendation::new(
            "official_documents",
            "Official and legal documents carry no ISSN/ISBN. Verify them against government sources.",
            "Consult official gazettes or government portals.",
        ));
    }

    let has_latin_american_journals = references.iter().any(|r| {
        matches!(r.enrichment, Enrichment::Journal(_) | Enrichment::Identifier(_))
            && r.reference.inferred_type == crate::types::InferredType::Journal
            && is_latin_american_journal(&r.reference)
    });
    if has_latin_american_journals {
        recommendations.push(Recommendation::new(
            "latin_american_journals",
            "For Latin-American journals use SciELO, Redalyc and Latindex.",
            "Search https://search.scielo.org and https://www.redalyc.org",
        ));
    }

    let has_books_without_isbn = references.iter().any(|r| {
        matches!(&r.enrichment, Enrichment::Book(data) if data.isbn.is_none())
    });
    if has_books_without_isbn {
        recommendations.push(Recommendation::new(
            "books_without_isbn",
            "Some books have no registered ISBN, typically local or old editions.",
            "Search national library catalogs, e.g. https://www.bnv.gob.ve/",
        ));
    }

    if recommendations.is_empty() {
        recommendations.push(Recommendation::new(
            "general",
            "All references were processed successfully.",
            "Check the links provided with each reference.",
        ));
    }

    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrichment::{
        BookEnrichment, EnrichedReference, FoundIdentifiers, IdentifierEnrichment, Links,
        OfficialDocEnrichment, OfficialDocKind, ReferenceState,
    };
    use crate::types::{InferredType, RawReference};

    fn enriched(
        resolved_type: &str,
        state: ReferenceState,
        enrichment: Enrichment,
        reference: RawReference,
    ) -> EnrichedReference {
        EnrichedReference {
            reference,
            resolved_type: resolved_type.to_string(),
            enrichment,
            links: Links::new(),
            state,
            note: String::new(),
        }
    }

    fn with_doi() -> EnrichedReference {
        enriched(
            "book",
            ReferenceState::BookWithDoi,
            Enrichment::Identifier(IdentifierEnrichment {
                found: FoundIdentifiers {
                    doi: Some("10.1007/978-3-030-02083-5".to_string()),
                    ..Default::default()
                },
                ..Default::default()
            }),
            RawReference::default(),
        )
    }

    fn book_without_isbn() -> EnrichedReference {
        enriched(
            "book",
            ReferenceState::BookProcessed,
            Enrichment::Book(BookEnrichment::default()),
            RawReference {
                inferred_type: InferredType::Book,
                ..Default::default()
            },
        )
    }

    fn gazette() -> EnrichedReference {
        enriched(
            "gaceta_oficial",
            ReferenceState::OfficialDocument,
            Enrichment::OfficialDocument(OfficialDocEnrichment {
                subtype: OfficialDocKind::GacetaOficial,
                entity: Some("Venezuela".to_string()),
            }),
            RawReference {
                inferred_type: InferredType::OfficialDocument,
                ..Default::default()
            },
        )
    }

    #[test]
    fn statistics_count_types_states_and_identifiers() {
        let batch = vec![with_doi(), book_without_isbn(), gazette()];
        let stats = compute_statistics(&batch);

        assert_eq!(stats.total_references, 3);
        assert_eq!(stats.by_type.get("book"), Some(&2));
        assert_eq!(stats.by_type.get("gaceta_oficial"), Some(&1));
        assert_eq!(stats.by_state.get("LIBRO_CON_DOI"), Some(&1));
        assert_eq!(stats.identifiers_found.total, 1);
        assert_eq!(stats.identifiers_found.doi, 1);
        assert_eq!(stats.identifiers_found.isbn, 0);
        // 1 of 3 references resolved an identifier.
        assert_eq!(stats.success_percentage, 33);
    }

    #[test]
    fn empty_batch_has_zero_percentage() {
        let stats = compute_statistics(&[]);
        assert_eq!(stats.total_references, 0);
        assert_eq!(stats.success_percentage, 0);
    }

    #[test]
    fn aggregator_is_idempotent() {
        let batch = vec![with_doi(), gazette()];
        assert_eq!(compute_statistics(&batch), compute_statistics(&batch));
        assert_eq!(
            generate_recommendations(&batch),
            generate_recommendations(&batch)
        );
    }

    #[test]
    fn recommendations_follow_fixed_condition_order() {
        let latam_journal = enriched(
            "journal",
            ReferenceState::JournalProcessed,
            Enrichment::Journal(Default::default()),
            RawReference {
                inferred_type: InferredType::Journal,
                journal_name: Some("Revista Venezolana de Gerencia".to_string()),
                ..Default::default()
            },
        );
        let batch = vec![gazette(), latam_journal, book_without_isbn()];
        let recommendations = generate_recommendations(&batch);

        let categories: Vec<&str> = recommendations
            .iter()
            .map(|r| r.category.as_str())
            .collect();
        assert_eq!(
            categories,
            vec![
                "official_documents",
                "latin_american_journals",
                "books_without_isbn"
            ]
        );
    }

    #[test]
    fn clean_batch_gets_the_generic_advisory() {
        let recommendations = generate_recommendations(&[with_doi()]);
        assert_eq!(recommendations.len(), 1);
        assert_eq!(recommendations[0].category, "general");
    }
}

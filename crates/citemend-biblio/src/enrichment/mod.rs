use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::RawReference;

pub mod pipeline;
pub mod stats;
pub mod strategies;
pub mod verify;

pub use pipeline::ReferencePipeline;
pub use stats::{Recommendation, Statistics};

/// Human-follow-up links keyed by label. The label set varies by reference
/// type and outcome.
pub type Links = BTreeMap<String, String>;

/// Processing outcome per reference. The serialized labels are the wire
/// contract consumed by existing clients and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceState {
    #[serde(rename = "IDENTIFICADOR_ENCONTRADO")]
    IdentifierFound,
    #[serde(rename = "LIBRO_CON_DOI")]
    BookWithDoi,
    #[serde(rename = "ARTICULO_CON_DOI")]
    ArticleWithDoi,
    #[serde(rename = "ISBN_VALIDADO")]
    IsbnValidated,
    #[serde(rename = "ISSN_ENCONTRADO")]
    IssnFound,
    #[serde(rename = "DOCUMENTO_PDF")]
    PdfDocument,
    #[serde(rename = "REVISTA_PROCESADA")]
    JournalProcessed,
    #[serde(rename = "REVISTA_IDENTIFICADA")]
    JournalIdentified,
    #[serde(rename = "ARTICULO_ENCONTRADO")]
    ArticleFound,
    #[serde(rename = "LIBRO_PROCESADO")]
    BookProcessed,
    #[serde(rename = "ISBN_ENCONTRADO")]
    IsbnFound,
    #[serde(rename = "DOCUMENTO_OFICIAL")]
    OfficialDocument,
    #[serde(rename = "SITIO_WEB")]
    Website,
    #[serde(rename = "TESIS")]
    Thesis,
    #[serde(rename = "BUSQUEDA_GENERICA")]
    GenericSearch,
}

impl ReferenceState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::IdentifierFound => "IDENTIFICADOR_ENCONTRADO",
            Self::BookWithDoi => "LIBRO_CON_DOI",
            Self::ArticleWithDoi => "ARTICULO_CON_DOI",
            Self::IsbnValidated => "ISBN_VALIDADO",
            Self::IssnFound => "ISSN_ENCONTRADO",
            Self::PdfDocument => "DOCUMENTO_PDF",
            Self::JournalProcessed => "REVISTA_PROCESADA",
            Self::JournalIdentified => "REVISTA_IDENTIFICADA",
            Self::ArticleFound => "ARTICULO_ENCONTRADO",
            Self::BookProcessed => "LIBRO_PROCESADO",
            Self::IsbnFound => "ISBN_ENCONTRADO",
            Self::OfficialDocument => "DOCUMENTO_OFICIAL",
            Self::Website => "SITIO_WEB",
            Self::Thesis => "TESIS",
            Self::GenericSearch => "BUSQUEDA_GENERICA",
        }
    }
}

impl std::fmt::Display for ReferenceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Identifiers the pipeline extracted from the source text, as plain strings
/// for the output record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FoundIdentifiers {
    pub doi: Option<String>,
    pub isbn: Option<String>,
    pub issn: Option<String>,
    pub url: Option<String>,
}

/// Enrichment data produced by the identifier path.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentifierEnrichment {
    pub found: FoundIdentifiers,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doi_valid: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doi_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isbn_valid: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isbn_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isbn_publisher: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JournalEnrichment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registered_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_score: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookEnrichment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified_publisher: Option<String>,
}

/// Official/legal document subtype resolved from the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfficialDocKind {
    GacetaOficial,
    Ley,
    DocumentoInternacional,
    DocumentoOficial,
}

impl OfficialDocKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::GacetaOficial => "gaceta_oficial",
            Self::Ley => "ley",
            Self::DocumentoInternacional => "documento_internacional",
            Self::DocumentoOficial => "documento_oficial",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfficialDocEnrichment {
    pub subtype: OfficialDocKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebsiteEnrichment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Per-classification enrichment data. One variant per processing path, each
/// carrying only its relevant fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Enrichment {
    Identifier(IdentifierEnrichment),
    Journal(JournalEnrichment),
    Book(BookEnrichment),
    OfficialDocument(OfficialDocEnrichment),
    Website(WebsiteEnrichment),
    Thesis,
    Generic,
}

impl Enrichment {
    /// DOI resolved by either path, if any.
    pub fn doi(&self) -> Option<&str> {
        match self {
            Self::Identifier(data) => data.found.doi.as_deref(),
            Self::Journal(data) => data.doi.as_deref(),
            _ => None,
        }
    }

    /// ISBN resolved by either path, if any.
    pub fn isbn(&self) -> Option<&str> {
        match self {
            Self::Identifier(data) => data.found.isbn.as_deref(),
            Self::Book(data) => data.isbn.as_deref(),
            _ => None,
        }
    }

    /// ISSN resolved by either path, if any.
    pub fn issn(&self) -> Option<&str> {
        match self {
            Self::Identifier(data) => data.found.issn.as_deref(),
            Self::Journal(data) => data.issn.as_deref(),
            _ => None,
        }
    }
}

/// Final, immutable output record: the original reference plus everything the
/// pipeline resolved for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedReference {
    #[serde(flatten)]
    pub reference: RawReference,
    #[serde(rename = "type")]
    pub resolved_type: String,
    pub enrichment: Enrichment,
    pub links: Links,
    pub state: ReferenceState,
    pub note: String,
}

impl EnrichedReference {
    pub fn has_any_identifier(&self) -> bool {
        self.enrichment.doi().is_some()
            || self.enrichment.isbn().is_some()
            || self.enrichment.issn().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_labels_keep_wire_values() {
        let json = serde_json::to_string(&ReferenceState::BookWithDoi).unwrap();
        assert_eq!(json, "\"LIBRO_CON_DOI\"");
        let parsed: ReferenceState = serde_json::from_str("\"BUSQUEDA_GENERICA\"").unwrap();
        assert_eq!(parsed, ReferenceState::GenericSearch);
    }

    #[test]
    fn enrichment_serializes_with_kind_tag() {
        let enrichment = Enrichment::Journal(JournalEnrichment {
            issn: Some("1315-9984".to_string()),
            ..Default::default()
        });
        let val = serde_json::to_value(&enrichment).unwrap();
        assert_eq!(val["kind"], "journal");
        assert_eq!(val["issn"], "1315-9984");
    }

    #[test]
    fn identifier_accessors_cover_both_paths() {
        let ident = Enrichment::Identifier(IdentifierEnrichment {
            found: FoundIdentifiers {
                doi: Some("10.1/x".to_string()),
                ..Default::default()
            },
            ..Default::default()
        });
        assert_eq!(ident.doi(), Some("10.1/x"));

        let book = Enrichment::Book(BookEnrichment {
            isbn: Some("9783030020835".to_string()),
            ..Default::default()
        });
        assert_eq!(book.isbn(), Some("9783030020835"));
        assert!(book.doi().is_none());
    }

    #[test]
    fn enriched_reference_flattens_raw_fields() {
        let reference = EnrichedReference {
            reference: RawReference {
                title: "Un título".to_string(),
                ..Default::default()
            },
            resolved_type: "thesis".to_string(),
            enrichment: Enrichment::Thesis,
            links: Links::new(),
            state: ReferenceState::Thesis,
            note: String::new(),
        };
        let val = serde_json::to_value(&reference).unwrap();
        assert_eq!(val["title"], "Un título");
        assert_eq!(val["type"], "thesis");
        assert_eq!(val["state"], "TESIS");
    }
}

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::identifiers::{Doi, Isbn};

// Ordered DOI patterns: bare token first, then host-qualified forms. The
// prefix stripping itself happens in `Doi::parse`.
static DOI_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)\b10\.\d{4,9}/[-._;()/:A-Z0-9]+[A-Z0-9]").unwrap(),
        Regex::new(r"(?i)doi\.org/10\.\d{4,9}/[-._;()/:A-Z0-9]+[A-Z0-9]").unwrap(),
        Regex::new(r"(?i)https?://doi\.org/10\.\d{4,9}/[-._;()/:A-Z0-9]+[A-Z0-9]").unwrap(),
    ]
});

// Ordered ISBN patterns: explicit label, then 978/979-prefixed, then the
// generic 10/13-digit-with-hyphens form.
static ISBN_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)isbn(?:-1[03])?\s*:?\s*([0-9][-0-9\s]{8,18}[0-9X])").unwrap(),
        Regex::new(r"(?i)\b97[89][-\s]?\d{1,5}[-\s]?\d{1,7}[-\s]?\d{1,7}[-\s]?[\dX]\b").unwrap(),
        Regex::new(r"(?i)\b(?:97[89][-\s]?)?\d{1,5}[-\s]?\d{1,7}[-\s]?\d{1,7}[-\s]?[\dX]\b")
            .unwrap(),
    ]
});

static ISSN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b\d{4}-\d{3}[\dX]\b").unwrap());

static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)https?://[^\s<>"]+|www\.[^\s<>"]+"#).unwrap());

/// Identifiers found by scanning the free-text `source` of a citation.
/// Re-derived from raw text on every run; the LLM's own identifier guesses
/// are never trusted over this scan.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExtractedIdentifiers {
    pub doi: Option<Doi>,
    pub isbn: Option<Isbn>,
    pub issn: Option<String>,
    pub url: Option<String>,
}

impl ExtractedIdentifiers {
    pub fn has_any(&self) -> bool {
        self.doi.is_some() || self.isbn.is_some() || self.issn.is_some() || self.url.is_some()
    }
}

/// Pure pattern scan over a citation's source text. All four extractions are
/// independent; absence of a match leaves the field `None`.
pub fn extract_identifiers(source: &str) -> ExtractedIdentifiers {
    ExtractedIdentifiers {
        doi: extract_doi(source),
        isbn: extract_isbn(source),
        issn: ISSN_RE.find(source).map(|m| m.as_str().to_uppercase()),
        url: extract_url(source),
    }
}

fn extract_doi(source: &str) -> Option<Doi> {
    for pattern in DOI_PATTERNS.iter() {
        for m in pattern.find_iter(source) {
            if let Ok(doi) = Doi::parse(m.as_str()) {
                return Some(doi);
            }
        }
    }
    None
}

fn extract_isbn(source: &str) -> Option<Isbn> {
    for pattern in ISBN_PATTERNS.iter() {
        for caps in pattern.captures_iter(source) {
            if let Some(m) = caps.get(1).or_else(|| caps.get(0))
                && let Ok(isbn) = Isbn::parse(m.as_str())
            {
                return Some(isbn);
            }
        }
    }
    None
}

fn extract_url(source: &str) -> Option<String> {
    URL_RE.find(source).map(|m| {
        let url = m.as_str();
        if url.starts_with("http") {
            url.to_string()
        } else {
            format!("https://{url}")
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_doi_url_is_stripped_to_bare_doi() {
        let found =
            extract_identifiers("Springer. https://doi.org/10.1007/978-3-030-02083-5");
        assert_eq!(
            found.doi.as_ref().unwrap().normalized,
            "10.1007/978-3-030-02083-5"
        );
        assert!(found.has_any());
    }

    #[test]
    fn bare_doi_token() {
        let found = extract_identifiers("Nature. 10.1038/s41586-021-03819-2");
        assert_eq!(found.doi.unwrap().normalized, "10.1038/s41586-021-03819-2");
    }

    #[test]
    fn hyphenated_isbn13_loses_hyphens() {
        let found = extract_identifiers("Springer, Cham. 978-3-030-02083-5");
        assert_eq!(found.isbn.unwrap().normalized, "9783030020835");
    }

    #[test]
    fn labeled_isbn_loses_label_and_whitespace() {
        let found = extract_identifiers("Madrid: Alianza. ISBN: 84-206-8304-5");
        assert_eq!(found.isbn.unwrap().normalized, "8420683045");
    }

    #[test]
    fn issn_is_found_but_not_mistaken_for_isbn() {
        let found = extract_identifiers("Revista de Gerencia. ISSN 1315-9984");
        assert_eq!(found.issn.as_deref(), Some("1315-9984"));
        assert!(found.isbn.is_none());
    }

    #[test]
    fn issn_with_x_check_digit_is_uppercased() {
        let found = extract_identifiers("Boletín, ISSN 2027-534x");
        assert_eq!(found.issn.as_deref(), Some("2027-534X"));
    }

    #[test]
    fn bare_www_url_gets_https_scheme() {
        let found = extract_identifiers("Disponible en www.cepal.org/es/informes");
        assert_eq!(found.url.as_deref(), Some("https://www.cepal.org/es/informes"));
    }

    #[test]
    fn explicit_scheme_url_is_kept_verbatim() {
        let found = extract_identifiers("Recuperado de http://www.inei.gob.pe/doc.pdf");
        assert_eq!(found.url.as_deref(), Some("http://www.inei.gob.pe/doc.pdf"));
    }

    #[test]
    fn empty_and_plain_sources_yield_nothing() {
        assert!(!extract_identifiers("").has_any());
        assert!(!extract_identifiers("Fondo de Cultura Económica, México").has_any());
    }

    #[test]
    fn page_ranges_and_volume_numbers_are_not_isbns() {
        let found = extract_identifiers("Revista Venezolana de Gerencia. Vol.11, No. 33, pp. 49-73");
        assert!(found.isbn.is_none());
        assert!(found.doi.is_none());
    }

    #[test]
    fn all_four_identifiers_can_coexist() {
        let found = extract_identifiers(
            "ISSN 0123-4567, ISBN 978-3-16-148410-0, doi:10.1000/182, https://example.org/a",
        );
        assert!(found.doi.is_some());
        assert!(found.isbn.is_some());
        assert!(found.issn.is_some());
        assert!(found.url.is_some());
    }
}

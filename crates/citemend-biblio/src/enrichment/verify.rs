use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use crate::identifiers::{Doi, Isbn};
use crate::sources::crossref::{ArticleMatch, CrossRefSource, JournalRecord};
use crate::sources::doi_org::DoiOrgResolver;
use crate::sources::openlibrary::{OpenLibraryBook, OpenLibrarySource, SearchDoc};
use crate::types::RawReference;

// DOI registrant prefixes that identify book imprints outright. A match here
// classifies the work without any network call.
static BOOK_DOI_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"^10\.1007/978").unwrap(),    // Springer books
        Regex::new(r"^10\.1016/.*book").unwrap(), // Elsevier books
        Regex::new(r"^10\.4324/978").unwrap(),    // Routledge / Taylor & Francis
        Regex::new(r"^10\.1093/acprof").unwrap(), // Oxford Scholarship
    ]
});

const KNOWN_BOOK_PUBLISHERS: &[&str] = &[
    "Springer",
    "Elsevier",
    "Routledge",
    "Oxford University Press",
    "Palgrave Macmillan",
];

static VOLUME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bvol\.?\s*\d+").unwrap());
static ISSUE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:núm|num|no)\.?\s*\d+").unwrap());
static PAGES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bpp\.?\s*\d+.*").unwrap());

pub fn publisher_for_doi_prefix(doi: &Doi) -> Option<&'static str> {
    match doi.prefix() {
        "10.1007" => Some("Springer"),
        "10.1016" => Some("Elsevier"),
        "10.4324" => Some("Routledge/Taylor & Francis"),
        "10.1093" => Some("Oxford University Press"),
        "10.1057" => Some("Palgrave Macmillan"),
        "10.3917" => Some("Presses Universitaires de France"),
        "10.2307" => Some("JSTOR"),
        _ => None,
    }
}

#[derive(Debug, Clone, Default)]
pub struct DoiVerification {
    pub valid: bool,
    pub is_book: bool,
    pub work_type: Option<String>,
    pub publisher: Option<String>,
    pub title: Option<String>,
    pub year: Option<i64>,
}

/// Classify a DOI, degrading gracefully: static prefix table, then the
/// metadata registry, then a publisher-name heuristic, then a bare existence
/// probe. A registry outage downgrades confidence for this one reference
/// only; it never raises.
pub async fn verify_doi(
    crossref: &CrossRefSource,
    resolver: &DoiOrgResolver,
    doi: &Doi,
    reference: &RawReference,
) -> DoiVerification {
    if BOOK_DOI_PATTERNS
        .iter()
        .any(|pattern| pattern.is_match(&doi.normalized))
    {
        return DoiVerification {
            valid: true,
            is_book: true,
            work_type: Some("book".to_string()),
            publisher: publisher_for_doi_prefix(doi).map(ToOwned::to_owned),
            ..Default::default()
        };
    }

    match crossref.fetch_work_by_doi(doi).await {
        Ok(work) => DoiVerification {
            valid: true,
            is_book: work.is_book(),
            work_type: Some(work.work_type),
            publisher: work.publisher,
            title: work.title.into_iter().next(),
            year: work.published_year,
        },
        Err(err) => {
            warn!(doi = %doi.normalized, error = %err, "DOI metadata lookup failed");

            if let Some(publisher) = known_book_publisher(reference) {
                return DoiVerification {
                    valid: true,
                    is_book: true,
                    work_type: Some("probable_book".to_string()),
                    publisher: Some(publisher.to_string()),
                    ..Default::default()
                };
            }

            match resolver.probe(doi).await {
                Ok(true) => DoiVerification {
                    valid: true,
                    is_book: false,
                    work_type: Some("unknown".to_string()),
                    ..Default::default()
                },
                Ok(false) | Err(_) => DoiVerification::default(),
            }
        }
    }
}

fn known_book_publisher(reference: &RawReference) -> Option<&'static str> {
    let publisher = reference.publisher.as_deref().unwrap_or_default();
    KNOWN_BOOK_PUBLISHERS.iter().copied().find(|name| {
        let needle = name.to_lowercase();
        publisher.to_lowercase().contains(&needle)
            || reference.source.to_lowercase().contains(&needle)
    })
}

#[derive(Debug, Clone, Default)]
pub struct IsbnVerification {
    pub found: bool,
    pub title: Option<String>,
    pub publisher: Option<String>,
    pub authors: Vec<String>,
    pub year: Option<String>,
    pub url: Option<String>,
}

/// Look an ISBN up in the book catalog; any failure is a "not found".
pub async fn verify_isbn(openlibrary: &OpenLibrarySource, isbn: &Isbn) -> IsbnVerification {
    match openlibrary.fetch_by_isbn(isbn).await {
        Ok(Some(book)) => isbn_verification_from(book),
        Ok(None) => IsbnVerification::default(),
        Err(err) => {
            warn!(isbn = %isbn.normalized, error = %err, "ISBN lookup failed");
            IsbnVerification::default()
        }
    }
}

fn isbn_verification_from(book: OpenLibraryBook) -> IsbnVerification {
    IsbnVerification {
        found: true,
        title: Some(book.title),
        publisher: book.publisher,
        authors: book.authors,
        year: book.publish_date,
        url: book.url,
    }
}

/// Strip volume/issue/page-range noise a citation drags into the journal
/// name, e.g. "Revista Venezolana de Gerencia. Vol.11, No. 33, pp. 49-73".
pub fn clean_journal_name(name: &str) -> String {
    let cleaned = VOLUME_RE.replace_all(name, "");
    let cleaned = ISSUE_RE.replace_all(&cleaned, "");
    let cleaned = PAGES_RE.replace_all(&cleaned, "");
    cleaned
        .trim_end_matches(|c: char| c == '.' || c == ',' || c.is_whitespace())
        .trim_start()
        .to_string()
}

/// Registry lookup of a journal by (cleaned) name; absent or failing → None.
pub async fn lookup_journal_by_name(
    crossref: &CrossRefSource,
    name: &str,
) -> Option<JournalRecord> {
    let cleaned = clean_journal_name(name);
    if cleaned.is_empty() {
        return None;
    }

    match crossref.lookup_journal(&cleaned).await {
        Ok(record) => record,
        Err(err) => {
            warn!(journal = %cleaned, error = %err, "journal lookup failed");
            None
        }
    }
}

/// Search the works registry for the specific article behind a reference.
pub async fn search_article_for(
    crossref: &CrossRefSource,
    reference: &RawReference,
) -> Option<ArticleMatch> {
    let title: String = reference.title.chars().take(100).collect();
    let query = format!("\"{}\" {}", title, reference.first_author());

    match crossref.search_article(&query).await {
        Ok(found) => found,
        Err(err) => {
            warn!(title = %title, error = %err, "article search failed");
            None
        }
    }
}

/// ISBN search by title/author with a fallback chain: full title plus author,
/// then the title cut at its first period plus author, then the cut title
/// alone. First hit carrying an ISBN wins.
pub async fn search_isbn_by_title(
    openlibrary: &OpenLibrarySource,
    title: &str,
    author: &str,
) -> Option<SearchDoc> {
    let full: String = title.chars().take(100).collect();
    let prefix: String = title
        .split('.')
        .next()
        .unwrap_or(title)
        .chars()
        .take(100)
        .collect();
    let surname = author.split(',').next().unwrap_or_default().trim();

    let mut attempts: Vec<(String, Option<&str>)> = vec![(full.clone(), Some(surname))];
    if prefix != full {
        attempts.push((prefix.clone(), Some(surname)));
    }
    attempts.push((prefix, None));

    for (query_title, query_author) in attempts {
        if query_title.trim().is_empty() {
            continue;
        }
        match openlibrary.search_books(&query_title, query_author, 2).await {
            Ok(docs) => {
                if let Some(doc) = docs.into_iter().find(|doc| doc.isbn.is_some()) {
                    return Some(doc);
                }
            }
            Err(err) => {
                warn!(title = %query_title, error = %err, "ISBN title search failed");
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use mockito::{Matcher, Server};

    use super::*;
    use crate::types::RawReference;

    fn crossref_for(base_url: &str) -> CrossRefSource {
        CrossRefSource::with_params(
            base_url,
            Duration::ZERO,
            Duration::from_secs(2),
            Duration::from_secs(2),
            None,
        )
    }

    fn openlibrary_for(base_url: &str) -> OpenLibrarySource {
        OpenLibrarySource::with_params(base_url, Duration::ZERO, Duration::from_secs(2))
    }

    #[tokio::test]
    async fn springer_book_prefix_classifies_without_network() {
        // No mocks registered: any request against this server would fail the
        // lookup and land in the heuristic path, which this test would catch
        // as a "probable_book" type.
        let server = Server::new_async().await;
        let crossref = crossref_for(&server.url());
        let resolver = DoiOrgResolver::with_params(&server.url(), Duration::from_secs(2));

        let doi = Doi::parse("10.1007/978-3-030-02083-5").unwrap();
        let verdict = verify_doi(&crossref, &resolver, &doi, &RawReference::default()).await;

        assert!(verdict.valid);
        assert!(verdict.is_book);
        assert_eq!(verdict.work_type.as_deref(), Some("book"));
        assert_eq!(verdict.publisher.as_deref(), Some("Springer"));
    }

    #[tokio::test]
    async fn registry_outage_falls_back_to_publisher_heuristic() {
        let mut server = Server::new_async().await;
        let _works = server
            .mock("GET", Matcher::Regex("^/works/.*".into()))
            .with_status(500)
            .create_async()
            .await;

        let crossref = crossref_for(&server.url());
        let resolver = DoiOrgResolver::with_params(&server.url(), Duration::from_secs(2));
        let reference = RawReference {
            source: "Springer International Publishing".to_string(),
            ..Default::default()
        };

        let doi = Doi::parse("10.5555/unclassified.doi").unwrap();
        let verdict = verify_doi(&crossref, &resolver, &doi, &reference).await;

        assert!(verdict.valid);
        assert!(verdict.is_book);
        assert_eq!(verdict.work_type.as_deref(), Some("probable_book"));
    }

    #[tokio::test]
    async fn registry_outage_without_hint_probes_the_resolver() {
        let mut server = Server::new_async().await;
        let _works = server
            .mock("GET", Matcher::Regex("^/works/.*".into()))
            .with_status(500)
            .create_async()
            .await;
        let _head = server
            .mock("HEAD", Matcher::Regex("^/10\\.5555/.*".into()))
            .with_status(302)
            .create_async()
            .await;

        let crossref = crossref_for(&server.url());
        let resolver = DoiOrgResolver::with_params(&server.url(), Duration::from_secs(2));

        let doi = Doi::parse("10.5555/unclassified.doi").unwrap();
        let verdict = verify_doi(&crossref, &resolver, &doi, &RawReference::default()).await;

        assert!(verdict.valid);
        assert!(!verdict.is_book);
        assert_eq!(verdict.work_type.as_deref(), Some("unknown"));
    }

    #[tokio::test]
    async fn everything_down_means_invalid_not_panic() {
        let mut server = Server::new_async().await;
        let _works = server
            .mock("GET", Matcher::Regex("^/works/.*".into()))
            .with_status(500)
            .create_async()
            .await;
        let _head = server
            .mock("HEAD", Matcher::Regex(".*".into()))
            .with_status(503)
            .create_async()
            .await;

        let crossref = crossref_for(&server.url());
        let resolver = DoiOrgResolver::with_params(&server.url(), Duration::from_secs(2));

        let doi = Doi::parse("10.5555/unclassified.doi").unwrap();
        let verdict = verify_doi(&crossref, &resolver, &doi, &RawReference::default()).await;
        assert!(!verdict.valid);
    }

    #[tokio::test]
    async fn isbn_verification_absorbs_failures() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/api/books")
            .match_query(Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let openlibrary = openlibrary_for(&server.url());
        let isbn = Isbn::parse("9783030020835").unwrap();
        let verdict = verify_isbn(&openlibrary, &isbn).await;
        assert!(!verdict.found);
    }

    #[test]
    fn journal_name_cleanup_strips_volume_issue_pages() {
        assert_eq!(
            clean_journal_name("Revista Venezolana de Gerencia. Vol.11, No. 33, pp. 49-73"),
            "Revista Venezolana de Gerencia"
        );
        assert_eq!(clean_journal_name("Comercio Exterior"), "Comercio Exterior");
    }

    #[tokio::test]
    async fn isbn_search_chain_falls_back_to_title_prefix() {
        let mut server = Server::new_async().await;
        // Full title + author: a doc without ISBN.
        let _full = server
            .mock("GET", "/search.json")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded(
                    "title".into(),
                    "El laberinto de la soledad. Edición conmemorativa".into(),
                ),
                Matcher::UrlEncoded("author".into(), "Paz".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"docs": [{"title": "Sin ISBN"}]}"#)
            .create_async()
            .await;
        // Title prefix + author: a doc with ISBN.
        let _prefix = server
            .mock("GET", "/search.json")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("title".into(), "El laberinto de la soledad".into()),
                Matcher::UrlEncoded("author".into(), "Paz".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"docs": [{"title": "El laberinto de la soledad", "isbn": ["9789681603601"]}]}"#,
            )
            .create_async()
            .await;

        let openlibrary = openlibrary_for(&server.url());
        let doc = search_isbn_by_title(
            &openlibrary,
            "El laberinto de la soledad. Edición conmemorativa",
            "Paz, Octavio",
        )
        .await
        .unwrap();
        assert_eq!(doc.isbn.as_deref(), Some("9789681603601"));
    }
}

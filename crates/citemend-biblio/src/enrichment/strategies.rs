use once_cell::sync::Lazy;
use regex::Regex;
use urlencoding::encode;

use crate::enrichment::{
    BookEnrichment, EnrichedReference, Enrichment, JournalEnrichment, Links, OfficialDocEnrichment,
    OfficialDocKind, ReferenceState, WebsiteEnrichment,
};
use crate::enrichment::verify::{lookup_journal_by_name, search_article_for, search_isbn_by_title};
use crate::sources::crossref::CrossRefSource;
use crate::sources::openlibrary::OpenLibrarySource;
use crate::types::RawReference;

/// Keywords marking a journal as Latin-American; matched as case-insensitive
/// substrings of `journal_name + " " + source`.
pub const LATIN_AMERICAN_KEYWORDS: &[&str] = &[
    "venezolana",
    "latino",
    "ibero",
    "mexicana",
    "colombiana",
    "argentina",
    "chilena",
    "peruana",
    "ecuatoriana",
    "española",
    "iberoamericana",
    "iberoamérica",
];

static INTERNATIONAL_BODY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(ONU|UNESCO|FAO|CEPAL)\b").unwrap());

static SOURCE_URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"https?://[^\s<>"]+"#).unwrap());

pub fn is_latin_american_journal(reference: &RawReference) -> bool {
    let haystack = format!(
        "{} {}",
        reference.journal_name.as_deref().unwrap_or_default(),
        reference.source
    )
    .to_lowercase();
    LATIN_AMERICAN_KEYWORDS
        .iter()
        .any(|keyword| haystack.contains(keyword))
}

pub async fn journal_strategy(
    crossref: &CrossRefSource,
    reference: &RawReference,
) -> EnrichedReference {
    let mut data = JournalEnrichment::default();
    let mut links = Links::new();
    let mut state = ReferenceState::JournalProcessed;

    if let Some(journal_name) = reference.journal_name.as_deref()
        && let Some(record) = lookup_journal_by_name(crossref, journal_name).await
    {
        if let Some(issn) = &record.issn {
            links.insert(
                "issn_portal".to_string(),
                format!("https://portal.issn.org/resource/ISSN/{issn}"),
            );
        }
        data.issn = record.issn;
        data.registered_name = record.title;
        state = ReferenceState::JournalIdentified;
    }

    if let Some(article) = search_article_for(crossref, reference).await {
        links.insert("doi".to_string(), article.doi.resolver_url());
        links.insert(
            "crossref".to_string(),
            format!("https://api.crossref.org/works/{}", article.doi.normalized),
        );
        data.doi = Some(article.doi.normalized);
        data.match_score = Some(article.score);
        state = ReferenceState::ArticleFound;
    }

    links.insert("google_scholar".to_string(), scholar_link(reference));
    links.insert(
        "scielo".to_string(),
        format!(
            "https://search.scielo.org/?q={}&lang=es",
            encode(&title_prefix(reference, 100))
        ),
    );
    links.insert(
        "redalyc".to_string(),
        format!(
            "https://www.redalyc.org/resultados?q={}",
            encode(
                reference
                    .journal_name
                    .as_deref()
                    .unwrap_or(&title_prefix(reference, 50))
            )
        ),
    );

    if is_latin_american_journal(reference) {
        links.insert(
            "latindex".to_string(),
            format!(
                "https://www.latindex.org/latindex/buscarRevistas?termino={}",
                encode(reference.journal_name.as_deref().unwrap_or_default())
            ),
        );
    }

    let note = match state {
        ReferenceState::ArticleFound => "Article located in CrossRef",
        _ => "Search manually using the provided links",
    };

    build(
        reference,
        reference.inferred_type.label().to_string(),
        Enrichment::Journal(data),
        links,
        state,
        note,
    )
}

pub async fn book_strategy(
    openlibrary: &OpenLibrarySource,
    reference: &RawReference,
) -> EnrichedReference {
    let mut data = BookEnrichment::default();
    let mut links = Links::new();
    let mut state = ReferenceState::BookProcessed;

    // The extraction stage saw no ISBN in the source; try to find one by
    // title/author before falling back to manual-search links.
    if reference.identifiers.isbn.is_none()
        && let Some(doc) = search_isbn_by_title(openlibrary, &reference.title, &reference.author).await
    {
        data.isbn = doc.isbn;
        data.verified_title = Some(doc.title);
        data.verified_publisher = doc.publisher;
        state = ReferenceState::IsbnFound;
    }

    links.insert(
        "worldcat".to_string(),
        format!(
            "https://www.worldcat.org/search?q={}",
            encode(&format!("\"{}\" {}", reference.title, reference.author))
        ),
    );
    links.insert(
        "google_books".to_string(),
        format!(
            "https://www.google.com/search?tbm=bks&q={}",
            encode(&reference.title)
        ),
    );
    links.insert(
        "openlibrary".to_string(),
        format!("https://openlibrary.org/search?q={}", encode(&reference.title)),
    );

    if let Some(isbn) = &data.isbn {
        links.insert(
            "isbn_search".to_string(),
            format!("https://isbnsearch.org/isbn/{isbn}"),
        );
        links.insert("isbndb".to_string(), format!("https://isbndb.com/book/{isbn}"));
    }

    // Venezuelan imprints and Caracas editions live in the national catalog,
    // not the big international ones.
    let publisher = reference.publisher.as_deref().unwrap_or_default();
    if publisher.contains("Nueva Sociedad") || reference.source.contains("Caracas") {
        links.insert(
            "national_library".to_string(),
            "https://www.bnv.gob.ve/".to_string(),
        );
        links.insert(
            "national_library_catalog".to_string(),
            "https://catalogo.bnv.gob.ve/".to_string(),
        );
    }

    let note = match state {
        ReferenceState::IsbnFound => "ISBN located in the catalog",
        _ => "ISBN not found; search manually",
    };

    build(
        reference,
        reference.inferred_type.label().to_string(),
        Enrichment::Book(data),
        links,
        state,
        note,
    )
}

pub fn official_document_strategy(reference: &RawReference) -> EnrichedReference {
    let (subtype, entity) = classify_official_document(&reference.source);

    let mut links = Links::new();
    links.insert(
        "official_search".to_string(),
        format!(
            "https://www.google.com/search?q={}",
            encode(&format!(
                "\"{}\" {} {}",
                reference.title, reference.author, reference.year
            ))
        ),
    );
    match (subtype, entity.as_deref()) {
        (OfficialDocKind::GacetaOficial, _) => {
            links.insert(
                "official_gazette".to_string(),
                "https://www.imprentanacional.gob.ve/gaceta-oficial/".to_string(),
            );
        }
        (OfficialDocKind::DocumentoInternacional, Some("ONU")) => {
            links.insert(
                "un_library".to_string(),
                "https://digitallibrary.un.org/".to_string(),
            );
        }
        (OfficialDocKind::DocumentoInternacional, Some("FAO")) => {
            links.insert(
                "fao_documents".to_string(),
                "https://www.fao.org/documents/es/".to_string(),
            );
        }
        _ => {}
    }

    build(
        reference,
        subtype.label().to_string(),
        Enrichment::OfficialDocument(OfficialDocEnrichment { subtype, entity }),
        links,
        ReferenceState::OfficialDocument,
        "Official documents carry no ISSN/ISBN. Verify against official sources.",
    )
}

fn classify_official_document(source: &str) -> (OfficialDocKind, Option<String>) {
    if source.contains("Gaceta Oficial") {
        (OfficialDocKind::GacetaOficial, Some("Venezuela".to_string()))
    } else if source.contains("Ley") {
        (OfficialDocKind::Ley, None)
    } else if let Some(m) = INTERNATIONAL_BODY_RE.find(source) {
        (
            OfficialDocKind::DocumentoInternacional,
            Some(m.as_str().to_string()),
        )
    } else {
        (OfficialDocKind::DocumentoOficial, None)
    }
}

pub fn website_strategy(reference: &RawReference) -> EnrichedReference {
    let url = SOURCE_URL_RE
        .find(&reference.source)
        .map(|m| m.as_str().to_string());

    let mut links = Links::new();
    if let Some(url) = &url {
        links.insert("direct_url".to_string(), url.clone());
        links.insert(
            "web_archive".to_string(),
            format!("https://web.archive.org/web/*/{url}"),
        );
        links.insert(
            "google_cache".to_string(),
            format!(
                "https://webcache.googleusercontent.com/search?q=cache:{}",
                encode(url)
            ),
        );
    }
    links.insert(
        "web_search".to_string(),
        format!(
            "https://www.google.com/search?q={}",
            encode(&format!("\"{}\" {}", reference.title, reference.author))
        ),
    );

    let note = if url.is_some() {
        "Check whether the URL is still reachable"
    } else {
        "No URL found in the source text"
    };

    build(
        reference,
        reference.inferred_type.label().to_string(),
        Enrichment::Website(WebsiteEnrichment { url }),
        links,
        ReferenceState::Website,
        note,
    )
}

pub fn thesis_strategy(reference: &RawReference) -> EnrichedReference {
    let mut links = Links::new();
    links.insert(
        "google_scholar".to_string(),
        format!(
            "https://scholar.google.com/scholar?q={}",
            encode(&format!("\"{}\" tesis {}", reference.title, reference.author))
        ),
    );
    links.insert(
        "worldcat_thesis".to_string(),
        format!(
            "https://www.worldcat.org/search?q={}",
            encode(&format!("\"{}\" thesis", reference.title))
        ),
    );
    links.insert("proquest".to_string(), "https://www.proquest.com/".to_string());
    links.insert(
        "cybertesis".to_string(),
        "https://cybertesis.unmsm.edu.pe/".to_string(),
    );

    build(
        reference,
        reference.inferred_type.label().to_string(),
        Enrichment::Thesis,
        links,
        ReferenceState::Thesis,
        "Theses rarely carry an ISSN/ISBN. Search university repositories.",
    )
}

pub fn generic_strategy(reference: &RawReference) -> EnrichedReference {
    let mut links = Links::new();
    links.insert("google_scholar".to_string(), scholar_link(reference));
    links.insert(
        "web_search".to_string(),
        format!(
            "https://www.google.com/search?q={}",
            encode(&format!(
                "{} {} {}",
                reference.title, reference.author, reference.year
            ))
        ),
    );
    links.insert(
        "worldcat".to_string(),
        format!("https://www.worldcat.org/search?q={}", encode(&reference.title)),
    );
    links.insert(
        "crossref_search".to_string(),
        format!(
            "https://search.crossref.org/?q={}",
            encode(&title_prefix(reference, 100))
        ),
    );

    build(
        reference,
        reference.inferred_type.label().to_string(),
        Enrichment::Generic,
        links,
        ReferenceState::GenericSearch,
        "Unspecific type. Use the links for a general search.",
    )
}

fn scholar_link(reference: &RawReference) -> String {
    format!(
        "https://scholar.google.com/scholar?q={}",
        encode(&format!("\"{}\" {}", reference.title, reference.author))
    )
}

fn title_prefix(reference: &RawReference, max_chars: usize) -> String {
    reference.title.chars().take(max_chars).collect()
}

fn build(
    reference: &RawReference,
    resolved_type: String,
    enrichment: Enrichment,
    links: Links,
    state: ReferenceState,
    note: &str,
) -> EnrichedReference {
    EnrichedReference {
        reference: reference.clone(),
        resolved_type,
        enrichment,
        links,
        state,
        note: note.to_string(),
    }
}

use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::EnrichConfig;
use crate::error::{BiblioError, Result};
use crate::http::RateLimitedClient;
use crate::identifiers::Isbn;

const BASE_URL: &str = "https://openlibrary.org";

pub struct OpenLibrarySource {
    client: RateLimitedClient,
    base_url: String,
}

impl OpenLibrarySource {
    pub fn new() -> Self {
        Self::with_params(BASE_URL, Duration::from_millis(500), Duration::from_secs(4))
    }

    pub fn from_config(config: &EnrichConfig) -> Self {
        Self::with_params(BASE_URL, Duration::from_millis(500), config.isbn_timeout())
    }

    pub fn with_params(base_url: &str, min_interval: Duration, timeout: Duration) -> Self {
        Self {
            client: RateLimitedClient::new(min_interval, 1, timeout, "citemend/0.1"),
            base_url: base_url.to_string(),
        }
    }

    /// Book record behind an ISBN, or `None` when the catalog has no entry.
    pub async fn fetch_by_isbn(&self, isbn: &Isbn) -> Result<Option<OpenLibraryBook>> {
        let bibkey = format!("ISBN:{}", isbn.normalized);

        let mut url = parse_base_url(&self.base_url)?;
        url.set_path("/api/books");
        url.query_pairs_mut()
            .append_pair("bibkeys", &bibkey)
            .append_pair("format", "json")
            .append_pair("jscmd", "data");

        let val: Value = self.client.get_json(url.as_str()).await?;
        Ok(val.get(&bibkey).map(OpenLibraryBook::from_json))
    }

    /// Catalog search by title (and optionally author surname). Returns the
    /// raw result docs; callers pick what they need from them.
    pub async fn search_books(
        &self,
        title: &str,
        author: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SearchDoc>> {
        let mut url = parse_base_url(&self.base_url)?;
        url.set_path("/search.json");
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("title", title);
            if let Some(author) = author.filter(|a| !a.is_empty()) {
                pairs.append_pair("author", author);
            }
            pairs.append_pair("limit", &limit.to_string());
        }

        let val: Value = self.client.get_json(url.as_str()).await?;
        Ok(val["docs"]
            .as_array()
            .map(|docs| docs.iter().map(SearchDoc::from_json).collect())
            .unwrap_or_default())
    }
}

impl Default for OpenLibrarySource {
    fn default() -> Self {
        Self::new()
    }
}

/// One record from the `/api/books` data endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OpenLibraryBook {
    pub title: String,
    pub authors: Vec<String>,
    pub publisher: Option<String>,
    pub publish_date: Option<String>,
    pub url: Option<String>,
}

impl OpenLibraryBook {
    pub fn from_json(v: &Value) -> Self {
        let title = v["title"].as_str().unwrap_or_default().to_string();

        let authors = v["authors"]
            .as_array()
            .map(|arr| {
                arr.iter()
                    .filter_map(|item| item["name"].as_str())
                    .map(ToOwned::to_owned)
                    .collect()
            })
            .unwrap_or_default();

        let publisher = v["publishers"]
            .as_array()
            .and_then(|arr| arr.first())
            .and_then(|item| item["name"].as_str().or_else(|| item.as_str()))
            .map(ToOwned::to_owned);

        let publish_date = v["publish_date"].as_str().map(ToOwned::to_owned);

        let url = v["url"].as_str().map(|raw| {
            if raw.starts_with("http") {
                raw.to_string()
            } else {
                format!("https://openlibrary.org{raw}")
            }
        });

        Self {
            title,
            authors,
            publisher,
            publish_date,
            url,
        }
    }
}

/// One doc from the `/search.json` endpoint. The `isbn` field there is
/// sometimes a list and sometimes a single string; both are handled.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchDoc {
    pub title: String,
    pub isbn: Option<String>,
    pub author_names: Vec<String>,
    pub publisher: Option<String>,
    pub first_publish_year: Option<i64>,
}

impl SearchDoc {
    pub fn from_json(v: &Value) -> Self {
        let isbn = match &v["isbn"] {
            Value::Array(arr) => arr.first().and_then(Value::as_str).map(ToOwned::to_owned),
            Value::String(s) => Some(s.clone()),
            _ => None,
        };

        Self {
            title: v["title"].as_str().unwrap_or_default().to_string(),
            isbn,
            author_names: v["author_name"]
                .as_array()
                .map(|arr| {
                    arr.iter()
                        .filter_map(Value::as_str)
                        .map(ToOwned::to_owned)
                        .collect()
                })
                .unwrap_or_default(),
            publisher: v["publisher"]
                .as_array()
                .and_then(|arr| arr.first())
                .and_then(Value::as_str)
                .map(ToOwned::to_owned),
            first_publish_year: v["first_publish_year"].as_i64(),
        }
    }
}

fn parse_base_url(base_url: &str) -> Result<Url> {
    Url::parse(base_url).map_err(|e| BiblioError::Parse(format!("invalid URL {base_url}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn test_source(base_url: &str) -> OpenLibrarySource {
        OpenLibrarySource::with_params(base_url, Duration::ZERO, Duration::from_secs(2))
    }

    #[tokio::test]
    async fn fetch_by_isbn_parses_data_record() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/api/books")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("bibkeys".into(), "ISBN:9783030020835".into()),
                Matcher::UrlEncoded("format".into(), "json".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "ISBN:9783030020835": {
                        "title": "Industry 4.0 and Engineering for a Sustainable Future",
                        "authors": [{"name": "Mohammad Dastbaz"}],
                        "publishers": [{"name": "Springer"}],
                        "publish_date": "2019",
                        "url": "https://openlibrary.org/books/OL27377959M"
                    }
                }"#,
            )
            .create_async()
            .await;

        let source = test_source(&server.url());
        let isbn = Isbn::parse("978-3-030-02083-5").unwrap();
        let book = source.fetch_by_isbn(&isbn).await.unwrap().unwrap();

        assert_eq!(book.publisher.as_deref(), Some("Springer"));
        assert_eq!(book.authors, vec!["Mohammad Dastbaz".to_string()]);
    }

    #[tokio::test]
    async fn fetch_by_isbn_with_empty_body_is_none() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/api/books")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("{}")
            .create_async()
            .await;

        let source = test_source(&server.url());
        let isbn = Isbn::parse("9783030020835").unwrap();
        assert!(source.fetch_by_isbn(&isbn).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn search_handles_list_valued_isbn_field() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/search.json")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("title".into(), "El laberinto de la soledad".into()),
                Matcher::UrlEncoded("author".into(), "Paz".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "docs": [
                        {
                            "title": "El laberinto de la soledad",
                            "isbn": ["9789681603601", "9681603605"],
                            "author_name": ["Octavio Paz"],
                            "publisher": ["Fondo de Cultura Económica"],
                            "first_publish_year": 1950
                        }
                    ]
                }"#,
            )
            .create_async()
            .await;

        let source = test_source(&server.url());
        let docs = source
            .search_books("El laberinto de la soledad", Some("Paz"), 2)
            .await
            .unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].isbn.as_deref(), Some("9789681603601"));
        assert_eq!(docs[0].first_publish_year, Some(1950));
    }
}

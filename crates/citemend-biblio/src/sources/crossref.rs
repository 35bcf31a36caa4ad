use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::EnrichConfig;
use crate::error::{BiblioError, Result};
use crate::http::RateLimitedClient;
use crate::identifiers::Doi;

const BASE_URL: &str = "https://api.crossref.org";

pub struct CrossRefSource {
    client: RateLimitedClient,
    base_url: String,
    search_timeout: Duration,
}

impl CrossRefSource {
    pub fn new(polite_email: Option<String>) -> Self {
        Self::with_params(
            BASE_URL,
            Duration::from_millis(100),
            Duration::from_secs(4),
            Duration::from_secs(5),
            polite_email,
        )
    }

    pub fn from_config(config: &EnrichConfig) -> Self {
        Self::with_params(
            BASE_URL,
            Duration::from_millis(100),
            config.doi_timeout(),
            config.search_timeout(),
            config.polite_email.clone(),
        )
    }

    pub fn with_params(
        base_url: &str,
        min_interval: Duration,
        timeout: Duration,
        search_timeout: Duration,
        polite_email: Option<String>,
    ) -> Self {
        let user_agent = match &polite_email {
            Some(email) => format!("citemend/0.1 (mailto:{email})"),
            None => "citemend/0.1".to_string(),
        };

        Self {
            client: RateLimitedClient::new(min_interval, 1, timeout, &user_agent),
            base_url: base_url.to_string(),
            search_timeout,
        }
    }

    /// Fetch the work record behind a DOI.
    pub async fn fetch_work_by_doi(&self, doi: &Doi) -> Result<CrossRefWork> {
        let url = format!("{}/works/{}", self.base_url, doi.normalized);
        let val: Value = self.client.get_json(&url).await?;
        CrossRefWork::from_json(&val["message"])
    }

    /// Top journal match for a (cleaned) journal name, if any.
    pub async fn lookup_journal(&self, name: &str) -> Result<Option<JournalRecord>> {
        let mut url = parse_base_url(&self.base_url)?;
        url.set_path("/journals");
        url.query_pairs_mut()
            .append_pair("query", name)
            .append_pair("rows", "1");

        let val: Value = self.client.get_json(url.as_str()).await?;
        let Some(item) = val["message"]["items"]
            .as_array()
            .and_then(|items| items.first())
        else {
            return Ok(None);
        };

        Ok(Some(JournalRecord {
            issn: item["ISSN"]
                .as_array()
                .and_then(|a| a.first())
                .and_then(Value::as_str)
                .map(ToOwned::to_owned),
            title: item["title"].as_str().map(ToOwned::to_owned),
            publisher: item["publisher"].as_str().map(ToOwned::to_owned),
        }))
    }

    /// Bibliographic search for a specific article; returns the top-ranked
    /// match's DOI and relevance score.
    pub async fn search_article(&self, query: &str) -> Result<Option<ArticleMatch>> {
        let mut url = parse_base_url(&self.base_url)?;
        url.set_path("/works");
        url.query_pairs_mut()
            .append_pair("query", query)
            .append_pair("rows", "2")
            .append_pair("select", "DOI,title,author,score");

        let val: Value = self
            .client
            .get_json_with_timeout(url.as_str(), self.search_timeout)
            .await?;

        let Some(item) = val["message"]["items"]
            .as_array()
            .and_then(|items| items.first())
        else {
            return Ok(None);
        };
        let Some(doi) = item["DOI"].as_str().and_then(|raw| Doi::parse(raw).ok()) else {
            return Ok(None);
        };

        Ok(Some(ArticleMatch {
            doi,
            score: item["score"].as_f64().unwrap_or(0.0),
            title: item["title"]
                .as_array()
                .and_then(|a| a.first())
                .and_then(Value::as_str)
                .map(ToOwned::to_owned),
        }))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossRefWork {
    pub doi: String,
    pub work_type: String,
    pub title: Vec<String>,
    pub publisher: Option<String>,
    pub published_year: Option<i64>,
    pub container_title: Vec<String>,
}

impl CrossRefWork {
    pub fn from_json(v: &Value) -> Result<Self> {
        let doi = v["DOI"]
            .as_str()
            .ok_or_else(|| BiblioError::Parse("missing DOI in CrossRef response".to_string()))?
            .to_string();

        Ok(Self {
            doi,
            work_type: v["type"].as_str().unwrap_or("unknown").to_string(),
            title: string_array(&v["title"]),
            publisher: v["publisher"].as_str().map(ToOwned::to_owned),
            published_year: parse_year(v),
            container_title: string_array(&v["container-title"]),
        })
    }

    /// CrossRef work types that describe a book-shaped publication.
    pub fn is_book(&self) -> bool {
        matches!(self.work_type.as_str(), "book" | "book-chapter" | "monograph")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalRecord {
    pub issn: Option<String>,
    pub title: Option<String>,
    pub publisher: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleMatch {
    pub doi: Doi,
    pub score: f64,
    pub title: Option<String>,
}

fn string_array(v: &Value) -> Vec<String> {
    v.as_array()
        .map(|a| {
            a.iter()
                .filter_map(Value::as_str)
                .map(ToOwned::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

fn parse_year(v: &Value) -> Option<i64> {
    // Date parts look like {"date-parts": [[2017, 6, 12]]}; the year is the
    // first element of the first part.
    v["published-print"]["date-parts"][0][0]
        .as_i64()
        .or_else(|| v["published-online"]["date-parts"][0][0].as_i64())
        .or_else(|| v["published"]["date-parts"][0][0].as_i64())
        .or_else(|| v["issued"]["date-parts"][0][0].as_i64())
}

fn parse_base_url(base_url: &str) -> Result<Url> {
    Url::parse(base_url).map_err(|e| BiblioError::Parse(format!("invalid URL {base_url}: {e}")))
}

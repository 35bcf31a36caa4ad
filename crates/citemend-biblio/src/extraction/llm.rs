use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde_json::{Value, json};
use tracing::warn;

use crate::config::EnrichConfig;
use crate::error::{BiblioError, Result};
use crate::http::RateLimitedClient;
use crate::types::RawReference;

const BASE_URL: &str = "https://api.groq.com";
const MAX_PROMPT_CHARS: usize = 10_000;

// First JSON block embedded in an otherwise free-form model answer.
static JSON_BLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{.*\}|\[.*\]").unwrap());

/// Extraction of structured citation records from bibliography text. The
/// analyzer receives an implementation by injection; nothing in the pipeline
/// holds a process-wide client.
#[async_trait]
pub trait ReferenceExtraction: Send + Sync {
    async fn extract_references(&self, bibliography: &str) -> Result<Vec<RawReference>>;
}

/// Chat-completions extractor against an OpenAI-compatible endpoint.
pub struct GroqExtractor {
    client: RateLimitedClient,
    base_url: String,
    api_key: String,
    model: String,
}

impl GroqExtractor {
    pub fn new(api_key: String, model: String) -> Self {
        Self::with_params(BASE_URL, api_key, model)
    }

    pub fn from_config(config: &EnrichConfig) -> Result<Self> {
        let api_key = config
            .groq_api_key
            .clone()
            .ok_or_else(|| BiblioError::Config("no LLM API key configured".to_string()))?;
        Ok(Self::new(api_key, config.groq_model.clone()))
    }

    pub fn with_params(base_url: &str, api_key: String, model: String) -> Self {
        Self {
            client: RateLimitedClient::new(
                Duration::from_millis(200),
                2,
                Duration::from_secs(60),
                "citemend/0.1",
            ),
            base_url: base_url.to_string(),
            api_key,
            model,
        }
    }

    fn auth_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let value = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|_| BiblioError::Config("LLM API key is not a valid header".to_string()))?;
        headers.insert(AUTHORIZATION, value);
        Ok(headers)
    }
}

#[async_trait]
impl ReferenceExtraction for GroqExtractor {
    async fn extract_references(&self, bibliography: &str) -> Result<Vec<RawReference>> {
        let url = format!("{}/openai/v1/chat/completions", self.base_url);
        let body = json!({
            "model": self.model,
            "messages": [{"role": "user", "content": build_extraction_prompt(bibliography)}],
            "temperature": 0,
            "response_format": {"type": "json_object"},
        });

        let response: Value = self
            .client
            .post_json_with_headers(&url, &body, self.auth_headers()?)
            .await?;

        let content = response["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| {
                BiblioError::Extraction("completion carries no message content".to_string())
            })?;

        Ok(parse_llm_references(content))
    }
}

fn build_extraction_prompt(bibliography: &str) -> String {
    let excerpt: String = bibliography.chars().take(MAX_PROMPT_CHARS).collect();
    format!(
        r#"You are an expert academic librarian. Extract EVERY bibliographic reference from the text below, even very short ones (e.g. just an institution) and ones spanning several lines. Do not invent or translate anything; keep typos as they are.

For each reference identify the author(s) (everything before the publication year), the 4-digit year, the complete title, and the source (everything after the title). Analyze the source to detect the publication type, embedded identifiers (DOI, ISBN, ISSN, URL), journal or publisher name, and volume/issue/pages.

Answer EXCLUSIVELY with JSON of this shape:
{{
  "references": [
    {{
      "author": "", "year": "", "title": "", "source": "",
      "inferred_type": "journal|book|official_document|website|thesis|other",
      "identifiers": {{"doi": null, "isbn": null, "issn": null, "url": null}},
      "journal_name": null, "publisher": null,
      "volume": null, "issue": null, "pages": null
    }}
  ]
}}

TEXT:
{excerpt}"#
    )
}

/// Parse whatever the model answered into reference records. Accepts a bare
/// JSON array, an object with a `references`/`referencias` field, or a JSON
/// block buried in prose; anything unusable yields an empty list.
pub fn parse_llm_references(raw: &str) -> Vec<RawReference> {
    let value = match serde_json::from_str::<Value>(raw) {
        Ok(value) => value,
        Err(_) => {
            let Some(block) = JSON_BLOCK_RE.find(raw) else {
                warn!("no JSON block found in extraction response");
                return Vec::new();
            };
            match serde_json::from_str::<Value>(block.as_str()) {
                Ok(value) => value,
                Err(err) => {
                    warn!(error = %err, "embedded JSON block failed to parse");
                    return Vec::new();
                }
            }
        }
    };

    let items = match &value {
        Value::Array(items) => items.as_slice(),
        Value::Object(map) => map
            .get("references")
            .or_else(|| map.get("referencias"))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default(),
        _ => &[],
    };

    items
        .iter()
        .filter_map(|item| serde_json::from_value::<RawReference>(item.clone()).ok())
        .collect()
}

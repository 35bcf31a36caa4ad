use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{BiblioError, Result};

/// Pipeline configuration. Loaded from `~/.config/citemend/config.toml` when
/// present, then overridden by environment variables; every knob has a
/// default so the pipeline runs with no config file at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichConfig {
    /// Contact email appended to the CrossRef user agent (polite pool).
    pub polite_email: Option<String>,
    /// API key for the LLM extraction endpoint.
    pub groq_api_key: Option<String>,
    /// Chat-completions model used for reference extraction.
    pub groq_model: String,
    /// Pause between consecutive reference enrichments, in milliseconds.
    pub inter_reference_delay_ms: u64,
    /// DOI metadata lookup budget, in seconds.
    pub doi_timeout_secs: u64,
    /// doi.org HEAD probe budget, in seconds.
    pub doi_probe_timeout_secs: u64,
    /// Open Library lookups budget, in seconds.
    pub isbn_timeout_secs: u64,
    /// CrossRef journal lookup budget, in seconds.
    pub journal_timeout_secs: u64,
    /// CrossRef bibliographic search budget, in seconds.
    pub search_timeout_secs: u64,
    /// Include diagnostic detail in top-level error reports.
    pub development: bool,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            polite_email: None,
            groq_api_key: None,
            groq_model: "llama-3.3-70b-versatile".to_string(),
            inter_reference_delay_ms: 300,
            doi_timeout_secs: 4,
            doi_probe_timeout_secs: 3,
            isbn_timeout_secs: 4,
            journal_timeout_secs: 4,
            search_timeout_secs: 5,
            development: false,
        }
    }
}

impl EnrichConfig {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("citemend").join("config.toml"))
    }

    /// Load the config file if it exists, then apply env overrides.
    pub fn load() -> Result<Self> {
        let mut config = match Self::config_path() {
            Some(path) if path.exists() => {
                let raw = std::fs::read_to_string(&path).map_err(|e| {
                    BiblioError::Config(format!("failed to read {}: {e}", path.display()))
                })?;
                toml::from_str(&raw).map_err(|e| {
                    BiblioError::Config(format!("invalid config {}: {e}", path.display()))
                })?
            }
            _ => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Some(email) = env_first(["CITEMEND_POLITE_EMAIL", "POLITE_POOL_EMAIL"]) {
            self.polite_email = Some(email);
        }
        if let Some(key) = env_first(["CITEMEND_GROQ_API_KEY", "GROQ_API_KEY"]) {
            self.groq_api_key = Some(key);
        }
        if let Some(model) = env_first(["CITEMEND_GROQ_MODEL"]) {
            self.groq_model = model;
        }
        if let Some(delay) = env_first(["CITEMEND_DELAY_MS"])
            && let Ok(ms) = delay.parse::<u64>()
        {
            self.inter_reference_delay_ms = ms;
        }
        if env_first(["CITEMEND_DEV"]).as_deref() == Some("1") {
            self.development = true;
        }
    }

    pub fn inter_reference_delay(&self) -> Duration {
        Duration::from_millis(self.inter_reference_delay_ms)
    }

    pub fn doi_timeout(&self) -> Duration {
        Duration::from_secs(self.doi_timeout_secs)
    }

    pub fn doi_probe_timeout(&self) -> Duration {
        Duration::from_secs(self.doi_probe_timeout_secs)
    }

    pub fn isbn_timeout(&self) -> Duration {
        Duration::from_secs(self.isbn_timeout_secs)
    }

    pub fn journal_timeout(&self) -> Duration {
        Duration::from_secs(self.journal_timeout_secs)
    }

    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.search_timeout_secs)
    }
}

fn env_first<const N: usize>(keys: [&str; N]) -> Option<String> {
    keys.into_iter()
        .find_map(|key| std::env::var(key).ok())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

use serde::{Deserialize, Serialize};

use crate::error::{BiblioError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Doi {
    pub raw: String,
    pub normalized: String,
}

impl Doi {
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();

        let stripped = if let Some(s) = input.strip_prefix("https://doi.org/") {
            s
        } else if let Some(s) = input.strip_prefix("http://doi.org/") {
            s
        } else if let Some(s) = input.strip_prefix("https://dx.doi.org/") {
            s
        } else if let Some(s) = input.strip_prefix("http://dx.doi.org/") {
            s
        } else if let Some(s) = input.strip_prefix("doi.org/") {
            s
        } else if let Some(s) = input.strip_prefix("doi:").or_else(|| input.strip_prefix("DOI:")) {
            s.trim_start()
        } else {
            input
        };

        // A DOI is "10.<registrant>/<suffix>" with a non-empty suffix.
        if !stripped.starts_with("10.") {
            return Err(BiblioError::InvalidDoi(input.to_string()));
        }
        let slash = stripped
            .find('/')
            .ok_or_else(|| BiblioError::InvalidDoi(input.to_string()))?;
        if stripped[slash + 1..].is_empty() {
            return Err(BiblioError::InvalidDoi(input.to_string()));
        }

        Ok(Self {
            raw: input.to_string(),
            normalized: stripped.to_lowercase(),
        })
    }

    pub fn resolver_url(&self) -> String {
        format!("https://doi.org/{}", self.normalized)
    }

    /// Registrant prefix, e.g. "10.1007" for "10.1007/978-3-030-02083-5".
    pub fn prefix(&self) -> &str {
        self.normalized
            .split('/')
            .next()
            .unwrap_or(&self.normalized)
    }
}

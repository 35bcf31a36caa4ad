use thiserror::Error;

#[derive(Debug, Error)]
pub enum BiblioError {
    #[error("no bibliography text was provided")]
    EmptyInput,

    #[error("invalid DOI: {0}")]
    InvalidDoi(String),

    #[error("invalid ISBN: {0}")]
    InvalidIsbn(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error from {0}: {1}")]
    ApiError(String, String),

    #[error("rate limit from {0}, retry after {1}s")]
    RateLimit(String, u64),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("reference extraction failed: {0}")]
    Extraction(String),

    #[error("config error: {0}")]
    Config(String),
}

impl BiblioError {
    /// Stable category tag used by the top-level error report.
    pub fn category(&self) -> &'static str {
        match self {
            Self::EmptyInput => "empty_input",
            Self::InvalidDoi(_) => "invalid_doi",
            Self::InvalidIsbn(_) => "invalid_isbn",
            Self::Http(_) => "http",
            Self::ApiError(_, _) => "api",
            Self::RateLimit(_, _) => "rate_limit",
            Self::Parse(_) => "parse",
            Self::Extraction(_) => "extraction",
            Self::Config(_) => "config",
        }
    }
}

pub type Result<T> = std::result::Result<T, BiblioError>;

use serde::{Deserialize, Serialize};

/// Publication type inferred by the extraction stage. Unknown labels are kept
/// verbatim in `Other` so a creative LLM answer still dispatches somewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum InferredType {
    Journal,
    Book,
    OfficialDocument,
    Website,
    Thesis,
    Other(String),
}

impl From<String> for InferredType {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "journal" | "journal_article" | "revista" => Self::Journal,
            "book" | "libro" => Self::Book,
            "official_document" | "law" | "documento_oficial" | "ley" => Self::OfficialDocument,
            "website" | "web" | "sitio_web" => Self::Website,
            "thesis" | "tesis" => Self::Thesis,
            _ => Self::Other(value),
        }
    }
}

impl From<InferredType> for String {
    fn from(value: InferredType) -> Self {
        value.label().to_string()
    }
}

impl InferredType {
    pub fn label(&self) -> &str {
        match self {
            Self::Journal => "journal",
            Self::Book => "book",
            Self::OfficialDocument => "official_document",
            Self::Website => "website",
            Self::Thesis => "thesis",
            Self::Other(raw) if raw.is_empty() => "other",
            Self::Other(raw) => raw,
        }
    }
}

impl Default for InferredType {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

/// Identifiers the extraction stage *claimed* to see. Advisory only: the
/// pipeline re-derives identifiers from the raw source text and treats that
/// scan as authoritative.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmIdentifiers {
    #[serde(default)]
    pub doi: Option<String>,
    #[serde(default)]
    pub isbn: Option<String>,
    #[serde(default)]
    pub issn: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// One citation record as produced by the extraction stage. Every field is
/// defaulted: a low-quality extraction yields empty strings, never a reject.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawReference {
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub inferred_type: InferredType,
    #[serde(default)]
    pub identifiers: LlmIdentifiers,
    #[serde(default)]
    pub journal_name: Option<String>,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub volume: Option<String>,
    #[serde(default)]
    pub issue: Option<String>,
    #[serde(default)]
    pub pages: Option<String>,
}

impl RawReference {
    /// First listed author's surname-ish token, used when building search
    /// queries ("García, M.; López, J." → "García").
    pub fn first_author(&self) -> &str {
        self.author
            .split(',')
            .next()
            .map(str::trim)
            .unwrap_or_default()
    }
}

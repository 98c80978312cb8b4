//! Crate-wide error type (§7). Five kinds: dependency-missing, transient
//! per-item, structural, cancellation, and data-anomaly (recovered locally
//! but still logged through this type at the warning level).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OntologyError {
    /// No LLM client or no worker pool was supplied to a phase that
    /// requires one.
    #[error("required dependency missing: {0}")]
    DependencyMissing(&'static str),

    /// A single work item (one column, one table) failed; the phase
    /// continues without it.
    #[error("item {item} failed: {source}")]
    Transient {
        item: String,
        #[source]
        source: Box<OntologyError>,
    },

    /// The phase as a whole cannot proceed (e.g. cannot list tables/columns).
    #[error("structural failure: {0}")]
    Structural(String),

    /// The scoped cancellation signal was observed.
    #[error("operation cancelled")]
    Cancelled,

    /// Recovered locally (fallback to a default) but worth surfacing.
    #[error("data anomaly: {0}")]
    DataAnomaly(String),

    #[error("LLM API error: {0}")]
    Llm(String),

    #[error("LLM response parsing error: {0}")]
    Parse(String),

    #[error("LLM timeout after {0}s")]
    Timeout(u64),

    #[error("LLM rate limited, retry after {0}s")]
    RateLimited(u64),

    #[error("database error: {0}")]
    Database(#[from] mysql_async::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl OntologyError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            OntologyError::Timeout(_) | OntologyError::RateLimited(_) | OntologyError::Llm(_)
        )
    }

    pub fn item(item: impl Into<String>, source: OntologyError) -> Self {
        OntologyError::Transient { item: item.into(), source: Box::new(source) }
    }
}

pub type Result<T> = std::result::Result<T, OntologyError>;

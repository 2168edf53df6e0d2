//! Error types for litmap-geo
//!
//! Only [`CacheError`] can end a run: a cache that cannot be read back
//! faithfully would hand out ids that collide with persisted ones. Provider
//! failures and empty lookups are reported per city and the run continues.

use thiserror::Error;

/// Geocoding provider errors
///
/// Every variant is transient from the pipeline's point of view.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Request denied: {0}")]
    Denied(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Offline gazetteer loading errors
#[derive(Debug, Error)]
pub enum GazetteerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid gazetteer row at line {line}: {reason}")]
    InvalidRow { line: u64, reason: String },

    #[error("Unsupported delimiter '{0}' (must be a single ASCII character)")]
    Delimiter(char),
}

/// Resolution cache persistence errors
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The persisted cache cannot be trusted
    #[error("Corrupt cache at line {line}: {reason}")]
    Corrupt { line: u64, reason: String },
}

/// Per-city resolution failure (never fatal to a run)
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("No candidates found for '{city}' (reference year {year})")]
    NoCandidatesFound { city: String, year: i32 },

    #[error("Provider failed for '{city}' (reference year {year}): {source}")]
    Provider {
        city: String,
        year: i32,
        #[source]
        source: ProviderError,
    },
}

/// Author dataset adapter errors
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing column '{0}'")]
    MissingColumn(String),
}

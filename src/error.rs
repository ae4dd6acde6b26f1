use thiserror::Error;

/// Failures talking to a data provider.
///
/// These never escape an adapter's public fetch methods; they are logged
/// and turned into an empty page.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("rate limited by {provider}")]
    RateLimited { provider: &'static str },

    #[error("malformed response: {0}")]
    Decode(String),

    #[error("missing credentials for {0}")]
    MissingCredentials(&'static str),
}

/// Failures writing persisted state
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

/// Invalid configuration values
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("watchlist is empty")]
    EmptyWatchlist,

    #[error("SEC request spacing must be at least 150ms, got {0}ms")]
    SecSpacingTooLow(u64),

    #[error("dataset retention must be positive")]
    ZeroRetention,

    #[error("filing lookback must be between 1 and 3650 days, got {0}")]
    InvalidLookback(i64),

    #[error("invalid URL for {field}: {value}")]
    InvalidUrl { field: &'static str, value: String },
}

/// A provider record that cannot be turned into a canonical record
#[derive(Debug, Error, PartialEq)]
pub enum NormalizeError {
    #[error("missing field {0}")]
    MissingField(&'static str),

    #[error("invalid {field}: {value:?}")]
    InvalidValue { field: &'static str, value: String },
}

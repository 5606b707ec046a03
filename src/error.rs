use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} for {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("unexpected search response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("unrecognized category code `{0}` (expected 1, 3, 9 or 12 digits)")]
    UnknownCategory(String),
}

impl SourceError {
    /// Rate limiting, server errors and transport failures are worth another try.
    pub fn is_retryable(&self) -> bool {
        match self {
            SourceError::Request { .. } => true,
            SourceError::Status { status, .. } => {
                status.as_u16() == 429 || status.is_server_error()
            }
            SourceError::Decode(_) | SourceError::UnknownCategory(_) => false,
        }
    }
}

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Missing configuration value [{0}]")]
    MissingConfig(&'static str),
    #[error("Invalid credential: {0}")]
    InvalidCredential(#[from] reqwest::header::InvalidHeaderValue),
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    Http {
        status: u16,
        body: String
    },
    #[error("Malformed response: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Query reported more pages without a cursor")]
    MissingCursor
}

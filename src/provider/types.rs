use thiserror::Error;

/// Failure reported by an injected capability.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("Request to {url} failed with status {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("No {0} connection provided")]
    MissingConnection(String),
}

pub type ProviderResult<T> = Result<T, ProviderError>;

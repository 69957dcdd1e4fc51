use thiserror::Error;

/// Orchestration API errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("ECS returned {status} {code}: {message}")]
    Service {
        status: u16,
        code: String,
        message: String,
    },

    #[error("Invalid response: {0}")]
    InvalidResponse(#[from] serde_json::Error),

    #[error("Request signing failed: {0}")]
    Signing(String),

    #[error("Orchestration API unavailable: {0}")]
    Unavailable(String),
}

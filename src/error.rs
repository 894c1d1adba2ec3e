use reqwest::StatusCode;
use thiserror::Error;

/// Why a `/chat` request did not produce an answer.
///
/// The user only ever sees the fallback message; the variant is kept so the
/// log says what actually went wrong.
#[derive(Debug, Error)]
pub enum RequestFailure {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("endpoint returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("malformed response body: {0}")]
    MalformedBody(#[from] serde_json::Error),
}

impl RequestFailure {
    pub fn kind(&self) -> &'static str {
        match self {
            RequestFailure::Network(_) => "network",
            RequestFailure::Status { .. } => "status",
            RequestFailure::MalformedBody(_) => "malformed_body",
        }
    }
}

use thiserror::Error;

/// Why a single paragraph could not be revised.
///
/// These never leave [`RevisionClient`](super::RevisionClient): a failed
/// paragraph keeps its original text.
#[derive(Error, Debug)]
pub enum RevisionError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed service response: {0}")]
    MalformedResponse(String),

    #[error("service returned empty content")]
    EmptyContent,
}

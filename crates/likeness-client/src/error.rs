//! Matcher client error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("empty frame rejected before upload")]
    EmptyFrame,

    #[error("invalid frame: {0}")]
    InvalidFrame(String),

    #[error("JPEG encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("matcher returned {status}: {body}")]
    RequestFailed { status: u16, body: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

//! Registry client errors.

use thiserror::Error;

/// Errors from registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("authentication required, or the token was rejected")]
    AuthRequired,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unexpected status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },
}

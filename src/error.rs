//! Error handling and custom error types
//!
//! Provides unified error handling across the relay using thiserror. The
//! HTTP layer maps each variant onto a status code in `web`.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    ClientInput(String),

    #[error("Invalid image data: {0}")]
    InvalidImage(String),

    #[error("Request body too large: {0}")]
    PayloadTooLarge(String),

    #[error("Provider not configured: {0}")]
    ProviderConfig(String),

    #[error("Provider request failed: {0}")]
    ProviderRequest(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for failures caused by the caller's input rather than the deployment.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::ClientInput(_) | Error::InvalidImage(_) | Error::PayloadTooLarge(_)
        )
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::ProviderRequest(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

// Error types for the packaging client.

use std::path::PathBuf;

use thiserror::Error;

/// Failures surfaced by [`crate::api::PackagingClient`].
///
/// The first three variants are what the server tells us through status codes;
/// the rest come from getting the request there at all.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The shell named in the request does not exist on the server.
    #[error("Shell not found")]
    ShellNotFound,

    /// The endpoint is not supported by this server version.
    #[error("Feature unavailable on this CloudShell version")]
    FeatureUnavailable,

    /// Any other unsuccessful status. Carries the response body text.
    #[error("{0}")]
    Generic(String),

    #[error("Login failed: {status} - {body}")]
    LoginRejected { status: u16, body: String },

    #[error("Server returned a token that is not a valid header value")]
    InvalidToken,

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to open {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::ShellNotFound)
    }

    pub fn is_feature_unavailable(&self) -> bool {
        matches!(self, ApiError::FeatureUnavailable)
    }
}

/// Configuration errors raised while reading the environment.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a port number, got {value:?}")]
    InvalidPort { var: &'static str, value: String },

    #[error("{var} must be a whole number of seconds, got {value:?}")]
    InvalidTimeout { var: &'static str, value: String },
}

pub type Result<T> = std::result::Result<T, ApiError>;

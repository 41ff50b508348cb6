//! Error types for objdal-core
//!
//! Upstream failures are carried verbatim; the only messages synthesized here
//! are configuration problems and option/result shape mismatches.

use thiserror::Error;

/// Result type alias for objdal operations
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error produced by the underlying storage client
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error types for objdal operations
#[derive(Error, Debug)]
pub enum Error {
    /// Required configuration is missing or the target bucket does not exist
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failure returned by the underlying storage client, passed through unchanged
    #[error(transparent)]
    Upstream(BoxError),

    /// A result lacks a field the caller asked for
    #[error("Missing field: {0}")]
    MissingField(String),

    /// No configuration registered under the requested name
    #[error("Connection not found: {0}")]
    ConnectionNotFound(String),

    /// A request option has a shape the client cannot use
    #[error("Invalid option '{name}': {reason}")]
    InvalidOption { name: String, reason: String },

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl Error {
    /// Wrap a client-side failure without altering it
    pub fn upstream<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Upstream(Box::new(err))
    }

    pub fn invalid_option(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidOption {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error came from the underlying client
    pub const fn is_upstream(&self) -> bool {
        matches!(self, Error::Upstream(_))
    }
}

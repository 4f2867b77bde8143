//! Error types for shapehub-core

use thiserror::Error;

use crate::http::HttpError;

/// Result type alias for shapehub operations
pub type Result<T> = std::result::Result<T, ShapehubError>;

/// Main error type for shapehub operations
#[derive(Error, Debug)]
pub enum ShapehubError {
    /// Catalog service errors
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Host bridge errors
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors outside the bridge (e.g. saving a stencil)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Catalog service errors
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Transport-level failure
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    /// The service answered with something that is not a catalog
    #[error("Decode error: {0}")]
    Decode(String),

    /// Shape or stencil does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Failure injected by the in-memory service
    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

/// Host bridge errors
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Writing to the bridge endpoint failed
    #[error("IO error: {0}")]
    Io(String),

    /// The host refused the payload
    #[error("Rejected by host: {0}")]
    Rejected(String),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("TOML parse error: {0}")]
    Parse(String),

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        CatalogError::Decode(err.to_string())
    }
}

impl From<std::io::Error> for BridgeError {
    fn from(err: std::io::Error) -> Self {
        BridgeError::Io(err.to_string())
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err.to_string())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

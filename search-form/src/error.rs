use thiserror::Error;

#[derive(Error, Debug)]
pub enum FormError {
    #[error("Invalid field name {name:?}: real names must be non-empty and must not contain '{delimiter}'")]
    InvalidFieldName { name: String, delimiter: char },

    #[error("Duplicate field key in synthesized form: {key}")]
    DuplicateFieldKey { key: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Schema fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures reported by a [`crate::SchemaFetcher`] or [`crate::DatasetSource`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Dataset not found: {db_id}")]
    NotFound { db_id: String },

    #[error("Transient IO failure: {0}")]
    TransientIo(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::TransientIo(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FormError>;

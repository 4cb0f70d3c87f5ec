//! Error type for the I/O edges of the crate.
//!
//! The clustering core never fails; only configuration loading, input
//! reading, feed fetching and output writing return [`DigestError`].

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DigestError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("feed {origin}: {message}")]
    Feed { origin: String, message: String },

    #[error("fetching {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl DigestError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DigestError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn feed(origin: impl Into<String>, message: impl Into<String>) -> Self {
        DigestError::Feed {
            origin: origin.into(),
            message: message.into(),
        }
    }

    pub fn http(url: impl Into<String>, source: reqwest::Error) -> Self {
        DigestError::Http {
            url: url.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, DigestError>;

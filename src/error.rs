//! Error types shared by every jar-fetch operation.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(
        "invalid coordinate '{input}': expected 'group:artifact:version' or 'group.artifact:version'"
    )]
    InvalidCoordinateFormat { input: String },

    #[error("repository not found: {name}")]
    RepositoryNotFound { name: String },

    #[error("artifact not found in any repository: {coordinate}")]
    ArtifactNotFound { coordinate: String },

    #[error("decompiler unavailable: {reason}")]
    DecompilerUnavailable { reason: String },

    #[error("CFR decompilation failed: {stderr}")]
    DecompileFailed { stderr: String },

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP error for {url}: {message}")]
    Http { url: String, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid repository URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("could not determine the home directory")]
    HomeDirUnavailable,

    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn http(url: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Http {
            url: url.into(),
            message: message.to_string(),
        }
    }
}

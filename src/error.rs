use std::path::PathBuf;
use thiserror::Error;

/// Every fallible operation in modsync returns this.
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({code}): {description}")]
    Api { code: String, description: String },

    #[error("Request to {url} failed: HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to parse config {path:?}: {source}")]
    Config { path: PathBuf, source: json5::Error },

    #[error("Failed to parse state file {path:?}: {source}")]
    State {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Hash mismatch for {file}: expected {expected}, got {actual}")]
    HashMismatch {
        file: String,
        expected: String,
        actual: String,
    },

    #[error("Refusing to write file named {0:?}")]
    InvalidFileName(String),

    #[error("Input error: {0}")]
    Input(String),

    #[error("Failed to move {path:?} to trash: {source}")]
    Trash { path: PathBuf, source: trash::Error },

    #[error("Failed to persist {0}")]
    Persist(#[from] tempfile::PersistError),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Error::Io {
            path: PathBuf::new(),
            source,
        }
    }
}

/// Attaches a path to IO errors.
pub trait IoContext<T> {
    fn at(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoContext<T> for std::io::Result<T> {
    fn at(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|source| Error::Io {
            path: path.into(),
            source,
        })
    }
}

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("entry '{name}' not found in {}", .location.display())]
    NotFound { location: PathBuf, name: String },
    #[error("{operation} is not supported by the {provider} provider")]
    Unsupported {
        provider: &'static str,
        operation: &'static str,
    },
    #[error("no file provider found for {}", .0.display())]
    NoProvider(PathBuf),
    #[error("invalid path: {0}")]
    InvalidPath(String),
    #[error("archive error: {0}")]
    Archive(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("other error: {0}")]
    Other(String),
}

impl Error {
    pub fn not_found(location: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Error::NotFound {
            location: location.into(),
            name: name.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, Error::Unsupported { .. })
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(io) => Error::Io(io),
            other => Error::Archive(other.to_string()),
        }
    }
}

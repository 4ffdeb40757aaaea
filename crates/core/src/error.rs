use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification of a [`DiscoveryError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    NotFound,
    MalformedBinary,
    DynamicResolution,
    Config,
}

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Unreadable archive {path}: {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },
    #[error("Entry {entry} not found in {artifact}")]
    NotFound { artifact: PathBuf, entry: String },
    #[error("Malformed class file {entry}: {reason}")]
    MalformedBinary { entry: String, reason: String },
    #[error("Could not resolve name of {class_name} from {artifact}: {reason}")]
    DynamicResolution {
        class_name: String,
        artifact: PathBuf,
        reason: String,
    },
    #[error("Configuration error: {0}")]
    Config(String),
}

impl DiscoveryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DiscoveryError::Io { .. } | DiscoveryError::Archive { .. } => ErrorKind::Io,
            DiscoveryError::NotFound { .. } => ErrorKind::NotFound,
            DiscoveryError::MalformedBinary { .. } => ErrorKind::MalformedBinary,
            DiscoveryError::DynamicResolution { .. } => ErrorKind::DynamicResolution,
            DiscoveryError::Config(_) => ErrorKind::Config,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DiscoveryError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn dynamic(
        class_name: &str,
        artifact: impl Into<PathBuf>,
        reason: impl Into<String>,
    ) -> Self {
        DiscoveryError::DynamicResolution {
            class_name: class_name.to_string(),
            artifact: artifact.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for DiscoveryError {
    fn from(err: serde_json::Error) -> Self {
        DiscoveryError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DiscoveryError>;

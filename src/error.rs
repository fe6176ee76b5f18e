//! Error Handling
//!
//! Error type definitions used in hyouji

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Error types for hyouji
///
/// Low-level filesystem and network errors are converted into one of these
/// kinds at the boundary of the component that issued them; raw platform
/// errors never cross a component boundary uncaught.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Permission denied while {context}")]
    PermissionDenied {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration file corrupted: {path} (backed up to {backup})")]
    CorruptedFile { path: PathBuf, backup: PathBuf },

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Network error: {0}")]
    Network(#[source] octocrab::Error),

    #[error("Authentication failed: invalid token")]
    AuthenticationFailed,

    #[error("GitHub API error: {0}")]
    GitHubApi(#[from] octocrab::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Prompt error: {0}")]
    Prompt(#[from] inquire::InquireError),

    #[error("Unexpected error while {context}")]
    Unknown {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Create a new invalid format error
    pub fn invalid_format<S: Into<String>>(message: S) -> Self {
        Error::InvalidFormat(message.into())
    }

    /// Create a new permission denied error
    pub fn permission_denied<S: Into<String>>(context: S, source: std::io::Error) -> Self {
        Error::PermissionDenied {
            context: context.into(),
            source,
        }
    }
}

/// Classify a filesystem error for the given path into a taxonomy kind
///
/// Out-of-space and other uncommon failures fall into [`Error::Unknown`],
/// still carrying the original cause.
pub fn classify_io_error(context: &str, path: &std::path::Path, err: std::io::Error) -> Error {
    match err.kind() {
        std::io::ErrorKind::NotFound => Error::FileNotFound(path.to_path_buf()),
        std::io::ErrorKind::PermissionDenied => Error::PermissionDenied {
            context: format!("{} {}", context, path.display()),
            source: err,
        },
        _ => Error::Unknown {
            context: format!("{} {}", context, path.display()),
            source: err,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_classify_not_found() {
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        match classify_io_error("reading", Path::new("/tmp/x"), err) {
            Error::FileNotFound(path) => assert_eq!(path, Path::new("/tmp/x")),
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn test_classify_permission_denied() {
        let err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        match classify_io_error("writing", Path::new("/etc/x"), err) {
            Error::PermissionDenied { context, .. } => assert!(context.contains("/etc/x")),
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn test_classify_other_is_unknown() {
        let err = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        match classify_io_error("writing", Path::new("/tmp/x"), err) {
            Error::Unknown { .. } => {}
            other => panic!("unexpected kind: {other:?}"),
        }
    }
}

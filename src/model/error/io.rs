use macros::traceable;
use std::path::PathBuf;

traceable! {
    IOError {
        #[no_source]
        #[error("Semaphore has been closed")]
        SemaphoreClosed => tracing::Level::ERROR,

        #[no_source]
        #[error("Path not found: {path:?}")]
        PathNotFound { path: PathBuf } => tracing::Level::WARN,

        #[no_source]
        #[error("Access denied: {path:?}")]
        AccessDenied { path: PathBuf } => tracing::Level::ERROR,

        #[error("Failed to create directory {path:?}: {err}")]
        CreateDirectoryFailed { path: PathBuf } => tracing::Level::ERROR,

        #[error("Failed to read directory {path:?}: {err}")]
        ReadDirectoryFailed { path: PathBuf } => tracing::Level::ERROR,

        #[error("Failed to read file {path:?}: {err}")]
        ReadFileFailed { path: PathBuf } => tracing::Level::ERROR,

        #[error("Failed to copy file from {src:?} to {dst:?}: {err}")]
        CopyFileFailed { src: PathBuf, dst: PathBuf } => tracing::Level::ERROR,

        #[error("Failed to delete directory {path:?}: {err}")]
        DeleteDirectoryFailed { path: PathBuf } => tracing::Level::ERROR,

        #[error("Failed to get file metadata {path:?}: {err}")]
        GetMetadataFailed { path: PathBuf } => tracing::Level::ERROR,

        #[error("Failed to set file metadata {path:?}: {err}")]
        SetMetadataFailed { path: PathBuf } => tracing::Level::ERROR,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IOErrorKind {
    NotFound,
    AccessDenied,
    Other,
}

impl IOError {
    /// Maps OS-level not-found and permission failures to their own variants,
    /// everything else goes through `otherwise`.
    pub fn classify<F>(path: impl Into<PathBuf>, err: std::io::Error, otherwise: F) -> Self
    where
        F: FnOnce(PathBuf, std::io::Error) -> Self,
    {
        let path = path.into();
        match err.kind() {
            std::io::ErrorKind::NotFound => IOError::path_not_found(path),
            std::io::ErrorKind::PermissionDenied => IOError::access_denied(path),
            _ => otherwise(path, err),
        }
    }

    pub fn kind(&self) -> IOErrorKind {
        match self {
            IOError::PathNotFound { .. } => IOErrorKind::NotFound,
            IOError::AccessDenied { .. } => IOErrorKind::AccessDenied,
            _ => IOErrorKind::Other,
        }
    }
}

use std::path::PathBuf;

/// Errors from preparing or injecting a single chunk.
#[derive(Debug, thiserror::Error)]
pub enum PrepareError {
    /// Reading or writing a file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A source map could not be parsed or serialized.
    #[error("invalid source map {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Snippet injection or mapping adjustment failed.
    #[error("injection error: {0}")]
    Inject(#[from] shipmap_inject::InjectError),
}

impl PrepareError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }
}

/// Result alias for preparation operations.
pub type PrepareResult<T> = Result<T, PrepareError>;

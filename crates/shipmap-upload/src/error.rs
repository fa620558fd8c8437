use std::path::PathBuf;

/// Errors from loading an [`UploadConfig`](crate::UploadConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML for this schema.
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Result alias for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors from discovery, upload, release, and cleanup.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// A filesystem operation failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A glob pattern could not be compiled.
    #[error("invalid pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    /// The external transport rejected or failed the upload.
    #[error("transport error: {0}")]
    Transport(String),

    /// A release metadata step failed.
    #[error("release step {step} failed: {reason}")]
    Release { step: String, reason: String },

    /// A blocking helper task could not be joined.
    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl UploadError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result alias for upload operations.
pub type UploadResult<T> = Result<T, UploadError>;

/// Errors from snippet injection and source map adjustment.
#[derive(Debug, thiserror::Error)]
pub enum InjectError {
    /// The `mappings` field contains a character outside the base64 alphabet
    /// or a truncated VLQ sequence.
    #[error("invalid VLQ mapping at byte {position}: {reason}")]
    InvalidVlq { position: usize, reason: String },

    /// The source map is not a JSON object.
    #[error("source map is not a JSON object")]
    NotAnObject,

    /// JSON (de)serialization failure.
    #[error("source map JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias for injection operations.
pub type InjectResult<T> = Result<T, InjectError>;

use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid debug id '{0}': expected 8-4-4-4-12 hex groups")]
    InvalidDebugId(String),

    #[error("invalid hex string: {0}")]
    InvalidHex(String),
}

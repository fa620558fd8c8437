use std::fmt;
use std::sync::Arc;

use tracing::error;

use crate::error::{UploadError, UploadResult};

/// Caller-supplied handler for errors that should not fail the build.
pub trait ErrorHandler: Send + Sync {
    fn handle(&self, error: &UploadError);
}

impl<F> ErrorHandler for F
where
    F: Fn(&UploadError) + Send + Sync,
{
    fn handle(&self, error: &UploadError) {
        self(error)
    }
}

/// Routes recoverable errors to the caller's handler or the default policy.
#[derive(Clone, Default)]
pub struct RecoverableErrors {
    handler: Option<Arc<dyn ErrorHandler>>,
}

impl RecoverableErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_handler(handler: Arc<dyn ErrorHandler>) -> Self {
        Self {
            handler: Some(handler),
        }
    }

    pub fn has_handler(&self) -> bool {
        self.handler.is_some()
    }

    /// Handle `err`.
    ///
    /// An installed handler receives the error and it is swallowed. Without
    /// one the error is logged, and returned only if `throw_by_default`.
    pub fn handle(&self, err: UploadError, throw_by_default: bool) -> UploadResult<()> {
        if let Some(handler) = &self.handler {
            handler.handle(&err);
            return Ok(());
        }
        error!(error = %err, "shipmap step failed");
        if throw_by_default {
            Err(err)
        } else {
            Ok(())
        }
    }
}

impl fmt::Debug for RecoverableErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecoverableErrors")
            .field("has_handler", &self.has_handler())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn transport_error() -> UploadError {
        UploadError::Transport("connection refused".into())
    }

    #[test]
    fn default_policy_reports_and_continues() {
        assert!(RecoverableErrors::new().handle(transport_error(), false).is_ok());
    }

    #[test]
    fn default_policy_can_escalate() {
        let err = RecoverableErrors::new().handle(transport_error(), true).unwrap_err();
        assert!(matches!(err, UploadError::Transport(_)));
    }

    #[test]
    fn handler_receives_and_swallows() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let errors = RecoverableErrors::with_handler(Arc::new(move |e: &UploadError| {
            sink.lock().unwrap().push(e.to_string());
        }));

        assert!(errors.handle(transport_error(), true).is_ok());
        assert_eq!(*seen.lock().unwrap(), vec!["transport error: connection refused"]);
    }
}

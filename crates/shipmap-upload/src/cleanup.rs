use std::path::{Path, PathBuf};

use shipmap_tasks::DependencyTracker;
use tracing::{debug, info, warn};

use crate::discovery::discover_artifacts;
use crate::error::UploadResult;

/// Outcome of the deletion step.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeleteReport {
    pub deleted: Vec<PathBuf>,
    /// Files that matched but could not be removed.
    pub failed: Vec<PathBuf>,
}

/// Delete every file matching `patterns` once no build step still needs the
/// original artifacts.
///
/// The wait is registered right before the patterns are resolved, so steps
/// that acquired a token earlier in the build are always honored. Individual
/// delete failures are logged and reported, never raised.
pub async fn delete_artifacts_after_upload(
    tracker: &DependencyTracker,
    patterns: &[String],
    base_dir: &Path,
) -> UploadResult<DeleteReport> {
    if patterns.is_empty() {
        return Ok(DeleteReport::default());
    }

    tracker.wait_until_clear().await;
    debug!("all artifact dependencies released; deleting");

    let owned = patterns.to_vec();
    let base = base_dir.to_path_buf();
    let matches = tokio::task::spawn_blocking(move || discover_artifacts(&owned, &[], &base)).await??;

    let mut report = DeleteReport::default();
    for path in matches {
        match tokio::fs::remove_file(&path).await {
            Ok(()) => report.deleted.push(path),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to delete artifact");
                report.failed.push(path);
            }
        }
    }
    info!(deleted = report.deleted.len(), failed = report.failed.len(), "artifacts deleted");
    Ok(report)
}

use std::path::{Path, PathBuf};
use std::sync::Arc;

use shipmap_prepare::{ArtifactPreparer, PrepareHooks, PrepareOutcome, SkipReason};
use shipmap_tasks::{DependencyTracker, TaskScheduler};
use shipmap_types::PreparedPair;
use tracing::{info, warn};

use crate::config::UploadConfig;
use crate::discovery::{discover_artifacts, filter_chunks};
use crate::error::{UploadError, UploadResult};
use crate::policy::RecoverableErrors;
use crate::transport::Transport;

/// Prefix of every staging directory name.
pub const STAGING_PREFIX: &str = "shipmap-upload-";

/// Everything one upload call borrows from its owner.
#[derive(Clone, Copy)]
pub struct UploadContext<'a> {
    pub config: &'a UploadConfig,
    pub hooks: &'a PrepareHooks,
    pub tracker: &'a Arc<DependencyTracker>,
    pub transport: &'a dyn Transport,
    pub errors: &'a RecoverableErrors,
    /// Directory that relative patterns are resolved against.
    pub base_dir: &'a Path,
}

/// Metrics of one upload call.
///
/// Staged paths in `prepared` refer to the removed staging directory.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UploadReport {
    pub chunks_found: usize,
    pub prepared: Vec<PreparedPair>,
    pub skipped: Vec<(PathBuf, SkipReason)>,
    /// Total size of the staged bundle in bytes.
    pub staged_bytes: u64,
    /// Whether the transport accepted the bundle.
    pub uploaded: bool,
}

impl UploadReport {
    /// Number of prepared pairs that include a source map.
    pub fn maps(&self) -> usize {
        self.prepared.iter().filter(|p| p.has_map()).count()
    }
}

/// Prepare every discovered chunk into a fresh staging directory and hand it
/// to the transport.
///
/// `build_artifact_paths` is used unless `config.assets` overrides it. The
/// call holds a dependency token for its whole duration. The staging
/// directory is removed and the token released on every path out of this
/// function. Transport failures go through `ctx.errors` and only escalate when
/// `escalate_upload_errors` is set.
pub async fn upload_debug_id_artifacts(ctx: UploadContext<'_>, build_artifact_paths: &[String]) -> UploadResult<UploadReport> {
    let hold = ctx.tracker.hold();

    let patterns = if ctx.config.assets.is_empty() {
        build_artifact_paths.to_vec()
    } else {
        ctx.config.assets.clone()
    };
    let ignore = ctx.config.ignore.clone();
    let base_dir = ctx.base_dir.to_path_buf();
    let candidates = tokio::task::spawn_blocking(move || discover_artifacts(&patterns, &ignore, &base_dir))
        .await??;
    let candidates = filter_chunks(candidates);

    if candidates.is_empty() {
        warn!("no chunks found to upload; check the configured paths and ignore patterns");
        hold.release();
        return Ok(UploadReport::default());
    }

    let staging = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .tempdir()
        .map_err(|e| UploadError::io(std::env::temp_dir(), e))?;
    let staging_path = staging.path().to_path_buf();

    let mut report = UploadReport {
        chunks_found: candidates.len(),
        ..Default::default()
    };
    let preparer = Arc::new(ArtifactPreparer::from_hooks(ctx.hooks));
    let items: Vec<(usize, PathBuf)> = candidates.into_iter().enumerate().collect();
    let dir = staging_path.clone();
    let outcomes = TaskScheduler::new(ctx.config.concurrency)
        .run(items, move |(ordinal, path)| {
            let preparer = Arc::clone(&preparer);
            let dir = dir.clone();
            async move { preparer.prepare(&path, ordinal, &dir).await }
        })
        .await;

    for outcome in outcomes {
        match outcome {
            PrepareOutcome::Prepared(pair) => report.prepared.push(pair),
            PrepareOutcome::Skipped { path, reason } => report.skipped.push((path, reason)),
        }
    }
    report.staged_bytes = staged_size(&report.prepared).await;

    info!(
        chunks = report.chunks_found,
        prepared = report.prepared.len(),
        skipped = report.skipped.len(),
        maps = report.maps(),
        bytes = report.staged_bytes,
        staging = %staging_path.display(),
        "artifact bundle staged"
    );

    let release = ctx.config.release.name.as_deref();
    let dist = ctx.config.release.dist.as_deref();
    let result = match ctx.transport.upload_artifact_bundle(&staging_path, release, dist).await {
        Ok(()) => {
            report.uploaded = true;
            info!(release, dist, files = report.prepared.len() + report.maps(), "artifact bundle uploaded");
            Ok(())
        }
        Err(e) => ctx.errors.handle(e, ctx.config.escalate_upload_errors),
    };

    if let Err(e) = staging.close() {
        warn!(staging = %staging_path.display(), error = %e, "failed to remove staging directory");
    }
    hold.release();

    result.map(|()| report)
}

async fn staged_size(pairs: &[PreparedPair]) -> u64 {
    let mut total = 0;
    for path in pairs
        .iter()
        .flat_map(|p| std::iter::once(&p.chunk_path).chain(p.map_path.as_ref()))
    {
        if let Ok(meta) = tokio::fs::metadata(path).await {
            total += meta.len();
        }
    }
    total
}

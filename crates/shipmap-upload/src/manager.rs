use std::path::{Path, PathBuf};
use std::sync::Arc;

use shipmap_prepare::{ChunkInjector, InjectOutcome, PrepareHooks};
use shipmap_tasks::{DependencyGuard, DependencyTracker, TaskScheduler};
use tracing::{debug, info, warn};

use crate::cleanup::{delete_artifacts_after_upload, DeleteReport};
use crate::config::UploadConfig;
use crate::discovery::{discover_artifacts, filter_chunks};
use crate::error::UploadResult;
use crate::orchestrator::{upload_debug_id_artifacts, UploadContext, UploadReport};
use crate::policy::{ErrorHandler, RecoverableErrors};
use crate::release::{run_release_steps, ReleaseApi, ReleaseStep};
use crate::transport::Transport;

/// Counts from one injection pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InjectReport {
    pub injected: usize,
    pub already_injected: usize,
    pub maps: usize,
    pub failed: usize,
}

/// Per-build owner of every step that touches the build's artifacts.
///
/// One manager holds one [`DependencyTracker`]. Each step takes a hold on it
/// while it reads the original artifacts, and [`delete_artifacts`] waits for
/// all of them to finish.
///
/// [`delete_artifacts`]: BuildPluginManager::delete_artifacts
pub struct BuildPluginManager {
    config: UploadConfig,
    hooks: PrepareHooks,
    tracker: Arc<DependencyTracker>,
    errors: RecoverableErrors,
    transport: Arc<dyn Transport>,
    release_api: Option<Arc<dyn ReleaseApi>>,
    base_dir: PathBuf,
}

impl BuildPluginManager {
    pub fn new(config: UploadConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config,
            hooks: PrepareHooks::default(),
            tracker: Arc::new(DependencyTracker::new()),
            errors: RecoverableErrors::new(),
            transport,
            release_api: None,
            base_dir: std::env::current_dir().unwrap_or_default(),
        }
    }

    pub fn with_hooks(mut self, hooks: PrepareHooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_release_api(mut self, api: Arc<dyn ReleaseApi>) -> Self {
        self.release_api = Some(api);
        self
    }

    pub fn with_error_handler(mut self, handler: Arc<dyn ErrorHandler>) -> Self {
        self.errors = RecoverableErrors::with_handler(handler);
        self
    }

    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    pub fn tracker(&self) -> &Arc<DependencyTracker> {
        &self.tracker
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Register an outside step that reads the original artifacts. Deletion
    /// waits until the returned guard is dropped.
    pub fn create_dependency_on_build_artifacts(&self) -> DependencyGuard {
        self.tracker.hold()
    }

    /// Inject debug IDs into every chunk matched by `paths`, in place.
    ///
    /// Per-chunk failures are logged and counted.
    pub async fn inject_debug_ids(&self, paths: &[String]) -> UploadResult<InjectReport> {
        let _hold = self.tracker.hold();

        let patterns = paths.to_vec();
        let ignore = self.config.ignore.clone();
        let base = self.base_dir.clone();
        let chunks = filter_chunks(tokio::task::spawn_blocking(move || discover_artifacts(&patterns, &ignore, &base)).await??);
        if chunks.is_empty() {
            warn!("no chunks found to inject");
            return Ok(InjectReport::default());
        }

        let injector = Arc::new(ChunkInjector::from_hooks(&self.hooks));
        let results = TaskScheduler::new(self.config.concurrency)
            .run(chunks, move |path| {
                let injector = Arc::clone(&injector);
                async move {
                    let result = injector.inject_file(&path).await;
                    (path, result)
                }
            })
            .await;

        let mut report = InjectReport::default();
        for (path, result) in results {
            match result {
                Ok(InjectOutcome::Injected { map, .. }) => {
                    report.injected += 1;
                    report.maps += usize::from(map.is_some());
                }
                Ok(InjectOutcome::AlreadyInjected(_)) => report.already_injected += 1,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to inject debug ID");
                    report.failed += 1;
                }
            }
        }
        info!(
            injected = report.injected,
            already = report.already_injected,
            maps = report.maps,
            failed = report.failed,
            "debug ID injection finished"
        );
        Ok(report)
    }

    /// Stage and upload the chunks matched by `paths`.
    pub async fn upload_sourcemaps(&self, paths: &[String]) -> UploadResult<UploadReport> {
        let ctx = UploadContext {
            config: &self.config,
            hooks: &self.hooks,
            tracker: &self.tracker,
            transport: self.transport.as_ref(),
            errors: &self.errors,
            base_dir: &self.base_dir,
        };
        upload_debug_id_artifacts(ctx, paths).await
    }

    /// Run the configured release steps. Without a release API this is a
    /// no-op.
    pub async fn create_release(&self) -> UploadResult<Vec<ReleaseStep>> {
        let Some(api) = &self.release_api else {
            debug!("no release API configured; skipping release steps");
            return Ok(Vec::new());
        };
        run_release_steps(api.as_ref(), &self.config.release, &self.tracker, &self.errors).await
    }

    /// Delete `files_to_delete_after_upload` once every hold is released.
    pub async fn delete_artifacts(&self) -> UploadResult<DeleteReport> {
        delete_artifacts_after_upload(
            &self.tracker,
            &self.config.files_to_delete_after_upload,
            &self.base_dir,
        )
        .await
    }
}

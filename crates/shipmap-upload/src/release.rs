use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use shipmap_tasks::DependencyTracker;
use tracing::{debug, info, warn};

use crate::config::{DeployConfig, ReleaseConfig, SetCommitsConfig};
use crate::error::UploadResult;
use crate::policy::RecoverableErrors;

/// Release metadata operations of the error-tracking service.
#[async_trait]
pub trait ReleaseApi: Send + Sync {
    async fn new_release(&self, release: &str) -> UploadResult<()>;
    async fn set_commits(&self, release: &str, options: &SetCommitsConfig) -> UploadResult<()>;
    async fn finalize_release(&self, release: &str) -> UploadResult<()>;
    async fn new_deploy(&self, release: &str, deploy: &DeployConfig) -> UploadResult<()>;
}

/// One release metadata step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReleaseStep {
    Create,
    SetCommits,
    Finalize,
    Deploy,
}

impl fmt::Display for ReleaseStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "create",
            Self::SetCommits => "set-commits",
            Self::Finalize => "finalize",
            Self::Deploy => "deploy",
        })
    }
}

/// Run the enabled release steps in order: create, set-commits, finalize,
/// deploy. Returns the steps that completed.
///
/// A failed set-commits step with `ignore_missing` is logged and the sequence
/// continues. Any other failure stops the sequence and goes through `errors`
/// without escalation by default.
pub async fn run_release_steps(
    api: &dyn ReleaseApi,
    config: &ReleaseConfig,
    tracker: &Arc<DependencyTracker>,
    errors: &RecoverableErrors,
) -> UploadResult<Vec<ReleaseStep>> {
    let Some(release) = config.name.as_deref() else {
        warn!("no release name configured; skipping release steps");
        return Ok(Vec::new());
    };
    let _hold = tracker.hold();

    let mut completed = Vec::new();
    if let Err(e) = run_steps(api, release, config, &mut completed).await {
        errors.handle(e, false)?;
    }
    info!(release, steps = completed.len(), "release steps finished");
    Ok(completed)
}

async fn run_steps(
    api: &dyn ReleaseApi,
    release: &str,
    config: &ReleaseConfig,
    completed: &mut Vec<ReleaseStep>,
) -> UploadResult<()> {
    if config.create {
        api.new_release(release).await?;
        completed.push(ReleaseStep::Create);
    }

    if let Some(commits) = &config.set_commits {
        match api.set_commits(release, commits).await {
            Ok(()) => completed.push(ReleaseStep::SetCommits),
            Err(e) if commits.ignore_missing => {
                warn!(release, error = %e, "failed to set commits; continuing");
            }
            Err(e) => return Err(e),
        }
    }

    if config.finalize {
        api.finalize_release(release).await?;
        completed.push(ReleaseStep::Finalize);
    }

    if let Some(deploy) = &config.deploy {
        api.new_deploy(release, deploy).await?;
        completed.push(ReleaseStep::Deploy);
    }

    debug!(release, ?completed, "release steps ran");
    Ok(())
}

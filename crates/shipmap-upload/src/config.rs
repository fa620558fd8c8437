use std::path::Path;

use serde::{Deserialize, Serialize};
use shipmap_tasks::DEFAULT_WORKERS;

use crate::error::{ConfigError, ConfigResult};

/// Options for one build's upload, release, and cleanup steps.
///
/// Every field has a default, so an empty TOML document is a valid config.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Glob patterns that replace the build's own artifact list when set.
    pub assets: Vec<String>,
    /// Glob patterns excluded from discovery.
    pub ignore: Vec<String>,
    /// Glob patterns deleted once every build step has released its hold.
    pub files_to_delete_after_upload: Vec<String>,
    /// Maximum number of chunks prepared concurrently.
    pub concurrency: usize,
    /// Return transport failures to the caller instead of only reporting them.
    pub escalate_upload_errors: bool,
    pub release: ReleaseConfig,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            assets: Vec::new(),
            ignore: Vec::new(),
            files_to_delete_after_upload: Vec::new(),
            concurrency: DEFAULT_WORKERS,
            escalate_upload_errors: false,
            release: ReleaseConfig::default(),
        }
    }
}

impl UploadConfig {
    /// Load a config from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(text)?)
    }
}

/// Release metadata steps.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseConfig {
    /// Release name. Without one, artifacts are uploaded untagged and no
    /// release step runs.
    pub name: Option<String>,
    /// Distribution tag within the release.
    pub dist: Option<String>,
    /// Create the release before anything else.
    pub create: bool,
    /// Mark the release finalized after commits are associated.
    pub finalize: bool,
    pub set_commits: Option<SetCommitsConfig>,
    pub deploy: Option<DeployConfig>,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            name: None,
            dist: None,
            create: true,
            finalize: true,
            set_commits: None,
            deploy: None,
        }
    }
}

/// How commits are associated with a release.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetCommitsConfig {
    /// Let the release tool infer commits from the local repository.
    pub auto: bool,
    /// Repository name for a manual commit range.
    pub repo: Option<String>,
    /// Head commit of a manual range.
    pub commit: Option<String>,
    /// Base commit of a manual range.
    pub previous_commit: Option<String>,
    /// A failure of this step is logged and the remaining steps still run.
    pub ignore_missing: bool,
}

/// A deploy record created after the release is finalized.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployConfig {
    pub env: String,
    pub name: Option<String>,
    pub url: Option<String>,
}

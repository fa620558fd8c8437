use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::fs;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::{DeployConfig, SetCommitsConfig};
use crate::error::{UploadError, UploadResult};
use crate::release::{ReleaseApi, ReleaseStep};

/// Sends a staged bundle to the error-tracking service.
///
/// `dir` contains only prepared pairs and must not be touched after the
/// returned future completes; the caller removes it.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn upload_artifact_bundle(&self, dir: &Path, release: Option<&str>, dist: Option<&str>) -> UploadResult<()>;
}

/// Directory name used when a bundle has no release.
pub const UNRELEASED_DIR: &str = "undefined";

// ---------------------------------------------------------------------------
// DirectoryTransport
// ---------------------------------------------------------------------------

/// Copies each bundle into `<out_dir>/<release>/`.
#[derive(Clone, Debug)]
pub struct DirectoryTransport {
    out_dir: PathBuf,
}

impl DirectoryTransport {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self { out_dir: out_dir.into() }
    }

    /// Directory that receives bundles for `release`.
    pub fn target_dir(&self, release: Option<&str>) -> PathBuf {
        self.out_dir.join(release.unwrap_or(UNRELEASED_DIR))
    }
}

#[async_trait]
impl Transport for DirectoryTransport {
    async fn upload_artifact_bundle(&self, dir: &Path, release: Option<&str>, dist: Option<&str>) -> UploadResult<()> {
        let target = self.target_dir(release);
        fs::create_dir_all(&target)
            .await
            .map_err(|e| UploadError::io(&target, e))?;

        let mut entries = fs::read_dir(dir).await.map_err(|e| UploadError::io(dir, e))?;
        let mut copied = 0usize;
        while let Some(entry) = entries.next_entry().await.map_err(|e| UploadError::io(dir, e))? {
            let from = entry.path();
            let to = target.join(entry.file_name());
            fs::copy(&from, &to).await.map_err(|e| UploadError::io(&from, e))?;
            copied += 1;
        }

        info!(target = %target.display(), files = copied, dist, "bundle copied");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// CommandTransport
// ---------------------------------------------------------------------------

/// Drives an external release CLI for both uploads and release steps.
#[derive(Clone, Debug)]
pub struct CommandTransport {
    program: PathBuf,
    global_args: Vec<OsString>,
}

impl CommandTransport {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            global_args: Vec::new(),
        }
    }

    /// Arguments placed before every subcommand.
    pub fn with_global_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.global_args.extend(args.into_iter().map(Into::into));
        self
    }

    async fn run(&self, args: Vec<OsString>) -> UploadResult<()> {
        debug!(program = %self.program.display(), ?args, "running release CLI");
        let output = Command::new(&self.program)
            .args(&self.global_args)
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| UploadError::Transport(format!("failed to run {}: {e}", self.program.display())))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(UploadError::Transport(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }

    /// Run one release step, reporting a failure against that step.
    async fn run_release_step(&self, step: ReleaseStep, args: Vec<OsString>) -> UploadResult<()> {
        self.run(args).await.map_err(|e| match e {
            UploadError::Transport(reason) => UploadError::Release {
                step: step.to_string(),
                reason,
            },
            other => other,
        })
    }
}

/// Arguments for uploading a staged bundle.
pub fn upload_args(dir: &Path, release: Option<&str>, dist: Option<&str>) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["sourcemaps".into(), "upload".into()];
    if let Some(release) = release {
        args.extend([OsString::from("--release"), OsString::from(release)]);
    }
    if let Some(dist) = dist {
        args.extend([OsString::from("--dist"), OsString::from(dist)]);
    }
    args.push(dir.as_os_str().to_owned());
    args
}

fn set_commits_args(release: &str, options: &SetCommitsConfig) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["releases".into(), "set-commits".into(), release.into()];
    if options.auto {
        args.push("--auto".into());
    } else if let (Some(repo), Some(commit)) = (&options.repo, &options.commit) {
        let range = match &options.previous_commit {
            Some(previous) => format!("{repo}@{previous}..{commit}"),
            None => format!("{repo}@{commit}"),
        };
        args.extend([OsString::from("--commit"), OsString::from(range)]);
    }
    if options.ignore_missing {
        args.push("--ignore-missing".into());
    }
    args
}

fn deploy_args(release: &str, deploy: &DeployConfig) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "releases".into(),
        "deploys".into(),
        release.into(),
        "new".into(),
        "--env".into(),
        deploy.env.clone().into(),
    ];
    if let Some(name) = &deploy.name {
        args.extend([OsString::from("--name"), OsString::from(name)]);
    }
    if let Some(url) = &deploy.url {
        args.extend([OsString::from("--url"), OsString::from(url)]);
    }
    args
}

#[async_trait]
impl Transport for CommandTransport {
    async fn upload_artifact_bundle(&self, dir: &Path, release: Option<&str>, dist: Option<&str>) -> UploadResult<()> {
        self.run(upload_args(dir, release, dist)).await
    }
}

#[async_trait]
impl ReleaseApi for CommandTransport {
    async fn new_release(&self, release: &str) -> UploadResult<()> {
        self.run_release_step(ReleaseStep::Create, vec!["releases".into(), "new".into(), release.into()])
            .await
    }

    async fn set_commits(&self, release: &str, options: &SetCommitsConfig) -> UploadResult<()> {
        self.run_release_step(ReleaseStep::SetCommits, set_commits_args(release, options))
            .await
    }

    async fn finalize_release(&self, release: &str) -> UploadResult<()> {
        self.run_release_step(ReleaseStep::Finalize, vec!["releases".into(), "finalize".into(), release.into()])
            .await
    }

    async fn new_deploy(&self, release: &str, deploy: &DeployConfig) -> UploadResult<()> {
        self.run_release_step(ReleaseStep::Deploy, deploy_args(release, deploy))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs as stdfs;
    use tempfile::TempDir;

    fn strs(args: Vec<OsString>) -> Vec<String> {
        args.into_iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    #[tokio::test]
    async fn directory_transport_copies_into_release_dir() {
        let staging = TempDir::new().unwrap();
        stdfs::write(staging.path().join("id-0.js"), "a").unwrap();
        stdfs::write(staging.path().join("id-0.js.map"), "{}").unwrap();
        let out = TempDir::new().unwrap();

        let transport = DirectoryTransport::new(out.path());
        transport
            .upload_artifact_bundle(staging.path(), Some("web@1"), None)
            .await
            .unwrap();

        let target = out.path().join("web@1");
        assert_eq!(stdfs::read_to_string(target.join("id-0.js")).unwrap(), "a");
        assert_eq!(stdfs::read_to_string(target.join("id-0.js.map")).unwrap(), "{}");
    }

    #[tokio::test]
    async fn directory_transport_without_release() {
        let staging = TempDir::new().unwrap();
        stdfs::write(staging.path().join("x.js"), "").unwrap();
        let out = TempDir::new().unwrap();

        DirectoryTransport::new(out.path())
            .upload_artifact_bundle(staging.path(), None, None)
            .await
            .unwrap();
        assert!(out.path().join(UNRELEASED_DIR).join("x.js").is_file());
    }

    #[tokio::test]
    async fn directory_transport_reports_missing_bundle() {
        let out = TempDir::new().unwrap();
        let err = DirectoryTransport::new(out.path())
            .upload_artifact_bundle(&out.path().join("gone"), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::Io { .. }));
    }

    #[test]
    fn upload_arguments() {
        assert_eq!(
            strs(upload_args(Path::new("/tmp/b"), Some("r1"), Some("d"))),
            vec!["sourcemaps", "upload", "--release", "r1", "--dist", "d", "/tmp/b"]
        );
        assert_eq!(strs(upload_args(Path::new("/tmp/b"), None, None)), vec!["sourcemaps", "upload", "/tmp/b"]);
    }

    #[test]
    fn set_commits_arguments() {
        let auto = SetCommitsConfig {
            auto: true,
            ignore_missing: true,
            ..Default::default()
        };
        assert_eq!(
            strs(set_commits_args("r1", &auto)),
            vec!["releases", "set-commits", "r1", "--auto", "--ignore-missing"]
        );

        let manual = SetCommitsConfig {
            repo: Some("org/app".into()),
            commit: Some("abc".into()),
            previous_commit: Some("123".into()),
            ..Default::default()
        };
        assert_eq!(
            strs(set_commits_args("r1", &manual)),
            vec!["releases", "set-commits", "r1", "--commit", "org/app@123..abc"]
        );
    }

    #[test]
    fn deploy_arguments() {
        let deploy = DeployConfig {
            env: "prod".into(),
            name: Some("blue".into()),
            url: None,
        };
        assert_eq!(
            strs(deploy_args("r1", &deploy)),
            vec!["releases", "deploys", "r1", "new", "--env", "prod", "--name", "blue"]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn successful_command() {
        let transport = CommandTransport::new("true");
        transport.new_release("r1").await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_is_a_transport_error() {
        let transport = CommandTransport::new("false");
        let err = transport
            .upload_artifact_bundle(Path::new("/tmp"), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::Transport(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failed_release_command_names_its_step() {
        let transport = CommandTransport::new("false");
        let err = transport.new_release("r1").await.unwrap_err();
        assert!(matches!(err, UploadError::Release { ref step, .. } if step == "create"), "{err:?}");

        let deploy = DeployConfig {
            env: "prod".into(),
            name: None,
            url: None,
        };
        let err = transport.new_deploy("r1", &deploy).await.unwrap_err();
        assert!(matches!(err, UploadError::Release { ref step, .. } if step == "deploy"), "{err:?}");
    }

    #[tokio::test]
    async fn missing_program_is_a_transport_error() {
        let transport = CommandTransport::new("shipmap-no-such-program");
        let err = transport
            .upload_artifact_bundle(Path::new("/tmp"), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::Transport(_)));
    }

    #[tokio::test]
    async fn missing_program_fails_the_release_step() {
        let transport = CommandTransport::new("shipmap-no-such-program");
        let err = transport.finalize_release("r1").await.unwrap_err();
        assert!(matches!(err, UploadError::Release { ref step, .. } if step == "finalize"), "{err:?}");
    }
}

//! Upload orchestration for shipmap.
//!
//! A [`BuildPluginManager`] owns one build's configuration, hooks, error
//! policy, and [`DependencyTracker`](shipmap_tasks::DependencyTracker). Its
//! steps are independent and may run in any order:
//!
//! - [`inject_debug_ids`](BuildPluginManager::inject_debug_ids) marks chunks in place;
//! - [`upload_sourcemaps`](BuildPluginManager::upload_sourcemaps) stages marked
//!   chunks and their maps and hands them to a [`Transport`];
//! - [`create_release`](BuildPluginManager::create_release) runs the
//!   [`ReleaseApi`] steps;
//! - [`delete_artifacts`](BuildPluginManager::delete_artifacts) waits until no
//!   other step holds the artifacts, then deletes them.

pub mod cleanup;
pub mod config;
pub mod discovery;
pub mod error;
pub mod manager;
pub mod orchestrator;
pub mod policy;
pub mod release;
pub mod transport;

pub use cleanup::{delete_artifacts_after_upload, DeleteReport};
pub use config::{DeployConfig, ReleaseConfig, SetCommitsConfig, UploadConfig};
pub use discovery::{discover_artifacts, filter_chunks};
pub use error::{ConfigError, ConfigResult, UploadError, UploadResult};
pub use manager::{BuildPluginManager, InjectReport};
pub use orchestrator::{upload_debug_id_artifacts, UploadContext, UploadReport, STAGING_PREFIX};
pub use policy::{ErrorHandler, RecoverableErrors};
pub use release::{run_release_steps, ReleaseApi, ReleaseStep};
pub use transport::{upload_args, CommandTransport, DirectoryTransport, Transport, UNRELEASED_DIR};

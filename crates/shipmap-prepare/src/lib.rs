//! Per-chunk artifact preparation for shipmap.
//!
//! The [`ArtifactPreparer`] turns one marked chunk into a [`PreparedPair`]
//! inside a staging directory: a copy named `{debug_id}-{ordinal}.{ext}` and,
//! when a source map is found, `{debug_id}-{ordinal}.{ext}.map` with the
//! debug ID embedded and every source path rewritten.
//!
//! The [`ChunkInjector`] performs the build-time half: it derives a debug ID
//! from a chunk's content, injects the runtime snippet in place, and patches
//! the chunk's source map to match.
//!
//! Failures are isolated per chunk. Nothing in this crate aborts a batch.
//!
//! [`PreparedPair`]: shipmap_types::PreparedPair

pub mod error;
pub mod hooks;
pub mod inject;
pub mod preparer;
pub mod rewrite;

pub use error::{PrepareError, PrepareResult};
pub use hooks::PrepareHooks;
pub use inject::{ChunkInjector, InjectOutcome};
pub use preparer::{ArtifactPreparer, PrepareOutcome, SkipReason};
pub use rewrite::{DefaultRewriteSources, RewriteSources};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use shipmap_inject::{extract_debug_id, set_debug_id};
use shipmap_locate::SourceMapLocator;
use shipmap_types::{Chunk, DebugId, PreparedPair};
use tokio::fs;
use tracing::{debug, warn};

use crate::error::{PrepareError, PrepareResult};
use crate::hooks::PrepareHooks;
use crate::rewrite::RewriteSources;

// ---------------------------------------------------------------------------
// PrepareOutcome
// ---------------------------------------------------------------------------

/// Why a chunk was left out of the staged batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// The chunk could not be read.
    Unreadable(String),
    /// The chunk carries no debug-ID marker; it was never marked for
    /// correlation.
    MissingDebugId,
    /// The staged copy could not be written.
    WriteFailed(String),
}

/// Result of preparing one chunk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PrepareOutcome {
    Prepared(PreparedPair),
    Skipped { path: PathBuf, reason: SkipReason },
}

impl PrepareOutcome {
    pub fn is_prepared(&self) -> bool {
        matches!(self, Self::Prepared(_))
    }

    pub fn prepared(&self) -> Option<&PreparedPair> {
        match self {
            Self::Prepared(pair) => Some(pair),
            Self::Skipped { .. } => None,
        }
    }
}

// ---------------------------------------------------------------------------
// ArtifactPreparer
// ---------------------------------------------------------------------------

/// Stages one chunk and its source map for upload.
pub struct ArtifactPreparer {
    locator: SourceMapLocator,
    rewrite_sources: Arc<dyn RewriteSources>,
}

impl ArtifactPreparer {
    pub fn new(locator: SourceMapLocator, rewrite_sources: Arc<dyn RewriteSources>) -> Self {
        Self {
            locator,
            rewrite_sources,
        }
    }

    /// Build a preparer from caller hooks with the default locator chain.
    pub fn from_hooks(hooks: &PrepareHooks) -> Self {
        Self::new(hooks.locator(), Arc::clone(&hooks.rewrite_sources))
    }

    /// Prepare the chunk at `chunk_path` into `staging_dir`.
    ///
    /// Never fails: unreadable or unmarked chunks are skipped, and any map
    /// problem only drops the map.
    pub async fn prepare(&self, chunk_path: &Path, ordinal: usize, staging_dir: &Path) -> PrepareOutcome {
        let raw = match fs::read(chunk_path).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(path = %chunk_path.display(), error = %e, "failed to read chunk; skipping");
                return PrepareOutcome::Skipped {
                    path: chunk_path.to_path_buf(),
                    reason: SkipReason::Unreadable(e.to_string()),
                };
            }
        };
        // Bundles may carry non-UTF-8 literals. The marker and map reference
        // are ASCII, so a lossy view finds them and the raw bytes are staged.
        let chunk = Chunk::new(chunk_path, String::from_utf8_lossy(&raw), ordinal);

        let Some(debug_id) = extract_debug_id(&chunk.content) else {
            debug!(path = %chunk_path.display(), "chunk has no debug ID marker; skipping");
            return PrepareOutcome::Skipped {
                path: chunk.path,
                reason: SkipReason::MissingDebugId,
            };
        };

        let chunk_target = staging_dir.join(chunk.staged_name(&debug_id));
        let map_target = staging_dir.join(chunk.staged_map_name(&debug_id));

        let (chunk_written, map_written) = tokio::join!(
            write_chunk(&raw, &debug_id, &chunk_target),
            self.stage_source_map(&chunk, &debug_id, &map_target),
        );

        if let Err(e) = chunk_written {
            warn!(path = %chunk.path.display(), error = %e, "failed to stage chunk; skipping");
            if map_written.is_some() {
                let _ = fs::remove_file(&map_target).await;
            }
            return PrepareOutcome::Skipped {
                path: chunk.path,
                reason: SkipReason::WriteFailed(e.to_string()),
            };
        }

        debug!(
            path = %chunk.path.display(),
            ordinal,
            debug_id = %debug_id,
            has_map = map_written.is_some(),
            "chunk staged"
        );
        PrepareOutcome::Prepared(PreparedPair {
            debug_id,
            ordinal,
            source_path: chunk.path,
            chunk_path: chunk_target,
            map_path: map_written,
        })
    }

    /// Locate, augment, and stage the chunk's source map. Returns the staged
    /// path, or `None` if there is no usable map.
    async fn stage_source_map(&self, chunk: &Chunk, debug_id: &DebugId, target: &Path) -> Option<PathBuf> {
        let located = self.locator.locate(&chunk.path, &chunk.content).await?;
        match self.rewrite_source_map(&located.path, debug_id).await {
            Ok(bytes) => match fs::write(target, bytes).await {
                Ok(()) => Some(target.to_path_buf()),
                Err(e) => {
                    warn!(map = %located.path.display(), error = %e, "failed to stage source map");
                    None
                }
            },
            Err(e) => {
                warn!(map = %located.path.display(), error = %e, "failed to prepare source map");
                None
            }
        }
    }

    /// Read a map, tag it with the debug ID, and rewrite its sources.
    async fn rewrite_source_map(&self, map_path: &Path, debug_id: &DebugId) -> PrepareResult<Vec<u8>> {
        let raw = fs::read(map_path)
            .await
            .map_err(|e| PrepareError::io(map_path, e))?;
        let mut map: Value = serde_json::from_slice(&raw).map_err(|e| PrepareError::json(map_path, e))?;
        set_debug_id(&mut map, debug_id)?;

        let rewritten = match map.get("sources") {
            Some(Value::Array(sources)) => Some(
                sources
                    .iter()
                    .map(|source| match source {
                        Value::String(s) => Value::String(self.rewrite_sources.rewrite(s, &map)),
                        other => other.clone(),
                    })
                    .collect::<Vec<_>>(),
            ),
            _ => None,
        };
        if let Some(sources) = rewritten {
            map["sources"] = Value::Array(sources);
        }

        serde_json::to_vec(&map).map_err(|e| PrepareError::json(map_path, e))
    }
}

async fn write_chunk(raw: &[u8], debug_id: &DebugId, target: &Path) -> PrepareResult<()> {
    let mut staged = Vec::with_capacity(raw.len() + 64);
    staged.extend_from_slice(raw);
    staged.extend_from_slice(format!("\n//# debugId={debug_id}\n").as_bytes());
    fs::write(target, staged)
        .await
        .map_err(|e| PrepareError::io(target, e))
}

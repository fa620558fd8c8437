use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::debug_id::DebugId;

/// File extensions treated as code chunks.
pub const CHUNK_EXTENSIONS: [&str; 3] = ["js", "mjs", "cjs"];

/// One compiled output file, read once at the start of preparation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
    /// Absolute path of the chunk on disk.
    pub path: PathBuf,
    /// Textual content. Invalid UTF-8 sequences are replaced.
    pub content: String,
    /// Position in the sorted list of chunks discovered in this run.
    pub ordinal: usize,
}

impl Chunk {
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>, ordinal: usize) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            ordinal,
        }
    }

    /// The chunk's extension, or `js` when it has none.
    pub fn extension(&self) -> &str {
        chunk_extension(&self.path)
    }

    /// File name of the staged copy: `{debug_id}-{ordinal}.{ext}`.
    pub fn staged_name(&self, debug_id: &DebugId) -> String {
        format!("{debug_id}-{}.{}", self.ordinal, self.extension())
    }

    /// File name of the staged source map: `{debug_id}-{ordinal}.{ext}.map`.
    pub fn staged_map_name(&self, debug_id: &DebugId) -> String {
        format!("{}.map", self.staged_name(debug_id))
    }
}

/// Returns `true` if the path has one of the [`CHUNK_EXTENSIONS`].
pub fn is_chunk_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| CHUNK_EXTENSIONS.contains(&e))
}

fn chunk_extension(path: &Path) -> &str {
    path.extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .unwrap_or("js")
}

/// The staged output of preparing one chunk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparedPair {
    /// Identifier embedded in both staged files.
    pub debug_id: DebugId,
    /// Ordinal of the originating chunk.
    pub ordinal: usize,
    /// Original chunk location.
    pub source_path: PathBuf,
    /// Staged chunk copy.
    pub chunk_path: PathBuf,
    /// Staged source map, if one was located and rewritten.
    pub map_path: Option<PathBuf>,
}

impl PreparedPair {
    /// Whether a source map was staged alongside the chunk.
    pub fn has_map(&self) -> bool {
        self.map_path.is_some()
    }
}

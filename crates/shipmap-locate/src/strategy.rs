use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;

fn source_mapping_url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^[ \t]*//[#@][ \t]*sourceMappingURL=[ \t]*(\S+)[ \t]*\r?$")
            .expect("sourceMappingURL regex is valid")
    })
}

/// Value of the last `//# sourceMappingURL=` comment in `content`.
pub fn source_mapping_url(content: &str) -> Option<String> {
    source_mapping_url_regex()
        .captures_iter(content)
        .last()
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

// ---------------------------------------------------------------------------
// LocateRequest
// ---------------------------------------------------------------------------

/// Everything a strategy may inspect about a chunk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocateRequest {
    /// Path of the chunk on disk.
    pub chunk_path: PathBuf,
    /// In-content map reference, if the chunk carries one.
    pub source_mapping_url: Option<String>,
}

impl LocateRequest {
    /// Build a request from a chunk's path and content.
    pub fn from_chunk(chunk_path: &Path, content: &str) -> Self {
        Self {
            chunk_path: chunk_path.to_path_buf(),
            source_mapping_url: source_mapping_url(content),
        }
    }

    /// Directory containing the chunk.
    pub fn chunk_dir(&self) -> &Path {
        self.chunk_path.parent().unwrap_or_else(|| Path::new(""))
    }
}

// ---------------------------------------------------------------------------
// Located
// ---------------------------------------------------------------------------

/// The outcome of a single strategy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Located {
    /// The strategy proposes this path. The locator still checks that it
    /// exists before accepting it.
    Found(PathBuf),
    /// The strategy has nothing to offer; try the next one.
    Next,
}

impl Located {
    pub fn from_option(path: Option<PathBuf>) -> Self {
        path.map_or(Self::Next, Self::Found)
    }
}

// ---------------------------------------------------------------------------
// LocateStrategy trait
// ---------------------------------------------------------------------------

/// One heuristic in the locator chain.
///
/// Strategies are evaluated in order; the first one whose candidate exists
/// on disk wins. The trait is object-safe so strategies can be stored in a
/// `Vec<Box<dyn LocateStrategy>>`.
#[async_trait]
pub trait LocateStrategy: Send + Sync {
    /// Short name used in logs (e.g. "hook", "comment").
    fn name(&self) -> &str;

    /// Propose a candidate path for the request.
    async fn locate(&self, request: &LocateRequest) -> Located;
}

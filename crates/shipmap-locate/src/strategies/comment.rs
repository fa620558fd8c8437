use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use crate::strategy::{LocateRequest, LocateStrategy, Located};

/// Resolve a `sourceMappingURL` value relative to the chunk's directory.
///
/// - absolute filesystem paths are used as-is;
/// - `file:` URLs map to their filesystem path;
/// - any other URL (`https:`, `data:`, ...) is not resolvable locally;
/// - everything else is a path relative to `chunk_dir`.
pub fn resolve_reference(chunk_dir: &Path, reference: &str) -> Option<PathBuf> {
    let as_path = Path::new(reference);
    if as_path.is_absolute() {
        return Some(as_path.to_path_buf());
    }

    match Url::parse(reference) {
        Ok(url) if url.scheme() == "file" => url.to_file_path().ok(),
        Ok(url) => {
            debug!(scheme = url.scheme(), "sourceMappingURL is not a local reference");
            None
        }
        Err(_) => Some(chunk_dir.join(as_path)),
    }
}

/// Follows the chunk's `//# sourceMappingURL=` comment.
pub struct CommentStrategy;

#[async_trait]
impl LocateStrategy for CommentStrategy {
    fn name(&self) -> &str {
        "comment"
    }

    async fn locate(&self, request: &LocateRequest) -> Located {
        let Some(reference) = request.source_mapping_url.as_deref() else {
            return Located::Next;
        };
        Located::from_option(resolve_reference(request.chunk_dir(), reference))
    }
}

use std::path::{Path, PathBuf};

use async_trait::async_trait;

/// Caller-supplied override for source map resolution.
///
/// The hook receives the chunk path and the value of the chunk's
/// `sourceMappingURL` comment, if any. Returning a path that exists wins over
/// every built-in heuristic. Returning `None`, or a path that does not exist,
/// falls through to the next strategy.
#[async_trait]
pub trait ResolveSourceMap: Send + Sync {
    async fn resolve(&self, chunk_path: &Path, source_mapping_url: Option<&str>) -> Option<PathBuf>;
}

#[async_trait]
impl<F> ResolveSourceMap for F
where
    F: Fn(&Path, Option<&str>) -> Option<PathBuf> + Send + Sync,
{
    async fn resolve(&self, chunk_path: &Path, source_mapping_url: Option<&str>) -> Option<PathBuf> {
        self(chunk_path, source_mapping_url)
    }
}

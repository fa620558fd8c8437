use std::ffi::OsString;
use std::path::PathBuf;

use async_trait::async_trait;

use crate::strategy::{LocateRequest, LocateStrategy, Located};

/// Looks for `{chunk_path}.map`.
pub struct AdjacentStrategy;

impl AdjacentStrategy {
    /// The adjacent map path for a chunk.
    pub fn candidate(request: &LocateRequest) -> PathBuf {
        let mut name = OsString::from(request.chunk_path.as_os_str());
        name.push(".map");
        PathBuf::from(name)
    }
}

#[async_trait]
impl LocateStrategy for AdjacentStrategy {
    fn name(&self) -> &str {
        "adjacent"
    }

    async fn locate(&self, request: &LocateRequest) -> Located {
        Located::Found(Self::candidate(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn appends_map_suffix() {
        let request = LocateRequest::from_chunk(Path::new("/dist/app.min.js"), "");
        assert_eq!(
            AdjacentStrategy::candidate(&request),
            PathBuf::from("/dist/app.min.js.map")
        );
    }
}

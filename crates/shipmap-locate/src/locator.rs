use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::hook::ResolveSourceMap;
use crate::strategies::{AdjacentStrategy, CommentStrategy, HookStrategy};
use crate::strategy::{LocateRequest, LocateStrategy, Located};

/// A source map found by the locator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocatedMap {
    /// Path of the map on disk.
    pub path: PathBuf,
    /// Name of the strategy that produced it.
    pub strategy: String,
}

/// Runs an ordered chain of [`LocateStrategy`] implementations.
///
/// Each candidate must exist as a regular file; otherwise evaluation falls
/// through to the next strategy.
pub struct SourceMapLocator {
    strategies: Vec<Box<dyn LocateStrategy>>,
}

impl SourceMapLocator {
    /// Create a locator with an empty chain.
    pub fn new() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    /// Create a locator with the default chain:
    /// Hook (if given) -> Comment -> Adjacent
    pub fn with_default_strategies(hook: Option<Arc<dyn ResolveSourceMap>>) -> Self {
        let mut locator = Self::new();
        if let Some(hook) = hook {
            locator.add_strategy(Box::new(HookStrategy::new(hook)));
        }
        locator.add_strategy(Box::new(CommentStrategy));
        locator.add_strategy(Box::new(AdjacentStrategy));
        locator
    }

    /// Append a strategy to the end of the chain.
    pub fn add_strategy(&mut self, strategy: Box<dyn LocateStrategy>) {
        self.strategies.push(strategy);
    }

    /// Number of strategies in the chain.
    pub fn strategy_count(&self) -> usize {
        self.strategies.len()
    }

    /// Locate the source map for a chunk given its path and content.
    pub async fn locate(&self, chunk_path: &Path, content: &str) -> Option<LocatedMap> {
        let request = LocateRequest::from_chunk(chunk_path, content);
        self.locate_request(&request).await
    }

    /// Locate the source map for a prepared request.
    pub async fn locate_request(&self, request: &LocateRequest) -> Option<LocatedMap> {
        for strategy in &self.strategies {
            let Located::Found(candidate) = strategy.locate(request).await else {
                continue;
            };
            if is_file(&candidate).await {
                return Some(LocatedMap {
                    path: candidate,
                    strategy: strategy.name().to_string(),
                });
            }
            debug!(
                chunk = %request.chunk_path.display(),
                candidate = %candidate.display(),
                strategy = strategy.name(),
                "source map candidate does not exist"
            );
        }

        debug!(
            chunk = %request.chunk_path.display(),
            "no source map found; this is expected for some toolchains"
        );
        None
    }
}

impl Default for SourceMapLocator {
    fn default() -> Self {
        Self::with_default_strategies(None)
    }
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}

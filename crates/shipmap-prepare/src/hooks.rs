use std::fmt;
use std::sync::Arc;

use shipmap_locate::{ResolveSourceMap, SourceMapLocator};

use crate::rewrite::{DefaultRewriteSources, RewriteSources};

/// Caller-supplied hooks that customize preparation.
#[derive(Clone)]
pub struct PrepareHooks {
    /// Applied to every entry of a staged map's `sources` list.
    pub rewrite_sources: Arc<dyn RewriteSources>,
    /// Consulted before the built-in source map heuristics.
    pub resolve_source_map: Option<Arc<dyn ResolveSourceMap>>,
}

impl PrepareHooks {
    pub fn with_rewrite_sources(mut self, hook: Arc<dyn RewriteSources>) -> Self {
        self.rewrite_sources = hook;
        self
    }

    pub fn with_resolve_source_map(mut self, hook: Arc<dyn ResolveSourceMap>) -> Self {
        self.resolve_source_map = Some(hook);
        self
    }

    /// Locator with the default strategy chain and this resolve hook.
    pub fn locator(&self) -> SourceMapLocator {
        SourceMapLocator::with_default_strategies(self.resolve_source_map.clone())
    }
}

impl Default for PrepareHooks {
    fn default() -> Self {
        Self {
            rewrite_sources: Arc::new(DefaultRewriteSources::default()),
            resolve_source_map: None,
        }
    }
}

impl fmt::Debug for PrepareHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrepareHooks")
            .field("resolve_source_map", &self.resolve_source_map.is_some())
            .finish_non_exhaustive()
    }
}

use std::sync::Arc;

use async_trait::async_trait;

use crate::hook::ResolveSourceMap;
use crate::strategy::{LocateRequest, LocateStrategy, Located};

/// Delegates to a caller-supplied [`ResolveSourceMap`] hook.
pub struct HookStrategy {
    hook: Arc<dyn ResolveSourceMap>,
}

impl HookStrategy {
    pub fn new(hook: Arc<dyn ResolveSourceMap>) -> Self {
        Self { hook }
    }
}

#[async_trait]
impl LocateStrategy for HookStrategy {
    fn name(&self) -> &str {
        "hook"
    }

    async fn locate(&self, request: &LocateRequest) -> Located {
        let resolved = self
            .hook
            .resolve(&request.chunk_path, request.source_mapping_url.as_deref())
            .await;
        Located::from_option(resolved)
    }
}

//! Source map discovery for shipmap.
//!
//! Given a chunk's path and content, the [`SourceMapLocator`] runs an ordered
//! list of [`LocateStrategy`] implementations and returns the first candidate
//! that exists on disk.
//!
//! # Default strategies
//!
//! 1. [`HookStrategy`]: a caller-supplied [`ResolveSourceMap`] hook
//! 2. [`CommentStrategy`]: the chunk's `//# sourceMappingURL=` comment
//! 3. [`AdjacentStrategy`]: `{chunk}.map` next to the chunk
//!
//! Remote URLs are never fetched; a non-`file:` URL reference is treated as
//! not resolvable locally.
//!
//! ```rust,no_run
//! # async fn demo() {
//! use shipmap_locate::SourceMapLocator;
//!
//! let locator = SourceMapLocator::with_default_strategies(None);
//! let content = "console.log(1);\n//# sourceMappingURL=main.js.map";
//! if let Some(found) = locator.locate("dist/main.js".as_ref(), content).await {
//!     println!("{} via {}", found.path.display(), found.strategy);
//! }
//! # }
//! ```

pub mod hook;
pub mod locator;
pub mod strategy;
pub mod strategies;

pub use hook::ResolveSourceMap;
pub use locator::{LocatedMap, SourceMapLocator};
pub use strategy::{source_mapping_url, LocateRequest, LocateStrategy, Located};
pub use strategies::adjacent::AdjacentStrategy;
pub use strategies::comment::{resolve_reference, CommentStrategy};
pub use strategies::hook::HookStrategy;

use std::path::{Path, PathBuf};

use serde_json::Value;
use shipmap_crypto::DebugIdHasher;
use shipmap_inject::{adjust_source_map, extract_debug_id, inject_snippet, InjectionEdit};
use shipmap_locate::SourceMapLocator;
use shipmap_types::DebugId;
use tokio::fs;
use tracing::{debug, warn};

use crate::error::{PrepareError, PrepareResult};
use crate::hooks::PrepareHooks;

/// Result of injecting one chunk in place.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InjectOutcome {
    /// The snippet was inserted. `map` is the source map that was adjusted,
    /// if one was found and rewritten successfully.
    Injected {
        debug_id: DebugId,
        map: Option<PathBuf>,
    },
    /// The chunk already carried a marker; nothing was written.
    AlreadyInjected(DebugId),
}

impl InjectOutcome {
    pub fn debug_id(&self) -> &DebugId {
        match self {
            Self::Injected { debug_id, .. } | Self::AlreadyInjected(debug_id) => debug_id,
        }
    }
}

/// Injects debug IDs into built chunks on disk and patches their maps.
pub struct ChunkInjector {
    locator: SourceMapLocator,
}

impl ChunkInjector {
    pub fn new(locator: SourceMapLocator) -> Self {
        Self { locator }
    }

    pub fn from_hooks(hooks: &PrepareHooks) -> Self {
        Self::new(hooks.locator())
    }

    /// Inject the chunk at `path`.
    ///
    /// Fails only if the chunk itself cannot be read or written back. The ID
    /// is derived from the content before injection, so repeated builds of
    /// the same output produce the same ID.
    pub async fn inject_file(&self, path: &Path) -> PrepareResult<InjectOutcome> {
        let raw = fs::read(path).await.map_err(|e| PrepareError::io(path, e))?;
        let content = String::from_utf8_lossy(&raw);

        if let Some(existing) = extract_debug_id(&content) {
            debug!(path = %path.display(), debug_id = %existing, "chunk already injected");
            return Ok(InjectOutcome::AlreadyInjected(existing));
        }

        let debug_id = DebugIdHasher::debug_id(&raw);
        let injection = inject_snippet(&content, &debug_id);
        let located = self.locator.locate(path, &content).await;

        let at = raw_offset(&raw, injection.edit.offset);
        let mut written = Vec::with_capacity(raw.len() + injection.edit.inserted.len());
        written.extend_from_slice(&raw[..at]);
        written.extend_from_slice(injection.edit.inserted.as_bytes());
        written.extend_from_slice(&raw[at..]);
        fs::write(path, written)
            .await
            .map_err(|e| PrepareError::io(path, e))?;

        let map = match located {
            Some(found) => match rewrite_map(&found.path, &injection.edit, &debug_id).await {
                Ok(()) => Some(found.path),
                Err(e) => {
                    warn!(map = %found.path.display(), error = %e, "failed to adjust source map");
                    None
                }
            },
            None => None,
        };

        debug!(
            path = %path.display(),
            debug_id = %debug_id,
            has_map = map.is_some(),
            "debug ID injected"
        );
        Ok(InjectOutcome::Injected { debug_id, map })
    }
}

impl Default for ChunkInjector {
    fn default() -> Self {
        Self::new(SourceMapLocator::default())
    }
}

/// Map a byte offset in the lossy view of `raw` back to `raw`.
///
/// Each invalid sequence shows up as one U+FFFD in the lossy text.
fn raw_offset(raw: &[u8], lossy_offset: usize) -> usize {
    let replacement = char::REPLACEMENT_CHARACTER.len_utf8();
    let (mut raw_pos, mut lossy_pos) = (0, 0);
    for chunk in raw.utf8_chunks() {
        let valid = chunk.valid().len();
        if lossy_offset <= lossy_pos + valid {
            return raw_pos + (lossy_offset - lossy_pos);
        }
        raw_pos += valid;
        lossy_pos += valid;
        if !chunk.invalid().is_empty() {
            if lossy_offset < lossy_pos + replacement {
                return raw_pos;
            }
            raw_pos += chunk.invalid().len();
            lossy_pos += replacement;
        }
    }
    raw.len()
}

async fn rewrite_map(map_path: &Path, edit: &InjectionEdit, debug_id: &DebugId) -> PrepareResult<()> {
    let raw = fs::read(map_path)
        .await
        .map_err(|e| PrepareError::io(map_path, e))?;
    let mut map: Value = serde_json::from_slice(&raw).map_err(|e| PrepareError::json(map_path, e))?;
    adjust_source_map(&mut map, edit, debug_id)?;
    let bytes = serde_json::to_vec(&map).map_err(|e| PrepareError::json(map_path, e))?;
    fs::write(map_path, bytes)
        .await
        .map_err(|e| PrepareError::io(map_path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs as stdfs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn injects_and_tags_adjacent_map() {
        let dir = TempDir::new().unwrap();
        let chunk = dir.path().join("main.js");
        let code = "console.log(\"hello world\");";
        stdfs::write(&chunk, code).unwrap();
        stdfs::write(
            dir.path().join("main.js.map"),
            json!({"version": 3, "sources": ["a.ts"], "mappings": "AAAA"}).to_string(),
        )
        .unwrap();

        let outcome = ChunkInjector::default().inject_file(&chunk).await.unwrap();
        let expected = DebugIdHasher::debug_id(code);
        assert_eq!(
            outcome,
            InjectOutcome::Injected {
                debug_id: expected,
                map: Some(dir.path().join("main.js.map")),
            }
        );

        let written = stdfs::read_to_string(&chunk).unwrap();
        assert!(written.ends_with(code));
        assert_eq!(extract_debug_id(&written), Some(expected));

        let map: Value =
            serde_json::from_str(&stdfs::read_to_string(dir.path().join("main.js.map")).unwrap()).unwrap();
        assert_eq!(map["debugId"], expected.to_string());
        assert_eq!(map["debug_id"], expected.to_string());
        assert_ne!(map["mappings"], "AAAA");
        assert_eq!(map["sources"], json!(["a.ts"]));
    }

    #[tokio::test]
    async fn second_run_is_a_no_op() {
        let dir = TempDir::new().unwrap();
        let chunk = dir.path().join("main.js");
        stdfs::write(&chunk, "run();").unwrap();

        let injector = ChunkInjector::default();
        let first = injector.inject_file(&chunk).await.unwrap();
        let after_first = stdfs::read_to_string(&chunk).unwrap();
        let second = injector.inject_file(&chunk).await.unwrap();

        assert_eq!(second, InjectOutcome::AlreadyInjected(*first.debug_id()));
        assert_eq!(stdfs::read_to_string(&chunk).unwrap(), after_first);
    }

    #[tokio::test]
    async fn missing_map_still_injects() {
        let dir = TempDir::new().unwrap();
        let chunk = dir.path().join("solo.js");
        stdfs::write(&chunk, "\"use strict\";\nrun();").unwrap();

        let outcome = ChunkInjector::default().inject_file(&chunk).await.unwrap();
        assert!(matches!(outcome, InjectOutcome::Injected { map: None, .. }));
        let written = stdfs::read_to_string(&chunk).unwrap();
        assert!(written.starts_with("\"use strict\";"));
    }

    #[tokio::test]
    async fn broken_map_leaves_chunk_injected() {
        let dir = TempDir::new().unwrap();
        let chunk = dir.path().join("main.js");
        stdfs::write(&chunk, "run();").unwrap();
        stdfs::write(dir.path().join("main.js.map"), "not json").unwrap();

        let outcome = ChunkInjector::default().inject_file(&chunk).await.unwrap();
        assert!(matches!(outcome, InjectOutcome::Injected { map: None, .. }));
        assert!(extract_debug_id(&stdfs::read_to_string(&chunk).unwrap()).is_some());
        assert_eq!(stdfs::read_to_string(dir.path().join("main.js.map")).unwrap(), "not json");
    }

    #[tokio::test]
    async fn non_utf8_chunk_keeps_its_bytes() {
        let dir = TempDir::new().unwrap();
        let chunk = dir.path().join("latin1.js");
        let original: &[u8] = b"var s='caf\xe9';";
        stdfs::write(&chunk, original).unwrap();

        let outcome = ChunkInjector::default().inject_file(&chunk).await.unwrap();
        assert_eq!(*outcome.debug_id(), DebugIdHasher::debug_id(original));

        let written = stdfs::read(&chunk).unwrap();
        assert!(written.ends_with(original));
        assert_eq!(
            extract_debug_id(&String::from_utf8_lossy(&written)),
            Some(*outcome.debug_id())
        );
    }

    #[test]
    fn lossy_offsets_map_back_to_raw_bytes() {
        // "a\u{FFFD}b" in the lossy view.
        let raw = b"a\xffb";
        assert_eq!(raw_offset(raw, 0), 0);
        assert_eq!(raw_offset(raw, 1), 1);
        assert_eq!(raw_offset(raw, 4), 2);
        assert_eq!(raw_offset(raw, 5), 3);
        assert_eq!(raw_offset(b"plain", 3), 3);
    }

    #[tokio::test]
    async fn unreadable_chunk_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = ChunkInjector::default()
            .inject_file(&dir.path().join("nope.js"))
            .await
            .unwrap_err();
        assert!(matches!(err, PrepareError::Io { .. }));
    }
}

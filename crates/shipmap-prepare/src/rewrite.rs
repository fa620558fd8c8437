use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

/// Rewrites each entry of a source map's `sources` list before upload.
///
/// The hook receives the original entry and the whole (already tagged) map.
pub trait RewriteSources: Send + Sync {
    fn rewrite(&self, source: &str, map: &Value) -> String;
}

impl<F> RewriteSources for F
where
    F: Fn(&str, &Value) -> String + Send + Sync,
{
    fn rewrite(&self, source: &str, map: &Value) -> String {
        self(source, map)
    }
}

fn scheme_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://").expect("scheme regex is valid"))
}

/// The default source rewrite.
///
/// - `webpack://app/src/a.ts` becomes `app/src/a.ts` (scheme stripped);
/// - absolute paths become relative to the working directory;
/// - relative paths are lexically normalized.
#[derive(Clone, Debug)]
pub struct DefaultRewriteSources {
    cwd: PathBuf,
}

impl DefaultRewriteSources {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self { cwd: cwd.into() }
    }

    /// Use the process working directory.
    pub fn from_current_dir() -> Self {
        Self::new(std::env::current_dir().unwrap_or_default())
    }
}

impl Default for DefaultRewriteSources {
    fn default() -> Self {
        Self::from_current_dir()
    }
}

impl RewriteSources for DefaultRewriteSources {
    fn rewrite(&self, source: &str, _map: &Value) -> String {
        if let Some(m) = scheme_regex().find(source) {
            return source[m.end()..].to_string();
        }
        let path = Path::new(source);
        let rewritten = if path.is_absolute() {
            relative_to(path, &self.cwd)
        } else {
            normalize(path)
        };
        rewritten.to_string_lossy().into_owned()
    }
}

/// Lexically normalize a path: drop `.` and fold `..` into a preceding
/// normal component.
pub fn normalize(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }
    parts.iter().collect()
}

/// Lexical path of `path` relative to `base`.
pub fn relative_to(path: &Path, base: &Path) -> PathBuf {
    let path = normalize(path);
    let base = normalize(base);
    let path_parts: Vec<_> = path.components().collect();
    let base_parts: Vec<_> = base.components().collect();

    let common = path_parts
        .iter()
        .zip(&base_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let mut out = PathBuf::new();
    for _ in common..base_parts.len() {
        out.push("..");
    }
    for part in &path_parts[common..] {
        out.push(part.as_os_str());
    }
    out
}

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use shipmap_types::is_chunk_path;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{UploadError, UploadResult};

/// Resolve `patterns` into a sorted, deduplicated list of files.
///
/// A pattern naming an existing file is taken literally and a directory is
/// walked recursively. Anything else is a glob: only the directory named by
/// its literal prefix is walked, and each file there is matched in both its
/// `base_dir`-relative and absolute form. Absolute globs may point outside
/// `base_dir`. `ignore` globs apply to every candidate. Blocking; call from
/// `spawn_blocking` in async code.
pub fn discover_artifacts(patterns: &[String], ignore: &[String], base_dir: &Path) -> UploadResult<Vec<PathBuf>> {
    let ignore = build_globset(ignore)?;
    let mut found = BTreeSet::new();
    let mut roots: BTreeMap<PathBuf, Vec<String>> = BTreeMap::new();

    for pattern in patterns {
        let path = base_dir.join(pattern);
        if path.is_file() {
            found.insert(path);
        } else if path.is_dir() {
            found.extend(walk_files(&path));
        } else {
            let glob = pattern.strip_prefix("./").unwrap_or(pattern.as_str());
            roots.entry(glob_root(glob, base_dir)).or_default().push(glob.to_string());
        }
    }

    for (root, globs) in &roots {
        let Some(set) = build_globset(globs)? else {
            continue;
        };
        if !root.is_dir() {
            debug!(root = %root.display(), "glob root does not exist");
            continue;
        }
        for file in walk_files(root) {
            let relative = file.strip_prefix(base_dir).unwrap_or(&file);
            if set.is_match(relative) || set.is_match(&file) {
                found.insert(file);
            }
        }
    }

    let candidates: Vec<PathBuf> = found
        .into_iter()
        .filter(|path| !is_ignored(ignore.as_ref(), path, base_dir))
        .collect();
    debug!(
        patterns = patterns.len(),
        candidates = candidates.len(),
        base_dir = %base_dir.display(),
        "artifacts discovered"
    );
    Ok(candidates)
}

/// Keep only `.js`, `.mjs`, and `.cjs` files.
pub fn filter_chunks(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    paths.into_iter().filter(|p| is_chunk_path(p)).collect()
}

const GLOB_META: [char; 4] = ['*', '?', '[', '{'];

/// The directory named by the components of `pattern` before its first glob
/// metacharacter, resolved against `base_dir`.
fn glob_root(pattern: &str, base_dir: &Path) -> PathBuf {
    let literal: Vec<&str> = pattern
        .split('/')
        .take_while(|part| !part.contains(&GLOB_META[..]))
        .collect();
    let prefix = literal.join("/");
    if prefix.is_empty() && pattern.starts_with('/') {
        PathBuf::from("/")
    } else if prefix.is_empty() {
        base_dir.to_path_buf()
    } else {
        base_dir.join(prefix)
    }
}

fn walk_files(root: &Path) -> impl Iterator<Item = PathBuf> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!(error = %e, "skipping unreadable directory entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
}

fn is_ignored(ignore: Option<&GlobSet>, path: &Path, base_dir: &Path) -> bool {
    let Some(set) = ignore else {
        return false;
    };
    let relative = path.strip_prefix(base_dir).unwrap_or(path);
    set.is_match(relative) || set.is_match(path)
}

fn build_globset(patterns: &[String]) -> UploadResult<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }

    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|source| UploadError::Pattern {
                pattern: pattern.clone(),
                source,
            })?;
        builder.add(glob);
    }
    let set = builder.build().map_err(|source| UploadError::Pattern {
        pattern: patterns.join(", "),
        source,
    })?;
    Ok(Some(set))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        for name in [
            "dist/main.js",
            "dist/main.js.map",
            "dist/chunks/a.mjs",
            "dist/chunks/b.cjs",
            "dist/vendor/lib.js",
            "dist/index.html",
            "other/x.js",
        ] {
            let path = dir.path().join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "").unwrap();
        }
        dir
    }

    fn rel(base: &Path, paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.strip_prefix(base).unwrap().to_string_lossy().replace('\\', "/"))
            .collect()
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn literal_file_and_directory() {
        let dir = tree();
        let found = discover_artifacts(&strings(&["other/x.js", "dist/chunks"]), &[], dir.path()).unwrap();
        assert_eq!(rel(dir.path(), &found), vec!["dist/chunks/a.mjs", "dist/chunks/b.cjs", "other/x.js"]);
    }

    #[test]
    fn glob_patterns_match_relative_paths() {
        let dir = tree();
        let found = discover_artifacts(&strings(&["dist/**/*.js"]), &[], dir.path()).unwrap();
        assert_eq!(rel(dir.path(), &found), vec!["dist/main.js", "dist/vendor/lib.js"]);
    }

    #[test]
    fn single_star_does_not_cross_directories() {
        let dir = tree();
        let found = discover_artifacts(&strings(&["dist/*.js"]), &[], dir.path()).unwrap();
        assert_eq!(rel(dir.path(), &found), vec!["dist/main.js"]);
    }

    #[test]
    fn ignore_applies_to_all_candidates() {
        let dir = tree();
        let found = discover_artifacts(
            &strings(&["dist", "other/x.js"]),
            &strings(&["**/vendor/**", "other/*"]),
            dir.path(),
        )
        .unwrap();
        assert_eq!(
            rel(dir.path(), &found),
            vec![
                "dist/chunks/a.mjs",
                "dist/chunks/b.cjs",
                "dist/index.html",
                "dist/main.js",
                "dist/main.js.map",
            ]
        );
    }

    #[test]
    fn results_are_sorted_and_deduplicated() {
        let dir = tree();
        let found = discover_artifacts(&strings(&["dist/main.js", "dist/*.js", "dist"]), &[], dir.path()).unwrap();
        let mut sorted = found.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(found, sorted);
        assert_eq!(found.iter().filter(|p| p.ends_with("dist/main.js")).count(), 1);
    }

    #[test]
    fn filter_keeps_only_chunks() {
        let dir = tree();
        let found = filter_chunks(discover_artifacts(&strings(&["dist"]), &[], dir.path()).unwrap());
        assert_eq!(
            rel(dir.path(), &found),
            vec!["dist/chunks/a.mjs", "dist/chunks/b.cjs", "dist/main.js", "dist/vendor/lib.js"]
        );
    }

    #[test]
    fn invalid_glob_is_an_error() {
        let dir = tree();
        let err = discover_artifacts(&strings(&["dist/[.js"]), &[], dir.path()).unwrap_err();
        assert!(matches!(err, UploadError::Pattern { .. }));
    }

    #[test]
    fn absolute_glob_outside_base_dir() {
        let build = TempDir::new().unwrap();
        fs::create_dir_all(build.path().join("dist/nested")).unwrap();
        fs::write(build.path().join("dist/nested/app.js"), "").unwrap();
        fs::write(build.path().join("dist/app.css"), "").unwrap();
        let base = tree();

        let pattern = format!("{}/dist/**/*.js", build.path().display()).replace('\\', "/");
        let found = discover_artifacts(&[pattern], &[], base.path()).unwrap();
        assert_eq!(found, vec![build.path().join("dist/nested/app.js")]);
    }

    #[test]
    fn absolute_glob_inside_base_dir() {
        let dir = tree();
        let pattern = format!("{}/dist/*.js", dir.path().display()).replace('\\', "/");
        let found = discover_artifacts(&[pattern], &[], dir.path()).unwrap();
        assert_eq!(rel(dir.path(), &found), vec!["dist/main.js"]);
    }

    #[test]
    fn glob_root_stops_at_first_metacharacter() {
        let base = Path::new("/work");
        assert_eq!(glob_root("dist/**/*.js", base), base.join("dist"));
        assert_eq!(glob_root("dist/chunks/*.mjs", base), base.join("dist/chunks"));
        assert_eq!(glob_root("{dist,out}/*.js", base), base);
        assert_eq!(glob_root("**/*.map", base), base);
        assert_eq!(glob_root("/srv/app/dist/**/*.js", base), PathBuf::from("/srv/app/dist"));
        assert_eq!(glob_root("/**/*.js", base), PathBuf::from("/"));
    }

    #[test]
    fn leading_dot_slash_and_brace_globs() {
        let dir = tree();
        let found = discover_artifacts(&strings(&["./dist/*.js", "{dist,other}/*.js"]), &[], dir.path()).unwrap();
        assert_eq!(rel(dir.path(), &found), vec!["dist/main.js", "other/x.js"]);
    }

    #[test]
    fn no_match_is_empty() {
        let dir = tree();
        assert!(discover_artifacts(&strings(&["nothing/**/*.js"]), &[], dir.path())
            .unwrap()
            .is_empty());
    }
}

//! Filesystem scanning with ignore patterns.
//!
//! Stage 1 of the build pipeline. Walks a directory tree depth-first and
//! returns every file that does not match an ignore pattern, together with
//! its path relative to the scan root and its last-modified time.
//!
//! ## Ignore Patterns
//!
//! Patterns are regular expressions tested against the full path of each
//! *file*. Directories are never skipped directly — they always recurse — so
//! dot-directories are excluded by the [`DOT_FILES`] pattern matching any
//! path that contains a `/.` segment, not by special-casing the walk.
//!
//! A fixed pattern excluding the `public/` output directory is appended to
//! whatever patterns the caller supplies, so the generator never scans its
//! own previous output.
//!
//! ## Ready-Made Patterns
//!
//! The `regex` crate has no negative lookahead, so the "everything except
//! extension X" patterns enumerate the complementary suffixes instead. All
//! paths handed to the matcher are absolute, which guarantees at least one
//! `/` before the final segment.
//!
//! Scans are not cached: every call re-reads the tree. The watch loop relies
//! on this, comparing two full scan results for equality. Symlink cycles are
//! not detected.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::SystemTime;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

/// One file discovered by a scan.
///
/// `PartialEq` is derived so the watch loop can deep-compare two snapshots:
/// any added, removed, or touched file changes the listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ScannedFile {
    /// Absolute path of the file.
    pub path: PathBuf,
    /// Path relative to the scan root, `/`-prefixed (e.g. `/blog/post.md`).
    pub relative_path: String,
    /// Last-modified timestamp.
    pub modified_at: SystemTime,
}

/// Matches any path containing a dot-file or dot-directory segment.
pub static DOT_FILES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?:^|/)\.[^/]+").unwrap());

/// Matches any path that does not end in `.md`.
pub static NON_MARKDOWN_FILES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:[^d]|[^m]d|[^.]md)$").unwrap());

/// Matches any path that does not end in `.hbs`.
pub static NON_TEMPLATE_FILES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:[^s]|[^b]s|[^h]bs|[^.]hbs)$").unwrap());

/// Matches any path ending in `.md`.
pub static MARKDOWN_FILES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.md$").unwrap());

/// Matches any path ending in `.hbs`.
pub static TEMPLATE_FILES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.hbs$").unwrap());

/// Matches files inside the `_layouts/` or `_partials/` directories.
pub static TEMPLATE_DIRS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/(?:_layouts|_partials)/").unwrap());

/// Matches files inside the `public/` output directory. Always applied.
static PUBLIC_FILES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/public(?:/|$)").unwrap());

/// Does `path` match any of `patterns`?
pub fn ignore_path(path: &str, patterns: &[&Regex]) -> bool {
    patterns.iter().any(|p| p.is_match(path))
}

/// Recursively scan `root`, returning every file whose path matches none of
/// `patterns` (nor the built-in `public/` exclusion).
///
/// Depth-first with deterministic name ordering; a directory's contents are
/// fully listed before the walk moves on. An unreadable `root` or entry is a
/// hard error — scanning does not paper over I/O failures.
pub fn scan(root: &Path, patterns: &[&Regex]) -> Result<Vec<ScannedFile>, ScanError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_dir() {
            continue;
        }

        let path = entry.path();
        let path_str = path.to_string_lossy();

        if ignore_path(&path_str, patterns) || PUBLIC_FILES.is_match(&path_str) {
            continue;
        }

        // Walked entries are always under `root`.
        let relative = path.strip_prefix(root).unwrap();
        let modified_at = entry.metadata()?.modified()?;

        files.push(ScannedFile {
            path: path.to_path_buf(),
            relative_path: format!("/{}", relative.to_string_lossy()),
            modified_at,
        });
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    /// A tempdir whose own name has no dot segment, so the `DOT_FILES`
    /// pattern (matched against absolute paths) only sees dots inside the
    /// tree under test.
    fn tmpdir() -> TempDir {
        tempfile::Builder::new().prefix("babe-test").tempdir().unwrap()
    }

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "x").unwrap();
    }

    #[test]
    fn finds_every_file_once() {
        let tmp = tmpdir();
        touch(tmp.path(), "a.md");
        touch(tmp.path(), "blog/b.md");
        touch(tmp.path(), "blog/deep/c.md");

        let files = scan(tmp.path(), &[]).unwrap();
        let mut rels: Vec<&str> = files.iter().map(|f| f.relative_path.as_str()).collect();
        rels.sort();
        assert_eq!(rels, vec!["/a.md", "/blog/b.md", "/blog/deep/c.md"]);
    }

    #[test]
    fn dot_files_and_dot_directories_ignored() {
        let tmp = tmpdir();
        touch(tmp.path(), ".hidden");
        touch(tmp.path(), ".git/config");
        touch(tmp.path(), "visible.md");

        let files = scan(tmp.path(), &[&DOT_FILES]).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].relative_path, "/visible.md");
    }

    #[test]
    fn public_directory_always_excluded() {
        let tmp = tmpdir();
        touch(tmp.path(), "public/old/index.html");
        touch(tmp.path(), "post.md");

        let files = scan(tmp.path(), &[]).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].relative_path, "/post.md");
    }

    #[test]
    fn non_markdown_pattern_keeps_only_markdown() {
        let tmp = tmpdir();
        touch(tmp.path(), "post.md");
        touch(tmp.path(), "style.css");
        touch(tmp.path(), "feed.xml.hbs");
        touch(tmp.path(), "README");

        let files = scan(tmp.path(), &[&NON_MARKDOWN_FILES]).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].relative_path, "/post.md");
    }

    #[test]
    fn non_template_pattern_keeps_only_templates() {
        let tmp = tmpdir();
        touch(tmp.path(), "post.md");
        touch(tmp.path(), "feed.xml.hbs");

        let files = scan(tmp.path(), &[&NON_TEMPLATE_FILES]).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].relative_path, "/feed.xml.hbs");
    }

    #[test]
    fn template_dirs_pattern_excludes_layouts_and_partials() {
        let tmp = tmpdir();
        touch(tmp.path(), "_layouts/default.hbs");
        touch(tmp.path(), "_partials/head.hbs");
        touch(tmp.path(), "feed.xml.hbs");

        let files = scan(tmp.path(), &[&NON_TEMPLATE_FILES, &TEMPLATE_DIRS]).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].relative_path, "/feed.xml.hbs");
    }

    #[test]
    fn unreadable_root_is_an_error() {
        let tmp = tmpdir();
        let missing = tmp.path().join("nope");
        assert!(scan(&missing, &[]).is_err());
    }

    #[test]
    fn identical_trees_produce_equal_snapshots() {
        let tmp = tmpdir();
        touch(tmp.path(), "a.md");
        touch(tmp.path(), "b/c.md");

        let first = scan(tmp.path(), &[&DOT_FILES]).unwrap();
        let second = scan(tmp.path(), &[&DOT_FILES]).unwrap();
        assert_eq!(first, second);

        touch(tmp.path(), "d.md");
        let third = scan(tmp.path(), &[&DOT_FILES]).unwrap();
        assert_ne!(first, third);
    }
}

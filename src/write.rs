//! Output-path mapping and HTML persistence.
//!
//! Maps a source-relative path to its place under `public/` and writes the
//! rendered HTML there:
//!
//! - `/blog/post.md` → `public/blog/post/index.html` (directory-style URLs)
//! - `/feed.xml.hbs` → `public/feed.xml` (template extension stripped)
//! - anything else → no write at all
//!
//! Intermediate directories are created on demand; existing files are
//! overwritten unconditionally, so re-rendering identical input is
//! idempotent. Two source files mapping to the same output path silently
//! clobber each other — collisions are not detected.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Map a source-relative path to its output path under the public
/// directory. `None` for extensions the writer does not handle.
pub fn output_path(public_dir: &Path, relative_path: &str) -> Option<PathBuf> {
    let relative = relative_path.trim_start_matches('/');

    if let Some(stem) = relative.strip_suffix(".md") {
        return Some(public_dir.join(stem).join("index.html"));
    }
    if let Some(stem) = relative.strip_suffix(".hbs") {
        return Some(public_dir.join(stem));
    }
    None
}

/// Persist `html` at the mapped output path, creating parent directories as
/// needed. Returns the written path, or `None` when the source extension
/// has no mapping (in which case nothing is written).
pub fn write(
    public_dir: &Path,
    relative_path: &str,
    html: &str,
) -> Result<Option<PathBuf>, WriteError> {
    let Some(path) = output_path(public_dir, relative_path) else {
        return Ok(None);
    };

    let io = |source| WriteError::Write {
        path: path.clone(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io)?;
    }
    fs::write(&path, html).map_err(io)?;

    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn markdown_maps_to_directory_index() {
        let public = Path::new("/site/public");
        assert_eq!(
            output_path(public, "/blog/post.md"),
            Some(PathBuf::from("/site/public/blog/post/index.html"))
        );
    }

    #[test]
    fn template_maps_to_path_minus_extension() {
        let public = Path::new("/site/public");
        assert_eq!(
            output_path(public, "/feed.xml.hbs"),
            Some(PathBuf::from("/site/public/feed.xml"))
        );
    }

    #[test]
    fn other_extensions_have_no_mapping() {
        let public = Path::new("/site/public");
        assert_eq!(output_path(public, "/style.css"), None);
    }

    #[test]
    fn write_creates_intermediate_directories() {
        let tmp = TempDir::new().unwrap();
        let written = write(tmp.path(), "/blog/deep/post.md", "<p>hi</p>")
            .unwrap()
            .unwrap();
        assert_eq!(written, tmp.path().join("blog/deep/post/index.html"));
        assert_eq!(fs::read_to_string(written).unwrap(), "<p>hi</p>");
    }

    #[test]
    fn write_is_a_no_op_for_unmapped_extensions() {
        let tmp = TempDir::new().unwrap();
        let written = write(tmp.path(), "/style.css", "body {}").unwrap();
        assert!(written.is_none());
        assert!(fs::read_dir(tmp.path()).unwrap().next().is_none());
    }

    #[test]
    fn rewrite_overwrites_and_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let first = write(tmp.path(), "/post.md", "<p>one</p>").unwrap().unwrap();
        assert_eq!(fs::read_to_string(&first).unwrap(), "<p>one</p>");

        write(tmp.path(), "/post.md", "<p>two</p>").unwrap();
        assert_eq!(fs::read_to_string(&first).unwrap(), "<p>two</p>");

        write(tmp.path(), "/post.md", "<p>two</p>").unwrap();
        assert_eq!(fs::read_to_string(&first).unwrap(), "<p>two</p>");
    }
}

//! Template composition: layouts, freestanding templates, partials.
//!
//! Builds the minimal template set one render pass needs:
//!
//! 1. Every layout referenced by a content item's `layout` meta field, plus
//!    `default`, read from `_layouts/<name>.hbs`.
//! 2. Every freestanding `.hbs` template file, kept with its relative path
//!    so the writer can place its output.
//! 3. Every partial transitively referenced from any of the above, read
//!    from `_partials/<name>.hbs`.
//!
//! ## Partial Discovery
//!
//! Partial references are found textually (`{{> name}}`) and resolved to
//! closure: a partial's own body is scanned for further references. The
//! seen-name set is consulted *before* a candidate is enqueued, so a partial
//! that references itself — directly or through a cycle — terminates, and
//! every partial file is read exactly once per build run regardless of how
//! many templates mention it.
//!
//! A `layout` meta value naming a file that does not exist is a fatal
//! configuration error carrying the item's path; an unresolvable partial
//! reference is fatal and names the partial.

use crate::parse::ContentItem;
use crate::scan::ScannedFile;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("layout '{layout}' requested by {item} not found in _layouts/")]
    MissingLayout { layout: String, item: PathBuf },
    #[error("unresolvable partial '{name}' in _partials/")]
    MissingPartial { name: String },
}

/// A layout or freestanding template. `relative_path` is set only for
/// freestanding templates, which drive their own output location.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub name: String,
    pub relative_path: Option<String>,
    pub contents: String,
}

/// A named reusable template fragment from `_partials/`.
#[derive(Debug, Clone, PartialEq)]
pub struct Partial {
    pub name: String,
    pub contents: String,
}

/// Everything the renderer needs for one build run. Constructed once per
/// run and held immutably.
#[derive(Debug, Default)]
pub struct TemplateSet {
    layouts: HashMap<String, Layout>,
    /// Freestanding templates, each carrying its relative path.
    pub templates: Vec<Layout>,
    /// Transitive closure of referenced partials, each read once.
    pub partials: Vec<Partial>,
}

impl TemplateSet {
    /// Resolve the layout for a content item: its `layout` meta value, or
    /// `default` when none is declared.
    pub fn layout_for(&self, item: &ContentItem) -> Result<&Layout, TemplateError> {
        let name = item.layout().unwrap_or("default");
        self.layouts
            .get(name)
            .ok_or_else(|| TemplateError::MissingLayout {
                layout: name.to_string(),
                item: item.path.clone(),
            })
    }
}

/// Partial reference: `{{> name}}`, name trimmed of whitespace.
static PARTIAL_REF: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{\{>\s*([\w-]+)").unwrap());

const LAYOUTS_DIR: &str = "_layouts";
const PARTIALS_DIR: &str = "_partials";
const TEMPLATE_EXT: &str = "hbs";

/// Compose the template set for one build run: resolve every layout the
/// items need, read every freestanding template, then walk the partial
/// reference graph to closure.
pub fn compose(
    base_dir: &Path,
    items: &[ContentItem],
    template_files: &[ScannedFile],
) -> Result<TemplateSet, TemplateError> {
    let mut set = TemplateSet::default();

    for file in template_files {
        set.templates.push(Layout {
            name: template_name(&file.relative_path),
            relative_path: Some(file.relative_path.clone()),
            contents: fs::read_to_string(&file.path)?,
        });
    }

    resolve_layouts(base_dir, items, &mut set)?;
    discover_partials(base_dir, &mut set)?;

    Ok(set)
}

/// Read every distinct layout named by the items, plus `default`. The error
/// for a missing layout file carries the path of the first item that asked
/// for it (`default` is attributed to the first item without an explicit
/// layout, or the base directory when every item declares one).
fn resolve_layouts(
    base_dir: &Path,
    items: &[ContentItem],
    set: &mut TemplateSet,
) -> Result<(), TemplateError> {
    let mut wanted: Vec<(String, PathBuf)> = vec![("default".to_string(), base_dir.to_path_buf())];
    for item in items {
        let name = item.layout().unwrap_or("default");
        if !wanted.iter().any(|(n, _)| n == name) {
            wanted.push((name.to_string(), item.path.clone()));
        } else if name == "default" && wanted[0].1 == base_dir {
            wanted[0].1 = item.path.clone();
        }
    }

    for (name, item) in wanted {
        let path = base_dir
            .join(LAYOUTS_DIR)
            .join(format!("{name}.{TEMPLATE_EXT}"));
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(TemplateError::MissingLayout { layout: name, item });
            }
            Err(e) => return Err(e.into()),
        };
        set.layouts.insert(
            name.clone(),
            Layout {
                name,
                relative_path: None,
                contents,
            },
        );
    }

    Ok(())
}

/// Walk the textual partial reference graph to closure. `seen` is updated
/// when a candidate is *enqueued*, never on emission, which is what makes
/// self-references and longer cycles terminate.
fn discover_partials(base_dir: &Path, set: &mut TemplateSet) -> Result<(), TemplateError> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut queue: Vec<String> = Vec::new();

    let roots = set
        .templates
        .iter()
        .map(|t| t.contents.as_str())
        .chain(set.layouts.values().map(|l| l.contents.as_str()));
    for contents in roots {
        for name in partial_refs(contents) {
            if seen.insert(name.clone()) {
                queue.push(name);
            }
        }
    }

    while let Some(name) = queue.pop() {
        let path = base_dir
            .join(PARTIALS_DIR)
            .join(format!("{name}.{TEMPLATE_EXT}"));
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(TemplateError::MissingPartial { name });
            }
            Err(e) => return Err(e.into()),
        };

        for candidate in partial_refs(&contents) {
            if seen.insert(candidate.clone()) {
                queue.push(candidate);
            }
        }

        set.partials.push(Partial { name, contents });
    }

    Ok(())
}

/// Every partial name referenced in `contents`, in order of appearance.
fn partial_refs(contents: &str) -> Vec<String> {
    PARTIAL_REF
        .captures_iter(contents)
        .map(|c| c[1].trim().to_string())
        .collect()
}

/// Name of a freestanding template: file stem without the `.hbs` suffix,
/// e.g. `/feed.xml.hbs` → `feed.xml`.
fn template_name(relative_path: &str) -> String {
    let name = relative_path.rsplit('/').next().unwrap_or(relative_path);
    name.strip_suffix(".hbs").unwrap_or(name).to_string()
}

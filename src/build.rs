//! The build orchestrator: one full pass from source tree to `public/`.
//!
//! Sequences the pipeline stages: load config → evaluate dynamic queries →
//! parse all content → compose templates → render and write every content
//! item and freestanding template → copy static assets. Every run is a full
//! rebuild; nothing is cached between runs.
//!
//! All per-run state lives in a [`BuildContext`] constructed once per run
//! and passed by reference — there are no process-wide globals, which is
//! what lets the watch loop rebuild with a fresh context each time.
//!
//! ## Render Data
//!
//! A content item renders against its own flattened fields, the global data
//! (static config plus the evaluated dynamic collections — global keys win
//! on collision), and a synthesized `is_<slug>` flag where the slug is the
//! relative path with separators replaced by underscores and the extension
//! stripped. Freestanding templates get the global data and their own flag.
//!
//! Page renders run in parallel with rayon: every page writes a distinct
//! output file, so the only shared state is the read-only template set.
//! Two *sources* mapping to one output path still clobber silently — that
//! collision is unguarded.

use crate::config::{self, Config, ConfigError};
use crate::content::{self, ContentError, ContentSet};
use crate::parse::ContentItem;
use crate::render::{RenderError, Renderer};
use crate::scan::{
    self, DOT_FILES, MARKDOWN_FILES, NON_TEMPLATE_FILES, ScanError, TEMPLATE_DIRS, TEMPLATE_FILES,
};
use crate::template::{self, TemplateError, TemplateSet};
use crate::write::{self, WriteError};
use rayon::prelude::*;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Write(#[from] WriteError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Per-run state: base directory, output directory, loaded config.
#[derive(Debug)]
pub struct BuildContext {
    pub base_dir: PathBuf,
    pub public_dir: PathBuf,
    pub config: Config,
}

impl BuildContext {
    /// Load the config and fix the output directory for one run.
    pub fn new(base_dir: &Path) -> Result<Self, BuildError> {
        Ok(Self {
            base_dir: base_dir.to_path_buf(),
            public_dir: base_dir.join("public"),
            config: config::load(base_dir)?,
        })
    }
}

/// What one run produced, for console reporting.
#[derive(Debug, Default)]
pub struct BuildStats {
    /// Output paths written for content items.
    pub pages: Vec<PathBuf>,
    /// Output paths written for freestanding templates.
    pub templates: Vec<PathBuf>,
    /// Number of asset files copied verbatim.
    pub assets: usize,
}

/// Run one full build.
pub fn run(ctx: &BuildContext) -> Result<BuildStats, BuildError> {
    let dynamic = content::evaluate_all(&ctx.base_dir, &ctx.config.dynamic)?;
    let global = global_data(&ctx.config, &dynamic)?;

    let items = content::all(&ctx.base_dir)?;
    let template_files = scan::scan(&ctx.base_dir, &[&NON_TEMPLATE_FILES, &TEMPLATE_DIRS])?;
    let set = template::compose(&ctx.base_dir, &items, &template_files)?;
    let renderer = Renderer::new(&set.partials)?;

    let mut stats = BuildStats::default();

    stats.pages = items
        .par_iter()
        .map(|item| render_item(ctx, &set, &renderer, &global, item))
        .collect::<Result<Vec<_>, BuildError>>()?
        .into_iter()
        .flatten()
        .collect();

    for template in &set.templates {
        // Composed freestanding templates always carry a relative path.
        let relative = template.relative_path.as_deref().unwrap();
        let mut data = global.clone();
        data.insert(flag_name(relative), Value::Bool(true));
        let html = renderer.render(template, &Value::Object(data))?;
        if let Some(path) = write::write(&ctx.public_dir, relative, &html)? {
            stats.templates.push(path);
        }
    }

    stats.assets = copy_assets(ctx)?;

    Ok(stats)
}

fn render_item(
    ctx: &BuildContext,
    set: &TemplateSet,
    renderer: &Renderer,
    global: &Map<String, Value>,
    item: &ContentItem,
) -> Result<Option<PathBuf>, BuildError> {
    let layout = set.layout_for(item)?;
    let data = page_data(item, global)?;
    let html = renderer.render(layout, &data)?;
    Ok(write::write(&ctx.public_dir, &item.relative_path, &html)?)
}

/// Static config merged with the evaluated dynamic collections. Dynamic
/// names shadow static keys of the same name.
fn global_data(
    config: &Config,
    dynamic: &BTreeMap<String, ContentSet>,
) -> Result<Map<String, Value>, BuildError> {
    let mut global = config.static_data.clone();
    for (name, set) in dynamic {
        global.insert(name.clone(), serde_json::to_value(set)?);
    }
    Ok(global)
}

/// Item fields, then global data (which wins on collision), then the
/// item's `is_<slug>` flag.
fn page_data(item: &ContentItem, global: &Map<String, Value>) -> Result<Value, BuildError> {
    let mut data = match serde_json::to_value(item)? {
        Value::Object(map) => map,
        _ => unreachable!("content items serialize as objects"),
    };
    for (key, value) in global {
        data.insert(key.clone(), value.clone());
    }
    data.insert(flag_name(&item.relative_path), Value::Bool(true));
    Ok(Value::Object(data))
}

/// `is_` flag for a relative path: separators become underscores, the
/// extension is stripped. `/blog/post.md` → `is_blog_post`.
fn flag_name(relative_path: &str) -> String {
    let trimmed = relative_path.trim_start_matches('/');
    let stem = trimmed
        .strip_suffix(".md")
        .or_else(|| trimmed.strip_suffix(".hbs"))
        .unwrap_or(trimmed);
    format!("is_{}", stem.replace('/', "_"))
}

/// Copy every remaining file — not a dot file, not Markdown, not a
/// template, not under `public/` — verbatim into the output tree,
/// preserving its relative path. The config files themselves are never
/// published: `local.babe.json` is a machine-local override and may hold
/// things that should not end up on the site.
fn copy_assets(ctx: &BuildContext) -> Result<usize, BuildError> {
    let assets = scan::scan(
        &ctx.base_dir,
        &[&DOT_FILES, &MARKDOWN_FILES, &TEMPLATE_FILES],
    )?;
    let config_files = [
        format!("/{}", config::CONFIG_FILE),
        format!("/{}", config::LOCAL_CONFIG_FILE),
    ];

    let mut copied = 0;
    for asset in &assets {
        if config_files.contains(&asset.relative_path) {
            continue;
        }
        let dest = ctx
            .public_dir
            .join(asset.relative_path.trim_start_matches('/'));
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&asset.path, &dest)?;
        copied += 1;
    }

    Ok(copied)
}

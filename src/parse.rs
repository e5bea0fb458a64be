//! Markdown parsing: front matter, body HTML, computed fields.
//!
//! Stage 2 of the build pipeline. Takes the scanner's file listing and turns
//! each Markdown file into a [`ContentItem`]: a typed metadata map plus the
//! body rendered to HTML, enriched with a `slug` and an estimated
//! `time_to_read`.
//!
//! ## Front Matter
//!
//! A leading block delimited by `---` lines:
//!
//! ```text
//! ---
//! title: Hello
//! published: true
//! date: 2020-01-02
//! ---
//! Body starts here.
//! ```
//!
//! Lines split on the *first* colon, so values may contain colons. Values
//! are typed: literal `true`/`false` become booleans, `YYYY-MM-DD` values
//! become dates, everything else stays a trimmed string. A block without a
//! closing `---` is treated as "no metadata", never as a hard failure.
//!
//! Filtering non-Markdown files is the scanner's job (ignore patterns), not
//! the parser's — every file handed in is read and parsed.

use crate::scan::ScannedFile;
use chrono::NaiveDate;
use indexmap::IndexMap;
use pulldown_cmark::{Parser, html};
use regex::Regex;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fs;
use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::SystemTime;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// A typed front-matter value.
#[derive(Debug, Clone, PartialEq)]
pub enum MetaValue {
    Str(String),
    Bool(bool),
    Date(NaiveDate),
}

impl MetaValue {
    /// String form used for sorting and grouping. Dates render as ISO
    /// `YYYY-MM-DD`, so lexicographic order equals chronological order.
    pub fn as_key(&self) -> String {
        match self {
            MetaValue::Str(s) => s.clone(),
            MetaValue::Bool(b) => b.to_string(),
            MetaValue::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetaValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl Serialize for MetaValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MetaValue::Str(s) => serializer.serialize_str(s),
            MetaValue::Bool(b) => serializer.serialize_bool(*b),
            MetaValue::Date(d) => serializer.serialize_str(&d.format("%Y-%m-%d").to_string()),
        }
    }
}

/// Front-matter metadata, insertion-ordered. Duplicate keys overwrite the
/// earlier value but keep the original position.
pub type Meta = IndexMap<String, MetaValue>;

/// A parsed content file: scanner fields plus rendered body and metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentItem {
    /// Absolute path of the source file.
    pub path: PathBuf,
    /// Path relative to the scan root, `/`-prefixed.
    pub relative_path: String,
    /// Last-modified timestamp of the source file.
    pub modified_at: SystemTime,
    /// Body rendered to HTML.
    pub entry: String,
    /// Relative path with separators and the `.md` suffix stripped.
    /// Unique only if source filenames are unique — collisions are not
    /// detected.
    pub slug: String,
    /// `ceil(word count of entry / 225)`, as a string.
    pub time_to_read: String,
    /// Typed front-matter fields.
    pub meta: Meta,
}

impl ContentItem {
    /// The layout name this item requests, if any.
    pub fn layout(&self) -> Option<&str> {
        self.meta.get("layout").and_then(MetaValue::as_str)
    }
}

/// Items serialize in their flattened form: the fixed fields plus every
/// meta key spread onto the top level, which is what templates consume.
/// Meta keys are serialized last, so a meta field can shadow a computed one.
impl Serialize for ContentItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("relative_path", &self.relative_path)?;
        map.serialize_entry("entry", &self.entry)?;
        map.serialize_entry("slug", &self.slug)?;
        map.serialize_entry("time_to_read", &self.time_to_read)?;
        for (key, value) in &self.meta {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Leading front-matter block: `---`, a non-greedy multi-line body, `---`.
static FRONT_MATTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^---\r?\n(?s)(.*?)\r?\n---").unwrap());

/// ISO date guard for front-matter value typing.
static ISO_DATE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());

const WORDS_PER_MINUTE: usize = 225;

/// Parse every scanned file into a content item, one-to-one.
///
/// Read failures are fatal and carry the offending path.
pub fn parse(files: &[ScannedFile]) -> Result<Vec<ContentItem>, ParseError> {
    files.iter().map(parse_file).collect()
}

fn parse_file(file: &ScannedFile) -> Result<ContentItem, ParseError> {
    let raw = fs::read_to_string(&file.path).map_err(|source| ParseError::Read {
        path: file.path.clone(),
        source,
    })?;

    let (meta, body) = split_front_matter(&raw);
    let entry = markdown_to_html(body);
    let slug = slug_of(&file.relative_path);
    let time_to_read = time_to_read(&entry);

    Ok(ContentItem {
        path: file.path.clone(),
        relative_path: file.relative_path.clone(),
        modified_at: file.modified_at,
        entry,
        slug,
        time_to_read,
        meta,
    })
}

/// Split `raw` into (metadata, body). A missing or unterminated block
/// yields empty metadata and the full text as body.
fn split_front_matter(raw: &str) -> (Meta, &str) {
    match FRONT_MATTER.captures(raw) {
        Some(caps) => {
            let block = caps.get(1).unwrap().as_str();
            let body = &raw[caps.get(0).unwrap().end()..];
            (parse_meta_block(block), body)
        }
        None => (Meta::new(), raw),
    }
}

/// Parse `key: value` lines. Splits on the first colon only; lines without
/// a colon are skipped.
fn parse_meta_block(block: &str) -> Meta {
    let mut meta = Meta::new();
    for line in block.lines() {
        if let Some((key, value)) = line.split_once(':') {
            meta.insert(key.trim().to_string(), type_value(value));
        }
    }
    meta
}

/// Type a raw front-matter value: literal booleans, ISO dates, else string.
/// A value that looks like a date but is impossible (e.g. `2020-13-99`)
/// falls back to a string.
fn type_value(raw: &str) -> MetaValue {
    let value = raw.trim();
    match value {
        "true" => MetaValue::Bool(true),
        "false" => MetaValue::Bool(false),
        _ if ISO_DATE.is_match(value) => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(MetaValue::Date)
            .unwrap_or_else(|_| MetaValue::Str(value.to_string())),
        _ => MetaValue::Str(value.to_string()),
    }
}

fn markdown_to_html(body: &str) -> String {
    let parser = Parser::new(body.trim_start());
    let mut out = String::new();
    html::push_html(&mut out, parser);
    out
}

/// Relative path with directory separators and the `.md` suffix stripped:
/// `/blog/post.md` → `blogpost`, `/about.md` → `about`.
fn slug_of(relative_path: &str) -> String {
    let flat = relative_path.replace('/', "");
    flat.strip_suffix(".md").unwrap_or(&flat).to_string()
}

/// Estimated reading time in whole minutes, as a string.
fn time_to_read(entry: &str) -> String {
    let words = entry.split_whitespace().count();
    words.div_ceil(WORDS_PER_MINUTE).to_string()
}

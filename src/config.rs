//! Site configuration: `babe.json` with a `local.babe.json` override.
//!
//! One JSON document with two sections:
//!
//! ```json
//! {
//!   "static": { "site_name": "My Blog", "author": "Me" },
//!   "dynamic": {
//!     "posts": { "from": "blog", "sortBy": "date", "order": "desc" }
//!   }
//! }
//! ```
//!
//! `static` is arbitrary nested data merged verbatim into every render's
//! data object. `dynamic` maps collection names to [`DynamicQuery`]
//! definitions evaluated once per build run.
//!
//! `local.babe.json`, when present, takes precedence over `babe.json` —
//! handy for machine-local overrides that stay out of version control.
//! Neither file existing is not an error: the config is simply empty.
//! A file that exists but fails to parse *is* an error; silently building
//! without the intended config would be worse.

use crate::content::DynamicQuery;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

pub const CONFIG_FILE: &str = "babe.json";
pub const LOCAL_CONFIG_FILE: &str = "local.babe.json";

/// Parsed site configuration. Both sections default to empty. Unrecognized
/// top-level keys are ignored; unknown keys inside a query are an error
/// (almost always a typo'd `sortBy`/`groupBy`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Data merged verbatim into every render.
    #[serde(rename = "static", default)]
    pub static_data: Map<String, Value>,
    /// Named dynamic-content queries.
    #[serde(default)]
    pub dynamic: BTreeMap<String, DynamicQuery>,
}

/// Load the configuration for `base_dir`: `local.babe.json` if present,
/// else `babe.json`, else empty.
pub fn load(base_dir: &Path) -> Result<Config, ConfigError> {
    for name in [LOCAL_CONFIG_FILE, CONFIG_FILE] {
        let path = base_dir.join(name);
        if !path.exists() {
            continue;
        }
        let raw = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        return serde_json::from_str(&raw).map_err(|source| ConfigError::Json { path, source });
    }

    Ok(Config::default())
}

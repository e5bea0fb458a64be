//! # babe
//!
//! A tiny static site generator: Markdown content with front matter,
//! Handlebars templates, one JSON config. Point it at a directory and it
//! produces a `public/` tree of plain HTML.
//!
//! # Architecture: One-Way Pipeline
//!
//! Every build is a full rebuild flowing strictly one direction:
//!
//! ```text
//! scan → parse → content (dynamic DSL) → template → render → write
//! ```
//!
//! The scanner lists files, the parser turns Markdown into typed content
//! items, the content module evaluates the declarative collection queries
//! from the config, the template composer gathers exactly the layouts and
//! partials those items need, and the renderer hands everything to
//! Handlebars before the writer maps each source path into `public/`.
//! There is no caching and no partial invalidation — the watch loop just
//! reruns the whole thing when the source tree changes. For the site sizes
//! this targets, a full rebuild is fast enough that incrementality would
//! only buy complexity.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Recursive file scanner with regex ignore patterns |
//! | [`parse`] | Front-matter + Markdown parsing into content items |
//! | [`content`] | Dynamic-content DSL: sort, limit, group |
//! | [`template`] | Layout resolution and transitive partial discovery |
//! | [`render`] | Handlebars boundary: helpers, partials, compilation |
//! | [`write`] | Source-path → output-path mapping and persistence |
//! | [`build`] | Orchestrator: `BuildContext` and the full-rebuild pass |
//! | [`watch`] | Polling loop that rebuilds on any source change |
//! | [`config`] | `babe.json` / `local.babe.json` loading |
//! | [`output`] | Console output formatting |
//!
//! # Design Decisions
//!
//! ## Typed Metadata, Tagged Results
//!
//! Front-matter values are a closed variant ([`parse::MetaValue`]: string,
//! boolean, date) rather than free-form JSON, and a content query returns a
//! tagged [`content::ContentSet`] — flat or grouped — so callers are forced
//! to handle both shapes explicitly instead of sniffing the structure.
//!
//! ## No Globals
//!
//! All per-run state (base directory, config, composed templates, the
//! Handlebars registry) lives in values constructed once per run and passed
//! by reference. The watch loop rebuilds by making a fresh
//! [`build::BuildContext`], never by resetting shared state.
//!
//! ## Cycle-Safe Partial Discovery
//!
//! Partials are discovered by textually scanning templates for `{{> name}}`
//! references and walking that graph to closure. The seen-name set is
//! consulted before a candidate is enqueued, so self-referencing or
//! mutually-referencing partials terminate and each partial file is read
//! exactly once per run.

pub mod build;
pub mod config;
pub mod content;
pub mod output;
pub mod parse;
pub mod render;
pub mod scan;
pub mod template;
pub mod watch;
pub mod write;

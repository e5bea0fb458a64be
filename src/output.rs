//! Console output formatting.
//!
//! Each `format_*` function is pure (returns strings, no I/O) so the output
//! shape is testable; the `print_*` wrappers write to stdout. The build
//! prints one `Writing:` line per output file followed by a summary:
//!
//! ```text
//! • Writing: public/blog/first-post/index.html
//! • Writing: public/feed.xml
//! Built 1 page, 1 template, 3 assets
//! ```

use crate::build::BuildStats;
use std::path::Path;

/// One line per written output file.
pub fn format_written(path: &Path) -> String {
    format!("• Writing: {}", path.display())
}

/// Summary line for one build run.
pub fn format_build_summary(stats: &BuildStats) -> String {
    format!(
        "Built {}, {}, {}",
        plural(stats.pages.len(), "page"),
        plural(stats.templates.len(), "template"),
        plural(stats.assets, "asset"),
    )
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("1 {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

/// Print the full per-file trail and summary for one build run.
pub fn print_build(stats: &BuildStats) {
    for path in stats.pages.iter().chain(&stats.templates) {
        println!("{}", format_written(path));
    }
    println!("{}", format_build_summary(stats));
}

/// Watch-mode heartbeat.
pub fn print_watching() {
    println!("Watching ...");
}

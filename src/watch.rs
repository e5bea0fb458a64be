//! Polling watch loop: rebuild on any source-tree change.
//!
//! Every poll tick takes a full scan snapshot of the source tree (dot files
//! and `public/` ignored) and deep-compares it against the previous one —
//! paths and modification times both count. Any difference triggers a
//! complete rebuild with a fresh [`BuildContext`]; there is no partial
//! invalidation.
//!
//! The loop is single-threaded and cooperative: at most one rebuild runs at
//! a time, and changes that land mid-rebuild are picked up on the next poll
//! tick rather than spawning an overlapping rebuild. A failed rebuild (or a
//! failed scan) is reported and polling continues — the watcher never
//! terminates on a build error.
//!
//! Each tick rescans the whole tree, so the cost per tick is proportional
//! to the tree size. Good enough for the site sizes this targets.

use crate::build::{self, BuildContext};
use crate::output;
use crate::scan::{self, DOT_FILES, ScanError, ScannedFile};
use std::path::Path;
use std::thread;
use std::time::Duration;

/// One comparable listing of the source tree.
fn snapshot(base_dir: &Path) -> Result<Vec<ScannedFile>, ScanError> {
    scan::scan(base_dir, &[&DOT_FILES])
}

/// Poll `base_dir` at `interval` forever, rebuilding on every change.
pub fn watch(base_dir: &Path, interval: Duration) -> ! {
    output::print_watching();

    let mut previous = snapshot(base_dir).ok();

    loop {
        thread::sleep(interval);

        let next = match snapshot(base_dir) {
            Ok(next) => next,
            Err(e) => {
                eprintln!("Scan failed: {e}");
                continue;
            }
        };

        if previous.as_ref() == Some(&next) {
            continue;
        }

        rebuild(base_dir);
        previous = Some(next);
        output::print_watching();
    }
}

/// One full rebuild with a fresh context. Failures are reported, never
/// propagated — the watch loop outlives them.
fn rebuild(base_dir: &Path) {
    match BuildContext::new(base_dir).and_then(|ctx| build::run(&ctx)) {
        Ok(stats) => output::print_build(&stats),
        Err(e) => eprintln!("Build failed: {e}"),
    }
}

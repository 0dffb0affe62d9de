// SPDX-License-Identifier: MIT

//! Source-file discovery shared by the strategic (complexity) and
//! security subchecks (§4.5): files over 1 MiB are skipped, and the
//! final list is capped at 50. When more candidates exist than the
//! cap, a seeded shuffle picks the sample -- the only place seeded
//! non-determinism is allowed to touch cross-validation (§4.5
//! "Cross-validation", property 9).

use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

pub const MAX_FILE_BYTES: u64 = 1024 * 1024;
pub const MAX_FILES: usize = 50;

const SKIP_DIRS: &[&str] = &[".git", ".trellis", "node_modules", "target", "dist", "build", ".venv"];

/// Collect up to [`MAX_FILES`] source files under `root`, each no
/// larger than [`MAX_FILE_BYTES`]. `seed` selects the sample when more
/// than [`MAX_FILES`] candidates exist; without a seed the first
/// [`MAX_FILES`] in deterministic (sorted) path order are used.
pub fn collect_source_files(root: &Path, seed: Option<u64>) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    walk(root, &mut candidates);
    candidates.sort();

    if candidates.len() <= MAX_FILES {
        return candidates;
    }
    match seed {
        Some(seed) => {
            let mut rng = StdRng::seed_from_u64(seed);
            candidates.shuffle(&mut rng);
            candidates.truncate(MAX_FILES);
            candidates.sort();
            candidates
        }
        None => {
            candidates.truncate(MAX_FILES);
            candidates
        }
    }
}

fn walk(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if file_type.is_dir() {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if SKIP_DIRS.contains(&name.as_ref()) {
                continue;
            }
            walk(&path, out);
        } else if file_type.is_file() {
            if let Ok(meta) = entry.metadata() {
                if meta.len() <= MAX_FILE_BYTES {
                    out.push(path);
                }
            }
        }
    }
}

pub fn line_count(path: &Path) -> usize {
    std::fs::read_to_string(path)
        .map(|text| text.lines().count())
        .unwrap_or(0)
}

#[cfg(test)]
#[path = "files_tests.rs"]
mod tests;

//! Test-cloud runner discovery
//!
//! The runner ships inside the restored test package, at a versioned path
//! under the workspace. Absence is fatal: without the runner nothing can be
//! submitted.

use std::path::{Path, PathBuf};

use tracing::debug;

use gantry_core::error::SubmissionError;

/// Versioned installation path pattern, relative to the search root.
const RUNNER_PATTERN: &str = "**/packages/Xamarin.UITest.*/tools/test-cloud.exe";

/// Locate the runner executable under the workspace tree. When several
/// package versions are restored the last match in sorted order wins
/// (the highest version).
pub fn locate_runner(search_root: &Path) -> Result<PathBuf, SubmissionError> {
    let pattern = format!("{}/{}", search_root.display(), RUNNER_PATTERN);

    let mut matches: Vec<PathBuf> = glob::glob(&pattern)
        .map_err(|err| SubmissionError::RunnerNotFound(format!("{pattern}: {err}")))?
        .filter_map(|p| p.ok())
        .collect();
    matches.sort();

    debug!(pattern = %pattern, count = matches.len(), "runner candidates");
    matches
        .pop()
        .ok_or(SubmissionError::RunnerNotFound(pattern))
}

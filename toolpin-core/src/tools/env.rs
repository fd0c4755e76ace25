//! Environment helpers for probing installed tools.
//!
//! Script-based tools (Yarn's `bin/yarn` is a shell script that runs
//! `node`) only work when the runtime they were installed next to is on the
//! `PATH`, so probes run with the public bin directory prepended.

use anyhow::{Context, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Prepends `dir` to an existing PATH value.
///
/// When `existing` is `None`, the current process `PATH` is used.
pub fn prepend_to_path(dir: &Path, existing: Option<&OsString>) -> Result<OsString> {
    let base = match existing {
        Some(value) => value.clone(),
        None => std::env::var_os("PATH").unwrap_or_default(),
    };

    let mut dirs: Vec<PathBuf> = vec![dir.to_path_buf()];
    dirs.extend(std::env::split_paths(&base).filter(|p| p.as_path() != dir));

    std::env::join_paths(dirs)
        .with_context(|| format!("Cannot add {} to PATH", dir.display()))
}

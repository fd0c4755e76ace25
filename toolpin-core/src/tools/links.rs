//! Entry points in the public bin directory.
//!
//! Unix gets symbolic links to the unpacked executables; Windows gets `.cmd`
//! shims that forward their arguments. Existing entries of the same name are
//! always replaced.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::catalog::EntryPoint;
use super::extractor::make_executable;

/// Creates or refreshes every entry point, returning the created paths.
///
/// # Errors
///
/// Fails if a target is missing from the tool directory or an entry cannot
/// be written.
pub fn link_entry_points(
    entry_points: &[EntryPoint],
    tool_dir: &Path,
    bin_dir: &Path,
    windows_shims: bool,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(bin_dir)
        .with_context(|| format!("Failed to create directory: {}", bin_dir.display()))?;

    let mut created = Vec::with_capacity(entry_points.len());

    for entry_point in entry_points {
        let target = tool_dir.join(entry_point.target);
        if target.symlink_metadata().is_err() {
            anyhow::bail!(
                "Expected executable {} is missing from {}",
                entry_point.target,
                tool_dir.display()
            );
        }

        let link = bin_dir.join(entry_point.name);
        remove_existing(&link)?;

        if windows_shims {
            write_cmd_shim(&target, &link)?;
        } else {
            make_executable(&target)?;
            create_link(&target, &link)?;
        }

        debug!("Linked {} -> {}", link.display(), target.display());
        created.push(link);
    }

    Ok(created)
}

fn remove_existing(path: &Path) -> Result<()> {
    let removed = match path.symlink_metadata() {
        Ok(metadata) if metadata.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(_) => return Ok(()),
    };
    removed.with_context(|| format!("Failed to replace {}", path.display()))
}

/// Renders a batch shim forwarding all arguments to `target`.
fn cmd_shim(target: &Path) -> String {
    format!("@ECHO OFF\r\n\"{}\" %*\r\n", target.display())
}

fn write_cmd_shim(target: &Path, link: &Path) -> Result<()> {
    fs::write(link, cmd_shim(target))
        .with_context(|| format!("Failed to write shim {}", link.display()))
}

#[cfg(unix)]
fn create_link(target: &Path, link: &Path) -> Result<()> {
    std::os::unix::fs::symlink(target, link)
        .with_context(|| format!("Failed to create symlink {}", link.display()))
}

#[cfg(not(unix))]
fn create_link(target: &Path, link: &Path) -> Result<()> {
    fs::copy(target, link)
        .map(|_| ())
        .with_context(|| format!("Failed to copy {} to {}", target.display(), link.display()))
}

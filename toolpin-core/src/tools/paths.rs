//! Install directory resolution.
//!
//! Installers write into exactly two host-supplied directories:
//!
//! - the tool-storage directory, holding one unpacked distribution per tool
//!   (`{storage}/node/`, `{storage}/yarn/`) plus transient downloads
//!   (`{storage}/node.tar.gz`)
//! - the public bin directory, holding the entry points the rest of the build
//!   invokes (`{bin}/node`, `{bin}/yarn`, ...)

use anyhow::{Context, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use super::env::prepend_to_path;
use super::types::{ArchiveFormat, ToolId};

// ============================================================================
// Install Context
// ============================================================================

/// The directories one run installs into.
///
/// Immutable once constructed. Construction does not touch the filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallContext {
    tool_storage_dir: PathBuf,
    public_bin_dir: PathBuf,
}

impl InstallContext {
    /// Creates a context, resolving relative paths against the current
    /// working directory.
    pub fn new(tool_storage_dir: impl Into<PathBuf>, public_bin_dir: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            tool_storage_dir: absolutize(tool_storage_dir.into())?,
            public_bin_dir: absolutize(public_bin_dir.into())?,
        })
    }

    /// Returns the private tool-storage directory.
    pub fn tool_storage_dir(&self) -> &Path {
        &self.tool_storage_dir
    }

    /// Returns the public executable directory.
    pub fn public_bin_dir(&self) -> &Path {
        &self.public_bin_dir
    }

    /// Returns the directory a tool's distribution is unpacked into.
    ///
    /// Path: `{storage}/{tool}/`
    pub fn tool_dir(&self, tool: ToolId) -> PathBuf {
        self.tool_storage_dir.join(tool.as_str())
    }

    /// Returns the temporary download location for a tool's archive.
    ///
    /// Path: `{storage}/{tool}.{ext}`
    pub fn archive_path(&self, tool: ToolId, format: ArchiveFormat) -> PathBuf {
        self.tool_storage_dir
            .join(format!("{}.{}", tool.as_str(), format.extension()))
    }

    /// Returns the path of an entry point in the public bin directory.
    pub fn entry_point(&self, name: &str) -> PathBuf {
        self.public_bin_dir.join(name)
    }

    /// Returns the process `PATH` with the public bin directory in front.
    pub fn search_path(&self) -> Result<OsString> {
        prepend_to_path(&self.public_bin_dir, None)
    }

    /// Ensures both directories exist.
    ///
    /// # Errors
    ///
    /// Returns an error if any directory cannot be created (e.g., permission issues).
    pub fn ensure_dirs_exist(&self) -> Result<()> {
        for dir in [&self.tool_storage_dir, &self.public_bin_dir] {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }

        Ok(())
    }
}

fn absolutize(path: PathBuf) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path);
    }

    let cwd = std::env::current_dir().context("Failed to resolve current directory")?;
    Ok(cwd.join(path))
}

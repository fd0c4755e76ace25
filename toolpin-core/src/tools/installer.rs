//! Per-tool installers.
//!
//! [`ToolInstaller`] is the seam the orchestrator drives: it can report the
//! version currently exposed in the public bin directory and install a given
//! version. [`ArchiveInstaller`] implements it for every catalog tool that
//! ships as a downloadable archive.

use anyhow::Context;
use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, info, warn};

use super::catalog::{ToolDefinition, NODE, YARN};
use super::downloader::Fetcher;
use super::error::InstallError;
use super::extractor::{extract_archive, flatten_single_root};
use super::links::link_entry_points;
use super::paths::InstallContext;
use super::probe::probe_version;
use super::types::{ArchiveFormat, InstalledVersion, Platform};

// ============================================================================
// Installer Interface
// ============================================================================

/// A tool that can be probed for its version and installed.
#[async_trait]
pub trait ToolInstaller: Send + Sync {
    /// Short name used in errors and reports (e.g. "node").
    fn name(&self) -> &str;

    /// Human-readable name used in status lines (e.g. "Node.js").
    fn display_name(&self) -> &str;

    /// The string probe output must match for `version` to count as
    /// installed.
    fn version_marker(&self, version: &str) -> String;

    /// Reports what the tool's entry point currently answers to `--version`.
    async fn probe(&self) -> InstalledVersion;

    /// Downloads, unpacks and links `version`.
    async fn install(&self, version: &str) -> Result<(), InstallError>;
}

// ============================================================================
// Archive Installer
// ============================================================================

/// Installs a catalog tool from its distribution archive.
pub struct ArchiveInstaller<'a> {
    definition: &'static ToolDefinition,
    context: &'a InstallContext,
    fetcher: &'a dyn Fetcher,
    platform: Option<Platform>,
    download_url: Option<String>,
}

impl<'a> ArchiveInstaller<'a> {
    /// Creates an installer for the detected host platform.
    pub fn new(
        definition: &'static ToolDefinition,
        context: &'a InstallContext,
        fetcher: &'a dyn Fetcher,
    ) -> Self {
        Self {
            definition,
            context,
            fetcher,
            platform: Platform::detect(),
            download_url: None,
        }
    }

    /// Node.js installer.
    pub fn node(context: &'a InstallContext, fetcher: &'a dyn Fetcher) -> Self {
        Self::new(&NODE, context, fetcher)
    }

    /// Yarn installer.
    pub fn yarn(context: &'a InstallContext, fetcher: &'a dyn Fetcher) -> Self {
        Self::new(&YARN, context, fetcher)
    }

    /// Replaces the canonical download URL template.
    pub fn with_download_url(mut self, template: Option<String>) -> Self {
        self.download_url = template;
        self
    }

    /// Overrides the detected platform.
    pub fn with_platform(mut self, platform: Option<Platform>) -> Self {
        self.platform = platform;
        self
    }

    pub fn definition(&self) -> &'static ToolDefinition {
        self.definition
    }

    fn platform(&self) -> Result<Platform, InstallError> {
        self.platform.ok_or_else(|| InstallError::UnsupportedPlatform {
            tool: self.name().to_string(),
            platform: format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH),
        })
    }

    /// Replaces the tool directory with the archive's contents.
    async fn unpack(&self, archive_path: &Path, format: ArchiveFormat) -> anyhow::Result<()> {
        let tool_dir = self.context.tool_dir(self.definition.id);

        if tool_dir.exists() {
            debug!("Removing previous install at {}", tool_dir.display());
            tokio::fs::remove_dir_all(&tool_dir)
                .await
                .with_context(|| format!("Failed to clean up {}", tool_dir.display()))?;
        }

        extract_archive(archive_path, &tool_dir, format)?;
        flatten_single_root(&tool_dir)?;
        Ok(())
    }
}

#[async_trait]
impl ToolInstaller for ArchiveInstaller<'_> {
    fn name(&self) -> &str {
        self.definition.id.as_str()
    }

    fn display_name(&self) -> &str {
        self.definition.display_name
    }

    fn version_marker(&self, version: &str) -> String {
        self.definition.version_marker(version)
    }

    async fn probe(&self) -> InstalledVersion {
        let Some(entry) = self.platform.and_then(|p| self.definition.probe_entry(p)) else {
            return InstalledVersion::Absent;
        };

        let search_path = match self.context.search_path() {
            Ok(path) => Some(path),
            Err(e) => {
                debug!("Probing {} with the inherited PATH: {:#}", entry.name, e);
                None
            }
        };

        probe_version(&self.context.entry_point(entry.name), search_path.as_ref()).await
    }

    async fn install(&self, version: &str) -> Result<(), InstallError> {
        let definition = self.definition;
        let platform = self.platform()?;
        let tool = self.name().to_string();

        let (url, format) =
            definition.download_url(version, platform, self.download_url.as_deref());
        info!("Installing {} {} from {}", definition.display_name, version, url);

        let archive_path = self.context.archive_path(definition.id, format);

        if let Err(source) = self.fetcher.fetch(&url, &archive_path).await {
            remove_archive(&archive_path).await;
            return Err(InstallError::Download { tool, url, source });
        }

        let unpacked = self.unpack(&archive_path, format).await;
        remove_archive(&archive_path).await;
        unpacked.map_err(|source| InstallError::Unpack {
            tool: tool.clone(),
            source,
        })?;

        let tool_dir = self.context.tool_dir(definition.id);
        link_entry_points(
            definition.entry_points(platform),
            &tool_dir,
            self.context.public_bin_dir(),
            platform.os.is_windows(),
        )
        .map_err(|source| InstallError::Link { tool, source })?;

        info!(
            "{} {} unpacked to {}",
            definition.display_name,
            version,
            tool_dir.display()
        );
        Ok(())
    }
}

async fn remove_archive(path: &Path) {
    if !path.exists() {
        return;
    }

    if let Err(e) = tokio::fs::remove_file(path).await {
        warn!("Failed to clean up archive {}: {}", path.display(), e);
    }
}

//! Version-pinned tool installation.
//!
//! Each managed tool is unpacked into a private tool-storage directory and
//! exposed through entry points in a public bin directory. A tool is only
//! downloaded when its entry point does not already report the pinned version.
//!
//! # Architecture
//!
//! - `types`: Core types (ToolId, Platform, ArchiveFormat, InstalledVersion)
//! - `paths`: Install directory resolution
//! - `catalog`: Static tool definitions with download URL templates
//! - `downloader`: The fetch capability and its reqwest implementation
//! - `extractor`: Archive extraction (zip, tar.gz, tar.xz)
//! - `links`: Entry points in the public bin directory
//! - `env`: PATH handling for probes
//! - `probe`: `--version` probing
//! - `matcher`: Comparison of probe output against a pinned version
//! - `installer`: The per-tool installer interface and archive installer
//! - `error`: Install and verification errors
//!
//! # Example
//!
//! ```ignore
//! use toolpin_core::tools::{ArchiveInstaller, HttpFetcher, InstallContext, ToolInstaller};
//!
//! let context = InstallContext::new("vendor/toolpin", "vendor/bin")?;
//! let fetcher = HttpFetcher::new()?;
//! let node = ArchiveInstaller::node(&context, &fetcher);
//!
//! if !node.probe().await.is_present() {
//!     node.install("16.14.0").await?;
//! }
//! ```

pub mod catalog;
pub mod downloader;
pub mod env;
pub mod error;
pub mod extractor;
pub mod installer;
pub mod links;
pub mod matcher;
pub mod paths;
pub mod probe;
pub mod types;

// Re-export commonly used types
pub use catalog::{EntryPoint, ToolDefinition, NODE, YARN};
pub use downloader::{Fetcher, HttpFetcher};
pub use error::{EnsureError, InstallError, VersionVerificationError};
pub use installer::{ArchiveInstaller, ToolInstaller};
pub use matcher::VersionMatch;
pub use paths::InstallContext;
pub use probe::probe_version;
pub use types::{
    Arch, ArchiveFormat, InstalledVersion, OsType, Platform, ToolId, ToolReport, ToolState,
};

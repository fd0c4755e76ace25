//! Toolpin Core Library
//!
//! This crate keeps pinned versions of Node.js and Yarn in a project-local
//! tool directory. It includes:
//!
//! - Configuration loading and validation
//! - Install directory resolution
//! - A static catalog of tool distributions
//! - Archive download, extraction and entry-point linking
//! - Version probing and matching
//! - The orchestrator deciding what to install, and verifying it afterwards

pub mod config;
pub mod orchestrator;
pub mod tools;

// Re-exports for convenience
pub use config::{ConfigError, ToolConfig};

// Re-export orchestrator
pub use orchestrator::{ensure_tools_installed, Orchestrator, StatusSink, TracingSink};

// Re-export tools
pub use tools::{
    ArchiveInstaller, EnsureError, Fetcher, HttpFetcher, InstallContext, InstallError,
    InstalledVersion, ToolInstaller, ToolReport, ToolState, VersionMatch,
    VersionVerificationError,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Core types for tool installation.
//!
//! This module defines the foundational types used across the installer:
//! tool identifiers, platform detection, archive formats, installed-version
//! results and the per-tool states the orchestrator ends in.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Tool Identifiers
// ============================================================================

/// Unique identifier for each managed tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolId {
    /// Node.js - JavaScript runtime.
    Node,
    /// Yarn (classic) - package manager for Node.js.
    Yarn,
}

impl ToolId {
    /// Returns the lowercase string identifier for this tool.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Yarn => "yarn",
        }
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Platform Detection
// ============================================================================

/// Operating system family, named the way Node.js distributions name it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OsType {
    Linux,
    Darwin,
    Windows,
}

impl OsType {
    /// Returns the distribution name (`linux`, `darwin`, `win`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Darwin => "darwin",
            Self::Windows => "win",
        }
    }

    pub fn is_windows(&self) -> bool {
        matches!(self, Self::Windows)
    }
}

/// CPU architecture, named the way Node.js distributions name it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Arch {
    X64,
    X86,
    Arm64,
    Armv7l,
    Ppc64le,
    S390x,
}

impl Arch {
    /// Returns the distribution name (`x64`, `arm64`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::X64 => "x64",
            Self::X86 => "x86",
            Self::Arm64 => "arm64",
            Self::Armv7l => "armv7l",
            Self::Ppc64le => "ppc64le",
            Self::S390x => "s390x",
        }
    }
}

/// Represents a supported platform (OS + architecture).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Platform {
    pub os: OsType,
    pub arch: Arch,
}

impl Platform {
    /// Detects the current platform from the compile target.
    ///
    /// Returns `None` if the platform is unsupported.
    pub fn detect() -> Option<Self> {
        Self::from_parts(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Builds a platform from `std::env::consts`-style OS and arch names.
    pub fn from_parts(os: &str, arch: &str) -> Option<Self> {
        let os = match os {
            "linux" => OsType::Linux,
            "macos" => OsType::Darwin,
            "windows" => OsType::Windows,
            _ => return None,
        };

        let arch = match arch {
            "x86_64" => Arch::X64,
            "x86" => Arch::X86,
            "aarch64" => Arch::Arm64,
            "arm" => Arch::Armv7l,
            "powerpc64" => Arch::Ppc64le,
            "s390x" => Arch::S390x,
            _ => return None,
        };

        Some(Self { os, arch })
    }

    /// Returns a human-readable description of the platform.
    pub fn display_name(&self) -> String {
        format!("{}-{}", self.os.as_str(), self.arch.as_str())
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

// ============================================================================
// Archive Format
// ============================================================================

/// Archive format for downloaded tool packages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArchiveFormat {
    /// Gzip-compressed tar archive (.tar.gz, .tgz)
    TarGz,
    /// XZ-compressed tar archive (.tar.xz)
    TarXz,
    /// ZIP archive (.zip)
    Zip,
}

impl ArchiveFormat {
    /// Infers the archive format from a URL or filename.
    pub fn from_url(url: &str) -> Option<Self> {
        let lower = url.to_lowercase();
        if lower.ends_with(".tar.gz") || lower.ends_with(".tgz") {
            Some(Self::TarGz)
        } else if lower.ends_with(".tar.xz") {
            Some(Self::TarXz)
        } else if lower.ends_with(".zip") {
            Some(Self::Zip)
        } else {
            None
        }
    }

    /// Returns the file extension substituted for `${format}` in URL templates.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::TarGz => "tar.gz",
            Self::TarXz => "tar.xz",
            Self::Zip => "zip",
        }
    }
}

// ============================================================================
// Installed Version
// ============================================================================

/// Result of probing a locally installed tool for its version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstalledVersion {
    /// The tool answered with this (trimmed, non-empty) version output.
    Present(String),
    /// The tool is missing, failed to run, or reported nothing.
    Absent,
}

impl InstalledVersion {
    /// Builds a result from raw probe output; blank output counts as absent.
    pub fn from_output(output: &str) -> Self {
        let trimmed = output.trim();
        if trimmed.is_empty() {
            Self::Absent
        } else {
            Self::Present(trimmed.to_string())
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Present(version) => Some(version),
            Self::Absent => None,
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }
}

impl fmt::Display for InstalledVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Present(version) => write!(f, "{}", version),
            Self::Absent => write!(f, "<not installed>"),
        }
    }
}

// ============================================================================
// Tool State
// ============================================================================

/// Terminal state a tool reaches in a successful run.
///
/// Failures are not a state here; they surface as `EnsureError` and abort
/// the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToolState {
    /// The desired version was already present; nothing was done.
    Skipped,
    /// The tool was installed and verified.
    Installed,
}

/// What happened to one tool during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolReport {
    /// Tool name as reported in errors (e.g. "node", "yarn").
    pub tool: String,
    /// Desired version from configuration.
    pub version: String,
    pub state: ToolState,
}

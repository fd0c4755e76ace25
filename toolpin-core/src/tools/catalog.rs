//! Tool catalog with hardcoded definitions.
//!
//! This module contains the static definitions for all supported tools:
//! their canonical download URL templates, archive formats, version output
//! conventions and the entry points exposed in the public bin directory.

use super::types::{ArchiveFormat, OsType, Platform, ToolId};

// ============================================================================
// Definition Types
// ============================================================================

/// An executable exposed in the public bin directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryPoint {
    /// File name created in the public bin directory.
    pub name: &'static str,
    /// Path of the real executable, relative to the tool directory.
    pub target: &'static str,
}

impl EntryPoint {
    pub const fn new(name: &'static str, target: &'static str) -> Self {
        Self { name, target }
    }
}

/// Platform-specific entry points.
#[derive(Debug, Clone, Copy)]
pub struct EntryPoints {
    /// Symlinked on Linux and macOS.
    pub unix: &'static [EntryPoint],
    /// Exposed through `.cmd` shims on Windows.
    pub windows: &'static [EntryPoint],
}

impl EntryPoints {
    /// Returns the entry points for the given platform.
    pub fn get(&self, platform: Platform) -> &'static [EntryPoint] {
        match platform.os {
            OsType::Windows => self.windows,
            OsType::Linux | OsType::Darwin => self.unix,
        }
    }
}

/// Complete definition of a managed tool.
#[derive(Debug, Clone, Copy)]
pub struct ToolDefinition {
    /// Unique identifier for this tool.
    pub id: ToolId,
    /// Human-readable display name.
    pub display_name: &'static str,
    /// Canonical download URL with `${...}` placeholders.
    pub url_template: &'static str,
    /// Prefix the tool prints before its version (`v` for Node.js).
    pub version_prefix: &'static str,
    /// Archive format on Linux and macOS.
    pub unix_format: ArchiveFormat,
    /// Archive format on Windows.
    pub windows_format: ArchiveFormat,
    /// Executables to expose; the first one answers `--version`.
    pub entry_points: EntryPoints,
}

impl ToolDefinition {
    /// Returns the default archive format for the given platform.
    pub fn archive_format(&self, platform: Platform) -> ArchiveFormat {
        match platform.os {
            OsType::Windows => self.windows_format,
            OsType::Linux | OsType::Darwin => self.unix_format,
        }
    }

    /// Returns the string the tool's version output is matched against.
    pub fn version_marker(&self, version: &str) -> String {
        format!("{}{}", self.version_prefix, version)
    }

    /// Returns the entry points for the given platform.
    pub fn entry_points(&self, platform: Platform) -> &'static [EntryPoint] {
        self.entry_points.get(platform)
    }

    /// Returns the entry point that is run with `--version`.
    pub fn probe_entry(&self, platform: Platform) -> Option<&'static EntryPoint> {
        self.entry_points(platform).first()
    }

    /// Resolves the download URL for a version.
    ///
    /// An override template replaces the canonical one; both go through the
    /// same placeholder substitution. The archive format is taken from the
    /// resolved URL when it names one, otherwise from the platform default.
    pub fn download_url(
        &self,
        version: &str,
        platform: Platform,
        override_template: Option<&str>,
    ) -> (String, ArchiveFormat) {
        let default_format = self.archive_format(platform);
        let template = override_template.unwrap_or(self.url_template);
        let url = render_template(template, version, platform, default_format);
        let format = ArchiveFormat::from_url(&url).unwrap_or(default_format);
        (url, format)
    }
}

/// Substitutes `${version}`, `${osType}`, `${architecture}` and `${format}`.
pub fn render_template(
    template: &str,
    version: &str,
    platform: Platform,
    format: ArchiveFormat,
) -> String {
    template
        .replace("${version}", version)
        .replace("${osType}", platform.os.as_str())
        .replace("${architecture}", platform.arch.as_str())
        .replace("${format}", format.extension())
}

// ============================================================================
// Node.js Definition
// ============================================================================

const NODE_URL_TEMPLATE: &str =
    "https://nodejs.org/dist/v${version}/node-v${version}-${osType}-${architecture}.${format}";

const NODE_UNIX_ENTRY_POINTS: &[EntryPoint] = &[
    EntryPoint::new("node", "bin/node"),
    EntryPoint::new("npm", "bin/npm"),
    EntryPoint::new("npx", "bin/npx"),
];

const NODE_WINDOWS_ENTRY_POINTS: &[EntryPoint] = &[
    EntryPoint::new("node.cmd", "node.exe"),
    EntryPoint::new("npm.cmd", "npm.cmd"),
    EntryPoint::new("npx.cmd", "npx.cmd"),
];

pub const NODE: ToolDefinition = ToolDefinition {
    id: ToolId::Node,
    display_name: "Node.js",
    url_template: NODE_URL_TEMPLATE,
    version_prefix: "v",
    unix_format: ArchiveFormat::TarGz,
    windows_format: ArchiveFormat::Zip,
    entry_points: EntryPoints {
        unix: NODE_UNIX_ENTRY_POINTS,
        windows: NODE_WINDOWS_ENTRY_POINTS,
    },
};

// ============================================================================
// Yarn Definition
// ============================================================================

const YARN_URL_TEMPLATE: &str =
    "https://github.com/yarnpkg/yarn/releases/download/v${version}/yarn-v${version}.tar.gz";

const YARN_UNIX_ENTRY_POINTS: &[EntryPoint] = &[
    EntryPoint::new("yarn", "bin/yarn"),
    EntryPoint::new("yarnpkg", "bin/yarnpkg"),
];

const YARN_WINDOWS_ENTRY_POINTS: &[EntryPoint] = &[
    EntryPoint::new("yarn.cmd", "bin/yarn.cmd"),
    EntryPoint::new("yarnpkg.cmd", "bin/yarnpkg.cmd"),
];

pub const YARN: ToolDefinition = ToolDefinition {
    id: ToolId::Yarn,
    display_name: "Yarn",
    url_template: YARN_URL_TEMPLATE,
    version_prefix: "",
    unix_format: ArchiveFormat::TarGz,
    windows_format: ArchiveFormat::TarGz,
    entry_points: EntryPoints {
        unix: YARN_UNIX_ENTRY_POINTS,
        windows: YARN_WINDOWS_ENTRY_POINTS,
    },
};

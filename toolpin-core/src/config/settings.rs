//! Installer configuration.
//!
//! Configuration is a JSON mapping, usually a nested section of a larger
//! project manifest:
//!
//! ```json
//! {
//!   "extra": {
//!     "pantheon-se": {
//!       "node-composer": {
//!         "node-version": "16.14.0",
//!         "yarn-version": "1.22.0"
//!       }
//!     }
//!   }
//! }
//! ```

use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::tools::VersionMatch;

// =============================================================================
// Errors
// =============================================================================

/// Errors raised while reading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The selected section does not exist or is not a mapping.
    #[error("tool installer is not configured{}", pointer_suffix(.0))]
    NotConfigured(Option<String>),

    /// A required key is missing.
    #[error("You must specify a {0}")]
    Missing(&'static str),

    /// A key is present but blank.
    #[error("{0} must not be empty")]
    Empty(&'static str),

    /// A key has the wrong type or an unknown value.
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] serde_json::Error),

    #[error("Failed to read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

fn pointer_suffix(pointer: &Option<String>) -> String {
    match pointer {
        Some(pointer) => format!(" (nothing at {})", pointer),
        None => String::new(),
    }
}

// =============================================================================
// Tool Configuration
// =============================================================================

pub const NODE_VERSION_KEY: &str = "node-version";
pub const NODE_DOWNLOAD_URL_KEY: &str = "node-download-url";
pub const YARN_VERSION_KEY: &str = "yarn-version";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawToolConfig {
    node_version: Option<String>,
    node_download_url: Option<String>,
    yarn_version: Option<String>,
    #[serde(default)]
    version_match: VersionMatch,
}

/// Validated installer configuration.
///
/// A `ToolConfig` always carries a non-empty Node.js version; optional keys
/// are either absent or non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolConfig {
    node_version: String,
    node_download_url: Option<String>,
    yarn_version: Option<String>,
    version_match: VersionMatch,
}

impl ToolConfig {
    /// Creates a configuration that only pins Node.js.
    pub fn new(node_version: impl Into<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            node_version: version(NODE_VERSION_KEY, Some(node_version.into()))?
                .ok_or(ConfigError::Missing(NODE_VERSION_KEY))?,
            node_download_url: None,
            yarn_version: None,
            version_match: VersionMatch::default(),
        })
    }

    /// Builds a configuration from a JSON mapping.
    ///
    /// Unknown keys are ignored so the section can live inside a larger
    /// manifest.
    pub fn from_value(value: &Value) -> Result<Self, ConfigError> {
        if !value.is_object() {
            return Err(ConfigError::NotConfigured(None));
        }

        let raw = RawToolConfig::deserialize(value)?;

        Ok(Self {
            node_version: version(NODE_VERSION_KEY, raw.node_version)?
                .ok_or(ConfigError::Missing(NODE_VERSION_KEY))?,
            node_download_url: optional(NODE_DOWNLOAD_URL_KEY, raw.node_download_url)?,
            yarn_version: version(YARN_VERSION_KEY, raw.yarn_version)?,
            version_match: raw.version_match,
        })
    }

    /// Loads a configuration file, optionally selecting a nested section
    /// with a JSON pointer such as `/extra/pantheon-se/node-composer`.
    pub fn load_file(path: &Path, pointer: Option<&str>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let document: Value =
            serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let section = match pointer {
            Some(pointer) => document
                .pointer(pointer)
                .ok_or_else(|| ConfigError::NotConfigured(Some(pointer.to_string())))?,
            None => &document,
        };

        if !section.is_object() {
            return Err(ConfigError::NotConfigured(pointer.map(str::to_string)));
        }

        Self::from_value(section)
    }

    /// Pinned Node.js version, without the `v` prefix (e.g. `16.14.0`).
    pub fn node_version(&self) -> &str {
        &self.node_version
    }

    /// URL template replacing the canonical Node.js download location.
    pub fn node_download_url(&self) -> Option<&str> {
        self.node_download_url.as_deref()
    }

    /// Pinned Yarn version; Yarn is left alone when unset.
    pub fn yarn_version(&self) -> Option<&str> {
        self.yarn_version.as_deref()
    }

    pub fn version_match(&self) -> VersionMatch {
        self.version_match
    }
}

/// Versions are stored without a leading `v`; `v16.14.0` and `16.14.0` pin
/// the same release.
fn version(key: &'static str, value: Option<String>) -> Result<Option<String>, ConfigError> {
    let value = value.map(|v| {
        let v = v.trim();
        v.strip_prefix('v').unwrap_or(v).to_string()
    });
    optional(key, value)
}

fn optional(key: &'static str, value: Option<String>) -> Result<Option<String>, ConfigError> {
    match value {
        Some(value) if value.trim().is_empty() => Err(ConfigError::Empty(key)),
        Some(value) => Ok(Some(value.trim().to_string())),
        None => Ok(None),
    }
}

// =============================================================================
// Tests
// =============================================================================

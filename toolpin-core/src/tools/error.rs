//! Error types for install runs.
//!
//! Every variant here is fatal for the run: nothing is retried internally.
//! Re-running the whole process is the retry, and it is safe because each
//! install overwrites the previous one.

use thiserror::Error;

use super::types::InstalledVersion;

/// Errors raised while installing a single tool.
#[derive(Debug, Error)]
pub enum InstallError {
    /// The host OS/architecture is not in the catalog. An override URL does
    /// not help, since entry-point locations are platform specific.
    #[error("{tool} is not available for platform {platform}")]
    UnsupportedPlatform { tool: String, platform: String },

    /// The archive could not be fetched.
    #[error("Failed to download {tool} from {url}")]
    Download {
        tool: String,
        url: String,
        #[source]
        source: anyhow::Error,
    },

    /// The archive could not be unpacked into the tool directory.
    #[error("Failed to unpack {tool}")]
    Unpack {
        tool: String,
        #[source]
        source: anyhow::Error,
    },

    /// Entry points could not be created in the public bin directory.
    #[error("Failed to link {tool} executables")]
    Link {
        tool: String,
        #[source]
        source: anyhow::Error,
    },
}

impl InstallError {
    /// Name of the tool the failed install was for.
    pub fn tool(&self) -> &str {
        match self {
            Self::UnsupportedPlatform { tool, .. }
            | Self::Download { tool, .. }
            | Self::Unpack { tool, .. }
            | Self::Link { tool, .. } => tool,
        }
    }
}

/// An install completed but the tool still does not report the expected
/// version.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{tool} verification failed: expected {expected}, found {actual}")]
pub struct VersionVerificationError {
    /// Tool name (e.g. "node", "yarn").
    pub tool: String,
    /// Expected version marker (e.g. "v16.14.0" or "1.22.0").
    pub expected: String,
    /// What the post-install probe observed.
    pub actual: InstalledVersion,
}

/// Any fatal outcome of an ensure run.
#[derive(Debug, Error)]
pub enum EnsureError {
    #[error(transparent)]
    Install(#[from] InstallError),

    #[error(transparent)]
    Verification(#[from] VersionVerificationError),

    /// The install directories could not be prepared.
    #[error("Failed to prepare install directories")]
    Context(#[source] anyhow::Error),
}

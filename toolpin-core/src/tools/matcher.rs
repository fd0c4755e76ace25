//! Installed-version matching.

use serde::{Deserialize, Serialize};

use super::types::InstalledVersion;

/// How probe output is compared against a tool's version marker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionMatch {
    /// Some whitespace-separated token of the output equals the marker.
    ///
    /// `v16.14.0` does not match `v16.14.01`, but does match
    /// `node v16.14.0 (lts)`.
    #[default]
    Exact,
    /// The marker appears anywhere in the output.
    ///
    /// Loose: `1.2.0` also matches `11.2.0`.
    Contains,
}

impl VersionMatch {
    /// Returns whether `installed` satisfies `marker`. Absent never matches.
    pub fn matches(&self, installed: &InstalledVersion, marker: &str) -> bool {
        let Some(output) = installed.as_str() else {
            return false;
        };

        match self {
            Self::Exact => output.split_whitespace().any(|token| token == marker),
            Self::Contains => output.contains(marker),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Contains => "contains",
        }
    }
}

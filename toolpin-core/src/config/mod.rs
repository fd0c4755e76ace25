//! Configuration module for toolpin.
//!
//! Reads the pinned tool versions from a JSON mapping.

mod settings;

pub use settings::{
    ConfigError, ToolConfig, NODE_DOWNLOAD_URL_KEY, NODE_VERSION_KEY, YARN_VERSION_KEY,
};

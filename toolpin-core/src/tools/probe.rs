//! Installed-version probe.

use std::ffi::OsString;
use std::path::Path;
use tokio::process::Command;
use tracing::debug;

use super::types::InstalledVersion;

/// Flag passed to tools to make them print their version.
const VERSION_FLAG: &str = "--version";

/// Runs `executable --version` and returns what it reports.
///
/// Absence is an expected state, not an error: a missing executable, a spawn
/// failure, a non-zero exit, or blank output all yield
/// [`InstalledVersion::Absent`]. Stdout is preferred; stderr is used when
/// stdout is empty (some tools print their version there).
///
/// `search_path`, when given, replaces `PATH` for the child process.
pub async fn probe_version(executable: &Path, search_path: Option<&OsString>) -> InstalledVersion {
    if executable.symlink_metadata().is_err() {
        debug!("{} does not exist", executable.display());
        return InstalledVersion::Absent;
    }

    let mut command = Command::new(executable);
    command.arg(VERSION_FLAG).kill_on_drop(true);
    if let Some(path) = search_path {
        command.env("PATH", path);
    }

    let output = match command.output().await {
        Ok(output) => output,
        Err(e) => {
            debug!("Failed to run {}: {}", executable.display(), e);
            return InstalledVersion::Absent;
        }
    };

    if !output.status.success() {
        debug!(
            "{} {} exited with {}",
            executable.display(),
            VERSION_FLAG,
            output.status
        );
        return InstalledVersion::Absent;
    }

    let out = if !output.stdout.is_empty() {
        output.stdout
    } else {
        output.stderr
    };

    let version = InstalledVersion::from_output(&String::from_utf8_lossy(&out));
    debug!("{} reports {}", executable.display(), version);
    version
}

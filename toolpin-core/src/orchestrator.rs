//! Decide, install, verify, report.
//!
//! The [`Orchestrator`] drives each configured tool through the same state
//! machine:
//!
//! ```text
//! probe ──matches──▶ Skipped
//!   │
//!   └─otherwise──▶ install ──▶ probe ──matches──▶ Installed
//!                                 │
//!                                 └─otherwise──▶ VersionVerificationError
//! ```
//!
//! Tools run strictly one after another, runtime first. Any error aborts the
//! whole run.

use tracing::{debug, info, warn};

use crate::config::ToolConfig;
use crate::tools::{
    ArchiveInstaller, EnsureError, Fetcher, InstallContext, ToolInstaller, ToolReport, ToolState,
    VersionMatch, VersionVerificationError,
};

// ============================================================================
// Status Output
// ============================================================================

/// Receives the user-visible status lines of a run.
pub trait StatusSink: Send + Sync {
    /// A line every user should see.
    fn info(&self, message: &str);

    /// A diagnostic line shown only in verbose mode.
    fn verbose(&self, message: &str);
}

/// Forwards status lines to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl StatusSink for TracingSink {
    fn info(&self, message: &str) {
        info!("{}", message);
    }

    fn verbose(&self, message: &str) {
        debug!("{}", message);
    }
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Runs the install state machine over one or more tools.
pub struct Orchestrator<'a> {
    context: &'a InstallContext,
    sink: &'a dyn StatusSink,
    matcher: VersionMatch,
}

impl<'a> Orchestrator<'a> {
    pub fn new(context: &'a InstallContext, sink: &'a dyn StatusSink, matcher: VersionMatch) -> Self {
        Self {
            context,
            sink,
            matcher,
        }
    }

    /// Brings one tool to `version`, installing it only when needed.
    pub async fn ensure(
        &self,
        installer: &dyn ToolInstaller,
        version: &str,
    ) -> Result<ToolState, EnsureError> {
        let display_name = installer.display_name();
        let marker = installer.version_marker(version);

        let installed = installer.probe().await;
        debug!(
            "{} probe: {} ({} match against {})",
            installer.name(),
            installed,
            self.matcher.as_str(),
            marker
        );

        if self.matcher.matches(&installed, &marker) {
            self.sink
                .info(&format!("{} v{} already installed", display_name, version));
            return Ok(ToolState::Skipped);
        }

        self.sink
            .info(&format!("Installing {} v{}", display_name, version));
        installer.install(version).await?;

        let actual = installer.probe().await;
        if !self.matcher.matches(&actual, &marker) {
            self.report_bin_files();
            return Err(VersionVerificationError {
                tool: installer.name().to_string(),
                expected: marker,
                actual,
            }
            .into());
        }

        self.sink
            .info(&format!("{} v{} installed", display_name, version));
        Ok(ToolState::Installed)
    }

    /// Ensures the runtime, then the companion tool if one is configured.
    ///
    /// The configuration alone decides whether the companion runs: it is
    /// neither probed nor installed when no companion version is pinned.
    pub async fn ensure_all(
        &self,
        config: &ToolConfig,
        runtime: &dyn ToolInstaller,
        companion: &dyn ToolInstaller,
    ) -> Result<Vec<ToolReport>, EnsureError> {
        self.context
            .ensure_dirs_exist()
            .map_err(EnsureError::Context)?;

        let mut reports = Vec::with_capacity(2);

        let state = self.ensure(runtime, config.node_version()).await?;
        reports.push(report(runtime, config.node_version(), state));

        match config.yarn_version() {
            Some(version) => {
                let state = self.ensure(companion, version).await?;
                reports.push(report(companion, version, state));
            }
            None => debug!("No {} version pinned", companion.name()),
        }

        Ok(reports)
    }

    /// Lists the public bin directory at verbose level.
    fn report_bin_files(&self) {
        let bin_dir = self.context.public_bin_dir();
        let pattern = format!(
            "{}/*",
            glob::Pattern::escape(&bin_dir.to_string_lossy())
        );

        self.sink.verbose("Bin files:");
        match glob::glob(&pattern) {
            Ok(paths) => {
                for path in paths.flatten() {
                    self.sink.verbose(&path.display().to_string());
                }
            }
            Err(e) => warn!("Cannot list {}: {}", bin_dir.display(), e),
        }
    }
}

fn report(installer: &dyn ToolInstaller, version: &str, state: ToolState) -> ToolReport {
    ToolReport {
        tool: installer.name().to_string(),
        version: version.to_string(),
        state,
    }
}

// ============================================================================
// Entry Point
// ============================================================================

/// Installs the configured Node.js and Yarn versions where missing.
///
/// This is the single call a host integration makes. The configuration must
/// already be validated; every error is fatal for the run.
pub async fn ensure_tools_installed(
    config: &ToolConfig,
    context: &InstallContext,
    fetcher: &dyn Fetcher,
    sink: &dyn StatusSink,
) -> Result<Vec<ToolReport>, EnsureError> {
    let node = ArchiveInstaller::node(context, fetcher)
        .with_download_url(config.node_download_url().map(str::to_string));
    let yarn = ArchiveInstaller::yarn(context, fetcher);

    let orchestrator = Orchestrator::new(context, sink, config.version_match());
    orchestrator
        .ensure_all(config, &node, &yarn)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{InstallError, InstalledVersion};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tempfile::TempDir;

    // ------------------------------------------------------------------------
    // Fakes
    // ------------------------------------------------------------------------

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Line {
        Info(String),
        Verbose(String),
    }

    #[derive(Default)]
    struct RecordingSink {
        lines: Mutex<Vec<Line>>,
    }

    impl RecordingSink {
        fn lines(&self) -> Vec<Line> {
            self.lines.lock().unwrap().clone()
        }

        fn info_lines(&self) -> Vec<String> {
            self.lines()
                .into_iter()
                .filter_map(|line| match line {
                    Line::Info(text) => Some(text),
                    Line::Verbose(_) => None,
                })
                .collect()
        }
    }

    impl StatusSink for RecordingSink {
        fn info(&self, message: &str) {
            self.lines.lock().unwrap().push(Line::Info(message.to_string()));
        }

        fn verbose(&self, message: &str) {
            self.lines
                .lock()
                .unwrap()
                .push(Line::Verbose(message.to_string()));
        }
    }

    /// Answers probes from a script; the last answer repeats.
    struct FakeInstaller {
        name: &'static str,
        display_name: &'static str,
        prefix: &'static str,
        probes: Mutex<VecDeque<InstalledVersion>>,
        probe_calls: AtomicUsize,
        installs: Mutex<Vec<String>>,
        fail_download: bool,
    }

    impl FakeInstaller {
        fn new(name: &'static str, display_name: &'static str, prefix: &'static str) -> Self {
            Self {
                name,
                display_name,
                prefix,
                probes: Mutex::new(VecDeque::new()),
                probe_calls: AtomicUsize::new(0),
                installs: Mutex::new(Vec::new()),
                fail_download: false,
            }
        }

        fn node() -> Self {
            Self::new("node", "Node.js", "v")
        }

        fn yarn() -> Self {
            Self::new("yarn", "Yarn", "")
        }

        fn probing(self, answers: &[Option<&str>]) -> Self {
            *self.probes.lock().unwrap() = answers
                .iter()
                .map(|answer| match answer {
                    Some(version) => InstalledVersion::Present(version.to_string()),
                    None => InstalledVersion::Absent,
                })
                .collect();
            self
        }

        fn failing_download(mut self) -> Self {
            self.fail_download = true;
            self
        }

        fn probe_calls(&self) -> usize {
            self.probe_calls.load(Ordering::SeqCst)
        }

        fn installs(&self) -> Vec<String> {
            self.installs.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ToolInstaller for FakeInstaller {
        fn name(&self) -> &str {
            self.name
        }

        fn display_name(&self) -> &str {
            self.display_name
        }

        fn version_marker(&self, version: &str) -> String {
            format!("{}{}", self.prefix, version)
        }

        async fn probe(&self) -> InstalledVersion {
            self.probe_calls.fetch_add(1, Ordering::SeqCst);
            let mut probes = self.probes.lock().unwrap();
            if probes.len() > 1 {
                probes.pop_front().unwrap_or(InstalledVersion::Absent)
            } else {
                probes.front().cloned().unwrap_or(InstalledVersion::Absent)
            }
        }

        async fn install(&self, version: &str) -> Result<(), InstallError> {
            self.installs.lock().unwrap().push(version.to_string());
            if self.fail_download {
                return Err(InstallError::Download {
                    tool: self.name.to_string(),
                    url: format!("https://example.com/{}-{}.tar.gz", self.name, version),
                    source: anyhow::anyhow!("connection refused"),
                });
            }
            Ok(())
        }
    }

    fn context(temp_dir: &TempDir) -> InstallContext {
        InstallContext::new(temp_dir.path().join("storage"), temp_dir.path().join("bin")).unwrap()
    }

    fn config(value: serde_json::Value) -> ToolConfig {
        ToolConfig::from_value(&value).unwrap()
    }

    // ------------------------------------------------------------------------
    // Single tool
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_matching_probe_skips_install() {
        let temp_dir = TempDir::new().unwrap();
        let context = context(&temp_dir);
        let sink = RecordingSink::default();
        let node = FakeInstaller::node().probing(&[Some("v16.14.0")]);

        let orchestrator = Orchestrator::new(&context, &sink, VersionMatch::Exact);
        let state = orchestrator.ensure(&node, "16.14.0").await.unwrap();

        assert_eq!(state, ToolState::Skipped);
        assert!(node.installs().is_empty());
        assert_eq!(node.probe_calls(), 1);
        assert_eq!(sink.info_lines(), vec!["Node.js v16.14.0 already installed"]);
    }

    #[tokio::test]
    async fn test_absent_installs_once_and_reprobes_once() {
        let temp_dir = TempDir::new().unwrap();
        let context = context(&temp_dir);
        let sink = RecordingSink::default();
        let node = FakeInstaller::node().probing(&[None, Some("v16.14.0")]);

        let orchestrator = Orchestrator::new(&context, &sink, VersionMatch::Exact);
        let state = orchestrator.ensure(&node, "16.14.0").await.unwrap();

        assert_eq!(state, ToolState::Installed);
        assert_eq!(node.installs(), vec!["16.14.0"]);
        assert_eq!(node.probe_calls(), 2);
        assert_eq!(
            sink.info_lines(),
            vec!["Installing Node.js v16.14.0", "Node.js v16.14.0 installed"]
        );
    }

    #[tokio::test]
    async fn test_other_version_triggers_install() {
        let temp_dir = TempDir::new().unwrap();
        let context = context(&temp_dir);
        let sink = RecordingSink::default();
        let node = FakeInstaller::node().probing(&[Some("v14.0.0"), Some("v16.14.0")]);

        let orchestrator = Orchestrator::new(&context, &sink, VersionMatch::Exact);
        let state = orchestrator.ensure(&node, "16.14.0").await.unwrap();

        assert_eq!(state, ToolState::Installed);
        assert_eq!(node.installs().len(), 1);
    }

    #[tokio::test]
    async fn test_matcher_strategy_is_used() {
        let temp_dir = TempDir::new().unwrap();
        let context = context(&temp_dir);
        let sink = RecordingSink::default();

        // "v1.2.0" is contained in "v11.2.0" but is not an exact token.
        let exact = FakeInstaller::node().probing(&[Some("v11.2.0"), Some("v1.2.0")]);
        let state = Orchestrator::new(&context, &sink, VersionMatch::Exact)
            .ensure(&exact, "1.2.0")
            .await
            .unwrap();
        assert_eq!(state, ToolState::Installed);

        let contains = FakeInstaller::node().probing(&[Some("v11.2.0")]);
        let state = Orchestrator::new(&context, &sink, VersionMatch::Contains)
            .ensure(&contains, "1.2.0")
            .await
            .unwrap();
        assert_eq!(state, ToolState::Skipped);
    }

    #[tokio::test]
    async fn test_wrong_version_after_install_fails_verification() {
        let temp_dir = TempDir::new().unwrap();
        let context = context(&temp_dir);
        std::fs::create_dir_all(context.public_bin_dir()).unwrap();
        std::fs::write(context.entry_point("yarn"), b"").unwrap();
        let sink = RecordingSink::default();
        let yarn = FakeInstaller::yarn().probing(&[None, Some("1.21.0")]);

        let orchestrator = Orchestrator::new(&context, &sink, VersionMatch::Exact);
        let error = orchestrator.ensure(&yarn, "1.22.0").await.unwrap_err();

        match error {
            EnsureError::Verification(error) => {
                assert_eq!(
                    error,
                    VersionVerificationError {
                        tool: "yarn".to_string(),
                        expected: "1.22.0".to_string(),
                        actual: InstalledVersion::Present("1.21.0".to_string()),
                    }
                );
            }
            other => panic!("unexpected error: {other}"),
        }

        let lines = sink.lines();
        assert!(lines.contains(&Line::Verbose("Bin files:".to_string())));
        assert!(lines
            .iter()
            .any(|line| matches!(line, Line::Verbose(text) if text.ends_with("yarn"))));
        assert_eq!(sink.info_lines(), vec!["Installing Yarn v1.22.0"]);
    }

    #[tokio::test]
    async fn test_install_error_propagates_without_reprobe() {
        let temp_dir = TempDir::new().unwrap();
        let context = context(&temp_dir);
        let sink = RecordingSink::default();
        let node = FakeInstaller::node().probing(&[None]).failing_download();

        let orchestrator = Orchestrator::new(&context, &sink, VersionMatch::Exact);
        let error = orchestrator.ensure(&node, "16.14.0").await.unwrap_err();

        assert!(matches!(
            error,
            EnsureError::Install(InstallError::Download { .. })
        ));
        assert_eq!(node.probe_calls(), 1);
    }

    #[tokio::test]
    async fn test_probe_is_idempotent_without_install() {
        let node = FakeInstaller::node().probing(&[Some("v16.14.0")]);
        assert_eq!(node.probe().await, node.probe().await);
    }

    // ------------------------------------------------------------------------
    // Whole run
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_companion_untouched_when_not_configured() {
        let temp_dir = TempDir::new().unwrap();
        let context = context(&temp_dir);
        let sink = RecordingSink::default();
        let node = FakeInstaller::node().probing(&[None, Some("v16.14.0")]);
        let yarn = FakeInstaller::yarn().probing(&[None, Some("1.22.0")]);

        let orchestrator = Orchestrator::new(&context, &sink, VersionMatch::Exact);
        let reports = orchestrator
            .ensure_all(&config(json!({ "node-version": "16.14.0" })), &node, &yarn)
            .await
            .unwrap();

        assert_eq!(
            reports,
            vec![ToolReport {
                tool: "node".to_string(),
                version: "16.14.0".to_string(),
                state: ToolState::Installed,
            }]
        );
        assert_eq!(yarn.probe_calls(), 0);
        assert!(yarn.installs().is_empty());
        assert!(context.tool_storage_dir().is_dir());
        assert!(context.public_bin_dir().is_dir());
    }

    #[tokio::test]
    async fn test_runtime_then_companion() {
        let temp_dir = TempDir::new().unwrap();
        let context = context(&temp_dir);
        let sink = RecordingSink::default();
        let node = FakeInstaller::node().probing(&[Some("v16.14.0")]);
        let yarn = FakeInstaller::yarn().probing(&[None, Some("1.22.0")]);

        let orchestrator = Orchestrator::new(&context, &sink, VersionMatch::Exact);
        let reports = orchestrator
            .ensure_all(
                &config(json!({ "node-version": "16.14.0", "yarn-version": "1.22.0" })),
                &node,
                &yarn,
            )
            .await
            .unwrap();

        let states: Vec<_> = reports.iter().map(|r| (r.tool.as_str(), r.state)).collect();
        assert_eq!(
            states,
            vec![("node", ToolState::Skipped), ("yarn", ToolState::Installed)]
        );
        assert_eq!(
            sink.info_lines(),
            vec![
                "Node.js v16.14.0 already installed",
                "Installing Yarn v1.22.0",
                "Yarn v1.22.0 installed",
            ]
        );
    }

    #[tokio::test]
    async fn test_pinned_companion_is_always_reported() {
        let temp_dir = TempDir::new().unwrap();
        let context = context(&temp_dir);
        let sink = RecordingSink::default();
        let node = FakeInstaller::node().probing(&[Some("v16.14.0")]);
        let yarn = FakeInstaller::yarn().probing(&[Some("1.22.0")]);

        let orchestrator = Orchestrator::new(&context, &sink, VersionMatch::Exact);
        let reports = orchestrator
            .ensure_all(
                &config(json!({ "node-version": "16.14.0", "yarn-version": "1.22.0" })),
                &node,
                &yarn,
            )
            .await
            .unwrap();

        assert_eq!(reports.len(), 2);
        assert_eq!(
            reports[1],
            ToolReport {
                tool: "yarn".to_string(),
                version: "1.22.0".to_string(),
                state: ToolState::Skipped,
            }
        );
        assert_eq!(yarn.probe_calls(), 1);
        assert_eq!(
            sink.info_lines(),
            vec![
                "Node.js v16.14.0 already installed",
                "Yarn v1.22.0 already installed",
            ]
        );
    }

    #[tokio::test]
    async fn test_companion_verification_failure_aborts_run() {
        let temp_dir = TempDir::new().unwrap();
        let context = context(&temp_dir);
        let sink = RecordingSink::default();
        let node = FakeInstaller::node().probing(&[None, Some("v16.14.0")]);
        let yarn = FakeInstaller::yarn().probing(&[None, Some("1.21.0")]);

        let orchestrator = Orchestrator::new(&context, &sink, VersionMatch::Exact);
        let error = orchestrator
            .ensure_all(
                &config(json!({ "node-version": "16.14.0", "yarn-version": "1.22.0" })),
                &node,
                &yarn,
            )
            .await
            .unwrap_err();

        match error {
            EnsureError::Verification(error) => {
                assert_eq!(error.tool, "yarn");
                assert_eq!(error.expected, "1.22.0");
                assert_eq!(error.actual.as_str(), Some("1.21.0"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(node.installs(), vec!["16.14.0"]);
        assert_eq!(yarn.installs(), vec!["1.22.0"]);
        assert!(!sink
            .info_lines()
            .iter()
            .any(|line| line.starts_with("Yarn") && line.ends_with("installed")));
    }

    #[tokio::test]
    async fn test_runtime_failure_skips_companion() {
        let temp_dir = TempDir::new().unwrap();
        let context = context(&temp_dir);
        let sink = RecordingSink::default();
        let node = FakeInstaller::node().probing(&[None]).failing_download();
        let yarn = FakeInstaller::yarn().probing(&[Some("1.22.0")]);

        let orchestrator = Orchestrator::new(&context, &sink, VersionMatch::Exact);
        let result = orchestrator
            .ensure_all(
                &config(json!({ "node-version": "16.14.0", "yarn-version": "1.22.0" })),
                &node,
                &yarn,
            )
            .await;

        assert!(result.is_err());
        assert_eq!(yarn.probe_calls(), 0);
    }

    #[test]
    fn test_tracing_sink_accepts_lines() {
        let sink = TracingSink;
        sink.info("Installing Node.js v16.14.0");
        sink.verbose("Bin files:");
    }
}

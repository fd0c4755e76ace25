//! Toolpin CLI
//!
//! Installs the Node.js and Yarn versions pinned in a project's
//! configuration into project-local directories.

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;
use toolpin_core::{
    ensure_tools_installed, EnsureError, HttpFetcher, InstallContext, StatusSink, ToolConfig,
    ToolState,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "toolpin")]
#[command(about = "Install pinned Node.js and Yarn versions into a project")]
#[command(version)]
struct Args {
    /// JSON file holding the pinned versions
    #[arg(long, default_value = "toolpin.json")]
    config: PathBuf,

    /// JSON pointer to the settings section (e.g. /extra/pantheon-se/node-composer)
    #[arg(long)]
    pointer: Option<String>,

    /// Directory the tool distributions are unpacked into
    #[arg(long = "tool-dir", default_value = "vendor/toolpin")]
    tool_dir: PathBuf,

    /// Directory the node, npm and yarn entry points are created in
    #[arg(long = "bin-dir", default_value = "vendor/bin")]
    bin_dir: PathBuf,

    /// Show diagnostic output
    #[arg(short, long)]
    verbose: bool,
}

/// Prints status lines to stdout.
struct ConsoleSink {
    verbose: bool,
}

impl StatusSink for ConsoleSink {
    fn info(&self, message: &str) {
        println!("{} {}", "toolpin".cyan().bold(), message);
    }

    fn verbose(&self, message: &str) {
        if self.verbose {
            println!("{}", message.dimmed());
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "toolpin=debug" } else { "toolpin=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    tracing::debug!("Starting toolpin v{}", toolpin_core::VERSION);

    let config = ToolConfig::load_file(&args.config, args.pointer.as_deref())
        .with_context(|| format!("Invalid configuration in {}", args.config.display()))?;
    let context = InstallContext::new(&args.tool_dir, &args.bin_dir)?;
    let fetcher = HttpFetcher::new()?;
    let sink = ConsoleSink {
        verbose: args.verbose,
    };

    let reports = match ensure_tools_installed(&config, &context, &fetcher, &sink).await {
        Ok(reports) => reports,
        Err(EnsureError::Install(error)) => {
            eprintln!(
                "{} {} was not installed",
                "Error:".red().bold(),
                error.tool()
            );
            return Err(error.into());
        }
        Err(error) => return Err(error.into()),
    };

    let installed = reports
        .iter()
        .filter(|r| r.state == ToolState::Installed)
        .count();
    if installed > 0 {
        println!(
            "{} {} tool(s) installed into {}",
            "Done".green().bold(),
            installed,
            context.public_bin_dir().display()
        );
    }

    Ok(())
}

//! gitrip CLI - recovers git repositories from exposed `.git` directories.

use anyhow::{bail, Context, Result};
use clap::Parser;
use gitrip_recover::{GitUnpack, RecoverError, Retriever};
use std::path::PathBuf;
use std::process::Command;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

mod report;

/// Recovers a git repository from a website which mistakenly hosts the
/// contents of its .git directory.
#[derive(Parser, Debug)]
#[command(name = "gitrip")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Target URL, e.g. https://victim.website/
    url: String,

    /// Directory to output the retrieved repository (default: a fresh
    /// temporary directory)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("gitrip={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let raw = cli
        .url
        .trim_end_matches("/.git/")
        .trim_end_matches("/.git");
    let target = Url::parse(raw)
        .context("invalid url: must be absolute e.g. https://victim.website/")?;

    let output_dir = match cli.output_dir {
        Some(dir) => {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
            dir
        }
        None => tempfile::Builder::new()
            .prefix("gitrip")
            .tempdir()
            .context("failed to create temporary directory")?
            .keep(),
    };

    // The default pack resolver shells out to git, so surface a broken
    // install before touching the network.
    let git_version = local_git_version()
        .context("cannot check git version - please check git is installed")?;

    eprintln!("Target:     {target}");
    eprintln!("Local Git:  {git_version}");
    eprintln!("Output Dir: {}", output_dir.display());

    let summary = match Retriever::new(target, output_dir, GitUnpack)?.run() {
        Ok(summary) => summary,
        Err(e @ RecoverError::NotVulnerable) => {
            bail!("the provided URL does not appear vulnerable: {e}")
        }
        Err(e) => return Err(e).context("recovery failed"),
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        report::print(&summary);
    }
    Ok(())
}

/// Queries the local git toolchain once, for diagnostic display.
fn local_git_version() -> Result<String> {
    let output = Command::new("git").arg("--version").output()?;
    if !output.status.success() {
        bail!("git --version exited with {}", output.status);
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(stdout
        .split(' ')
        .next_back()
        .unwrap_or_default()
        .trim()
        .to_string())
}

//! ghpi - a static package index built from GitHub releases.
//!
//! Reads a list of repositories, collects every release asset that is a
//! Python distribution (wheel, sdist or egg) and writes a simple index that
//! installers can consume with `--index-url` or `--extra-index-url`.
//!
//! # Output Layout
//!
//! ```text
//! <output>/
//! ├── index.html          # one link per package
//! ├── <name>/
//! │   └── index.html      # one link per file, with #sha256= fragments
//! └── pypi/
//!     └── <name>/
//!         └── json        # JSON metadata
//! ```
//!
//! # Exit Codes
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | index written |
//! | 1 | fatal: bad configuration, unwritable output, or no repository reachable |
//! | 2 | invalid command line |
//! | 3 | the repository list was empty (an empty index is still written) |

pub mod token;

use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use ghpi_core::forge::RetryPolicy;
use ghpi_core::forge::github::{DEFAULT_API_URL, GitHubForge, build_client};
use ghpi_core::{ReleaseCollector, RenderConfig, RunSummary, UrlTemplate, load_repositories, run};
use tracing_subscriber::EnvFilter;

/// Exit status when the repository list contained no entries.
pub const EXIT_NOTHING_TO_INDEX: u8 = 3;

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "ghpi")]
#[command(version, about = "Build a static package index from GitHub release assets")]
pub struct Cli {
    /// Directory the index is written to
    #[arg(long, value_name = "DIR")]
    pub output: PathBuf,

    /// File listing repositories, one `owner/repo` per line
    #[arg(long, value_name = "FILE")]
    pub repositories: PathBuf,

    /// Title of the root index page
    #[arg(long, default_value = "Package Index")]
    pub title: String,

    /// GitHub token (falls back to the `GITHUB_TOKEN` environment variable)
    #[arg(long, conflicts_with = "token_stdin")]
    pub token: Option<String>,

    /// Read the GitHub token from the first line of standard input
    #[arg(long)]
    pub token_stdin: bool,

    /// Override artifact URLs, e.g. `https://mirror.example/{owner}/{repo}/{tag}/{filename}`
    #[arg(long, value_name = "TEMPLATE")]
    pub package_url_template: Option<String>,

    /// GitHub API root
    #[arg(long, env = "GHPI_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Repositories fetched in parallel
    #[arg(long, default_value_t = 4)]
    pub concurrency: usize,

    /// Attempts per API request before a repository is skipped
    #[arg(long, default_value_t = 4)]
    pub max_attempts: u32,

    /// Base delay between attempts in milliseconds
    #[arg(long, default_value_t = 1000, hide = true)]
    pub retry_delay_ms: u64,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30, value_name = "SECS")]
    pub timeout: u64,

    /// Download and hash assets that have no digest on GitHub
    #[arg(long)]
    pub compute_missing_hashes: bool,

    /// Log debug output
    #[arg(short, long)]
    pub verbose: bool,
}

/// Install the stderr subscriber. `RUST_LOG` overrides the default level.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .init();
}

/// Validate configuration, then collect and render.
///
/// Every configuration problem is reported before the first network request.
///
/// # Errors
///
/// Returns configuration errors, output write failures, and the error raised
/// when no repository could be processed.
pub async fn execute(cli: Cli) -> Result<RunSummary> {
    let repositories = load_repositories(&cli.repositories)?;
    let token = token::resolve_token(
        cli.token,
        cli.token_stdin,
        std::io::stdin().lock(),
        std::env::var(token::TOKEN_ENV).ok(),
    )?;
    let template = cli
        .package_url_template
        .as_deref()
        .map(UrlTemplate::parse)
        .transpose()?;

    let client = build_client(Duration::from_secs(cli.timeout)).context("failed to build HTTP client")?;
    let retry = RetryPolicy {
        max_attempts: cli.max_attempts.max(1),
        base_delay: Duration::from_millis(cli.retry_delay_ms),
        ..RetryPolicy::default()
    };
    let forge = GitHubForge::new(client, Some(token))
        .with_api_url(cli.api_url)
        .with_retry(retry);
    let collector = ReleaseCollector::new(Arc::new(forge))
        .with_concurrency(cli.concurrency)
        .with_computed_hashes(cli.compute_missing_hashes);
    let config = RenderConfig::new(cli.title, cli.output).with_package_url_template(template);

    tracing::info!(
        "indexing {} repositories into {}",
        repositories.len(),
        config.output_dir.display()
    );
    Ok(run(&collector, &repositories, &config).await?)
}

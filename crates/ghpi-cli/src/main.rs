//! `ghpi` binary entry point.

use std::process::ExitCode;

use clap::Parser;
use ghpi_cli::{Cli, EXIT_NOTHING_TO_INDEX, execute, init_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match execute(cli).await {
        Ok(summary) => {
            println!("{summary}");
            if summary.nothing_to_index() {
                tracing::warn!("nothing to index");
                ExitCode::from(EXIT_NOTHING_TO_INDEX)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

//! tsbuild - zero-config build tool for TypeScript libraries
//!
//! Composes one Rollup configuration per requested module format and build
//! environment, runs them concurrently through the project-local toolchain,
//! and also scaffolds new packages and drives ESLint.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tsbuild_lib::cli::Cli;
use tsbuild_lib::error::{self, Error};

/// Initialize the logging/tracing system
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tsbuild=debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tsbuild=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    if let Err(err) = cli.execute().await {
        match err.downcast_ref::<Error>() {
            Some(known) => error::log_error(known),
            None => {
                use colored::Colorize;
                eprintln!("{} {}", "Error!".red().bold(), err);
            }
        }
        std::process::exit(1);
    }
}

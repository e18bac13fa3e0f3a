//! Command-line interface for tsbuild
//!
//! Provides the main CLI structure using clap with subcommands for:
//! - `build`: compose and run bundler builds for the requested formats
//! - `create`: scaffold a new TypeScript package
//! - `lint`: generate lint configuration and run ESLint

mod build;
mod create;
mod lint;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;

pub use build::BuildCommand;
pub use create::CreateCommand;
pub use lint::LintCommand;

/// Zero-config build tool for TypeScript libraries
#[derive(Parser, Debug)]
#[command(name = "tsbuild")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the library for every requested module format
    Build(BuildCommand),

    /// Create a new TypeScript package project
    Create(CreateCommand),

    /// Generate lint configuration and run ESLint over the sources
    Lint(LintCommand),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<()> {
        print_banner();

        let root = std::env::current_dir()?;
        match &self.command {
            Commands::Build(cmd) => cmd.execute(&root).await,
            Commands::Create(cmd) => cmd.execute(&root).await,
            Commands::Lint(cmd) => cmd.execute(&root).await,
        }
    }
}

/// Print the tsbuild banner
fn print_banner() {
    eprintln!(
        "\n{} {} {}\n",
        "⚡".cyan(),
        "tsbuild".bold().cyan(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
}

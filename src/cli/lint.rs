//! Lint command implementation

use std::path::Path;

use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;
use tracing::info;

use crate::lint;
use crate::manifest::PackageManifest;

/// Generate lint configuration and run ESLint over the sources
#[derive(Args, Debug)]
pub struct LintCommand {
    /// Files or directories to lint (defaults to src/)
    pub paths: Vec<String>,

    /// Apply ESLint autofixes
    #[arg(long)]
    pub fix: bool,

    /// Write the generated configuration file and exit
    #[arg(long)]
    pub write_file: bool,

    /// Extra ignore pattern appended to the generated configuration
    #[arg(long)]
    pub ignore_pattern: Option<String>,

    /// Write the raw JSON report to this file
    #[arg(long)]
    pub report_file: Option<String>,
}

impl LintCommand {
    pub async fn execute(&self, root: &Path) -> Result<()> {
        let manifest = PackageManifest::load(root);

        if self.write_file {
            lint::write_config(root, &manifest, self.ignore_pattern.as_deref())?;
            eprintln!(
                "  {} Created {}",
                "✓".green(),
                lint::CONFIG_FILE_NAME.cyan()
            );
            return Ok(());
        }

        let paths = if self.paths.is_empty() {
            if !root.join("src").is_dir() {
                eprintln!("{}", "No input files found to lint".yellow());
                return Ok(());
            }
            eprintln!(
                "{}",
                "No input files specified, defaulting to src/".yellow()
            );
            vec!["src/".to_string()]
        } else {
            self.paths.clone()
        };

        // The config handed to ESLint is rendered fresh into the cache
        // directory so ignore patterns and manifest overrides always apply;
        // the project root only gets a file under --write-file.
        let config_path = lint::cache_config(root, &manifest, self.ignore_pattern.as_deref())?;

        info!(?paths, fix = self.fix, "running lint");
        let summary = lint::run(root, &config_path, &paths, self.fix).await?;

        if let Some(report_file) = &self.report_file {
            let path = lint::write_report(root, report_file, &summary)?;
            eprintln!("  {} Report written to {}", "✓".green(), path.display());
        }

        eprintln!(
            "\n{} {} error(s), {} warning(s)\n",
            if summary.failed() {
                "✗".red().bold().to_string()
            } else {
                "✓".green().bold().to_string()
            },
            summary.error_count,
            summary.warning_count
        );

        if summary.failed() {
            bail!("lint failed with {} error(s)", summary.error_count);
        }
        Ok(())
    }
}

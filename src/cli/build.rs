//! Build command implementation

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tracing::info;
use url::Url;

use crate::bundler::{Bundler, RollupCli};
use crate::manifest::PackageManifest;
use crate::options::{normalize, RawBuildOptions};
use crate::progress;

/// Build the library for every requested module format
#[derive(Args, Debug)]
pub struct BuildCommand {
    /// Entry files or glob patterns (repeatable, comma-joinable)
    #[arg(short = 'i', long = "entry")]
    pub entry: Vec<String>,

    /// Target environment (node, browser)
    #[arg(long, default_value = "browser")]
    pub target: String,

    /// Name exposed by UMD builds (defaults to the package name)
    #[arg(long)]
    pub name: Option<String>,

    /// Comma-joined module formats (cjs, esm, umd, system)
    #[arg(long, default_value = "cjs,esm")]
    pub format: String,

    /// Path to a custom tsconfig
    #[arg(long)]
    pub tsconfig: Option<PathBuf>,

    /// Skip type checking and declaration emit
    #[arg(long)]
    pub transpile_only: bool,

    /// Module names to keep external (repeatable, comma-joinable)
    #[arg(long)]
    pub external: Vec<String>,

    /// Emit dynamic imports as separate chunks
    #[arg(long)]
    pub no_inline_dynamic_imports: bool,

    /// Extract invariant error codes, pointing messages at this URL
    #[arg(long)]
    pub extract_errors: Option<String>,

    /// Force minification on or off (defaults per build environment)
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub minify: Option<bool>,
}

impl BuildCommand {
    pub async fn execute(&self, root: &Path) -> Result<()> {
        let start = Instant::now();

        if let Some(url) = &self.extract_errors {
            Url::parse(url).with_context(|| format!("--extract-errors is not a valid URL: {}", url))?;
        }

        let manifest = PackageManifest::load(root);
        let opts = normalize(&self.raw_options(), &manifest, root)?;
        info!(formats = ?opts.formats, entries = opts.input.len(), "starting build");

        eprintln!("{} Building modules...", "→".blue());

        // Options are validated before any toolchain probing so flag errors
        // never depend on the local Node install.
        let invoker = Arc::new(RollupCli::discover(root)?);
        let bundler = Bundler::new(opts, manifest, root.to_path_buf(), invoker);
        let outputs = progress::with_spinner("Bundling", bundler.build()).await?;

        let duration = start.elapsed();
        eprintln!(
            "\n{} Built {} bundle(s) in {:.2}s\n",
            "✓".green().bold(),
            outputs.len(),
            duration.as_secs_f64()
        );
        for output in &outputs {
            eprintln!("  {} {}", "•".dimmed(), output.cyan());
        }
        eprintln!();

        Ok(())
    }

    fn raw_options(&self) -> RawBuildOptions {
        RawBuildOptions {
            name: self.name.clone(),
            entry: self.entry.clone(),
            target: self.target.clone(),
            format: self.format.clone(),
            external: self.external.clone(),
            tsconfig: self.tsconfig.clone(),
            transpile_only: self.transpile_only,
            inline_dynamic_imports: !self.no_inline_dynamic_imports,
            extract_errors: self.extract_errors.clone(),
            minify: self.minify,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        cmd: BuildCommand,
    }

    #[test]
    fn test_defaults() {
        let harness = Harness::parse_from(["tsbuild"]);
        let raw = harness.cmd.raw_options();
        assert_eq!(raw.format, "cjs,esm");
        assert_eq!(raw.target, "browser");
        assert!(raw.inline_dynamic_imports);
        assert!(raw.minify.is_none());
    }

    #[test]
    fn test_flag_mapping() {
        let harness = Harness::parse_from([
            "tsbuild",
            "-i",
            "src/a.ts",
            "--entry",
            "src/b.ts",
            "--format",
            "umd",
            "--no-inline-dynamic-imports",
            "--minify",
            "false",
        ]);
        let raw = harness.cmd.raw_options();
        assert_eq!(raw.entry, vec!["src/a.ts", "src/b.ts"]);
        assert_eq!(raw.format, "umd");
        assert!(!raw.inline_dynamic_imports);
        assert_eq!(raw.minify, Some(false));
    }
}

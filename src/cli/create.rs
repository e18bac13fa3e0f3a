//! Project creation command

use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::Datelike;
use clap::Args;
use colored::Colorize;
use semver::VersionReq;
use tracing::info;

use crate::error::Error;
use crate::manifest::PackageManifest;
use crate::pm;
use crate::progress;
use crate::scaffold;

/// Create a new TypeScript package project
#[derive(Args, Debug)]
pub struct CreateCommand {
    /// Project name (also the directory created under the current one)
    pub name: String,

    /// Package author (probed from npm/git configuration when omitted)
    #[arg(long)]
    pub author: Option<String>,

    /// Skip installing dev dependencies into the new project
    #[arg(long)]
    pub no_install: bool,
}

impl CreateCommand {
    pub async fn execute(&self, root: &Path) -> Result<()> {
        let dest = root.join(&self.name);
        if dest.exists() {
            bail!("a file or directory named {:?} already exists", self.name);
        }

        let author = match &self.author {
            Some(author) => author.clone(),
            None => pm::author_name().await,
        };
        let year = chrono::Utc::now().year().to_string();

        eprintln!("{} Creating {}...\n", "→".blue(), self.name.cyan());

        let package_name = scaffold::create_project(&dest, &self.name, &author, &year)?;
        for path in scaffold::project_layout(&dest) {
            let relative = path.strip_prefix(&dest).unwrap_or(&path);
            eprintln!("  {} Created {}", "✓".green(), relative.display().to_string().cyan());
        }
        info!(%package_name, dest = %dest.display(), "scaffolded project");

        if !self.no_install {
            self.check_node_engine(&dest).await?;
            self.install_dependencies(&dest).await?;
        }

        eprintln!("\n{} Project created successfully!\n", "✓".green().bold());
        eprintln!("  Next steps:");
        eprintln!("    {} cd {}", "→".dimmed(), self.name.cyan());
        eprintln!("    {} tsbuild build", "→".dimmed());
        eprintln!();

        Ok(())
    }

    /// Refuse to install when the running Node cannot run the scaffolded
    /// project's toolchain, per its declared engine requirement
    async fn check_node_engine(&self, dest: &Path) -> Result<()> {
        let required = PackageManifest::load(dest)
            .engines
            .node
            .unwrap_or_else(|| scaffold::NODE_ENGINE_REQUIREMENT.to_string());
        let requirement = VersionReq::parse(&required)
            .with_context(|| format!("invalid engine requirement {:?}", required))?;
        if let Some(running) = pm::node_version().await {
            if !requirement.matches(&running) {
                return Err(Error::UnsupportedNodeVersion {
                    required: required.to_string(),
                    running: running.to_string(),
                }
                .into());
            }
        }
        Ok(())
    }

    async fn install_dependencies(&self, dest: &Path) -> Result<()> {
        let manager = pm::detect_package_manager();
        let packages: Vec<String> = scaffold::TEMPLATE_DEPENDENCIES
            .iter()
            .map(|p| p.to_string())
            .collect();
        let args = manager.install_args(&packages);

        eprintln!(
            "\n{} Installing dev dependencies with {}...",
            "→".blue(),
            manager.command().cyan()
        );

        let status = progress::with_spinner(
            "Installing dependencies",
            tokio::process::Command::new(manager.command())
                .args(&args)
                .current_dir(dest)
                .status(),
        )
        .await
        .with_context(|| format!("failed to run {}", manager.command()))?;

        if !status.success() {
            bail!("{} install failed", manager.command());
        }
        Ok(())
    }
}

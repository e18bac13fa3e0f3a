//! Package-manager and toolchain probing
//!
//! Everything here is computed once per invocation and passed along as a
//! value; nothing is cached process-wide.

use std::path::Path;

use semver::Version;
use tokio::process::Command;
use tracing::debug;

/// Detected JavaScript package manager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    Npm,
    Yarn,
}

impl PackageManager {
    pub fn command(&self) -> &'static str {
        match self {
            PackageManager::Npm => "npm",
            PackageManager::Yarn => "yarn",
        }
    }

    /// Arguments for a dev-dependency install of the given packages
    pub fn install_args(&self, packages: &[String]) -> Vec<String> {
        let mut args: Vec<String> = match self {
            PackageManager::Npm => vec!["install".to_string()],
            PackageManager::Yarn => vec!["add".to_string()],
        };
        args.extend(packages.iter().cloned());
        args.push(match self {
            PackageManager::Npm => "--save-dev".to_string(),
            PackageManager::Yarn => "--dev".to_string(),
        });
        args
    }
}

/// Detect the package manager, preferring npm and falling back to yarn
pub fn detect_package_manager() -> PackageManager {
    if which::which("npm").is_ok() {
        PackageManager::Npm
    } else {
        PackageManager::Yarn
    }
}

/// Run a command and capture trimmed stdout; None on any failure
async fn capture(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().await.ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!text.is_empty() && text != "undefined").then_some(text)
}

/// Probe the author name from npm and git configuration, in a fixed
/// fallback order
pub async fn author_name() -> String {
    for (program, args) in [
        ("npm", ["config", "get", "init-author-name"].as_slice()),
        ("git", ["config", "--global", "user.name"].as_slice()),
        ("git", ["config", "--global", "user.email"].as_slice()),
        ("npm", ["config", "get", "init-author-email"].as_slice()),
    ] {
        if let Some(author) = capture(program, args).await {
            debug!(%program, %author, "resolved author name");
            return author;
        }
    }
    "author <unknown>".to_string()
}

/// Probe the running Node version, e.g. `v20.11.1` -> 20.11.1
pub async fn node_version() -> Option<Version> {
    let raw = capture("node", &["--version"]).await?;
    Version::parse(raw.trim_start_matches('v')).ok()
}

/// Locate the project-local binary for a Node tool, falling back to PATH
pub fn local_tool(root: &Path, name: &str) -> Option<std::path::PathBuf> {
    let local = root.join("node_modules").join(".bin").join(name);
    if local.is_file() {
        return Some(local);
    }
    which::which(name).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_npm_install_args() {
        let packages = vec!["typescript".to_string(), "tslib".to_string()];
        assert_eq!(
            PackageManager::Npm.install_args(&packages),
            vec!["install", "typescript", "tslib", "--save-dev"]
        );
    }

    #[test]
    fn test_yarn_install_args() {
        let packages = vec!["jest".to_string()];
        assert_eq!(
            PackageManager::Yarn.install_args(&packages),
            vec!["add", "jest", "--dev"]
        );
    }

    #[test]
    fn test_local_tool_prefers_node_modules_bin() {
        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("node_modules").join(".bin");
        std::fs::create_dir_all(&bin).unwrap();
        std::fs::write(bin.join("eslint"), "#!/bin/sh\n").unwrap();

        let found = local_tool(dir.path(), "eslint").unwrap();
        assert_eq!(found, bin.join("eslint"));
    }
}

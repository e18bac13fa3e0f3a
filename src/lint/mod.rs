//! Lint configuration and ESLint orchestration
//!
//! `tsbuild lint` renders a flat ESLint config (with any per-project
//! overrides taken from the manifest), runs the project-local ESLint with
//! JSON output, and reprints a compact human summary. The config handed to
//! ESLint lives in the cache directory and is re-rendered on every run;
//! the project root only receives a file under the explicit write flag.

use std::fs;
use std::path::{Path, PathBuf};

use colored::Colorize;
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use crate::error::Error;
use crate::manifest::PackageManifest;
use crate::pm;

/// File name the rendered configuration is written to
pub const CONFIG_FILE_NAME: &str = "eslint.config.mjs";

const BASE_IGNORES: &[&str] = &[
    "test/**/*.test.ts",
    "test/**/*.spec.ts",
    "src/**/*.test.ts",
    "dist/",
    "build/",
    "lib/",
    "node_modules/",
    "coverage/",
    "**/*.d.ts",
];

/// Render the flat ESLint configuration module
///
/// Base rules come from `@eslint/js` and `typescript-eslint` recommended
/// sets. An extra ignore pattern and any `eslint` object from the manifest
/// are appended as trailing config entries, so they win by flat-config
/// ordering.
pub fn render_config(manifest: &PackageManifest, ignore_pattern: Option<&str>) -> String {
    let mut ignores: Vec<String> = BASE_IGNORES.iter().map(|s| s.to_string()).collect();
    if let Some(pattern) = ignore_pattern {
        ignores.push(pattern.to_string());
    }
    let ignores_json =
        serde_json::to_string_pretty(&ignores).unwrap_or_else(|_| "[]".to_string());

    let mut config = String::from("// @ts-check\n");
    config.push_str("import eslint from \"@eslint/js\";\n");
    config.push_str("import tseslint from \"typescript-eslint\";\n\n");
    config.push_str("export default tseslint.config(\n");
    config.push_str("  eslint.configs.recommended,\n");
    config.push_str("  tseslint.configs.recommended,\n");
    config.push_str("  {\n    ignores: ");
    config.push_str(&indent_block(&ignores_json, 4));
    config.push_str(",\n  }");

    if let Some(overrides) = &manifest.eslint {
        let overrides_json = serde_json::to_string_pretty(overrides)
            .unwrap_or_else(|_| "{}".to_string());
        config.push_str(",\n  ");
        config.push_str(&indent_block(&overrides_json, 2));
    }

    config.push_str("\n);\n");
    config
}

fn indent_block(text: &str, spaces: usize) -> String {
    let pad = " ".repeat(spaces);
    text.lines()
        .enumerate()
        .map(|(i, line)| {
            if i == 0 {
                line.to_string()
            } else {
                format!("{}{}", pad, line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Write the rendered configuration into the project root, refusing to
/// overwrite an existing file
pub fn write_config(
    root: &Path,
    manifest: &PackageManifest,
    ignore_pattern: Option<&str>,
) -> Result<PathBuf, Error> {
    let path = root.join(CONFIG_FILE_NAME);
    match fs::OpenOptions::new().write(true).create_new(true).open(&path) {
        Ok(_) => {
            fs::write(&path, render_config(manifest, ignore_pattern))
                .map_err(|e| Error::fs("failed to write lint configuration", &path, e))?;
            Ok(path)
        }
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            Err(Error::fs("lint configuration already exists", &path, e))
        }
        Err(e) => Err(Error::fs("failed to create lint configuration", &path, e)),
    }
}

/// Render the configuration for one lint run into the cache directory
///
/// Always re-rendered, so ignore patterns and manifest overrides apply even
/// when the project carries its own config file at the root.
pub fn cache_config(
    root: &Path,
    manifest: &PackageManifest,
    ignore_pattern: Option<&str>,
) -> Result<PathBuf, Error> {
    let cache_dir = root.join("node_modules").join(".cache").join("tsbuild");
    fs::create_dir_all(&cache_dir)
        .map_err(|e| Error::fs("failed to create cache directory", &cache_dir, e))?;
    let path = cache_dir.join(CONFIG_FILE_NAME);
    fs::write(&path, render_config(manifest, ignore_pattern))
        .map_err(|e| Error::fs("failed to write lint configuration", &path, e))?;
    Ok(path)
}

/// One file's results from ESLint's JSON formatter
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LintResult {
    pub file_path: String,
    pub error_count: u64,
    pub warning_count: u64,
    #[serde(default)]
    pub messages: Vec<LintMessage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LintMessage {
    #[serde(default)]
    pub rule_id: Option<String>,
    pub severity: u64,
    pub message: String,
    #[serde(default)]
    pub line: u64,
    #[serde(default)]
    pub column: u64,
}

/// Outcome of one lint run
#[derive(Debug, Default)]
pub struct LintSummary {
    pub error_count: u64,
    pub warning_count: u64,
    pub raw_json: String,
}

impl LintSummary {
    pub fn failed(&self) -> bool {
        self.error_count > 0
    }
}

/// Run the project-local ESLint over `paths` with the given config file
pub async fn run(
    root: &Path,
    config_path: &Path,
    paths: &[String],
    fix: bool,
) -> Result<LintSummary, Error> {
    let eslint =
        pm::local_tool(root, "eslint").ok_or_else(|| Error::ToolNotFound("eslint".to_string()))?;

    let mut cmd = Command::new(&eslint);
    cmd.current_dir(root)
        .arg("--config")
        .arg(config_path)
        .arg("--format")
        .arg("json");
    if fix {
        cmd.arg("--fix");
    }
    cmd.args(paths);

    debug!(eslint = %eslint.display(), ?paths, fix, "running eslint");

    let output = cmd
        .output()
        .await
        .map_err(|e| Error::fs("failed to spawn eslint", &eslint, e))?;

    // ESLint exits non-zero when it finds errors; only a missing/empty JSON
    // payload means the run itself broke.
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let results: Vec<LintResult> = serde_json::from_str(&stdout).map_err(|_| {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Error::Bundler(crate::error::BundlerDiagnostic::from_message(format!(
            "eslint did not produce a report: {}",
            stderr.trim()
        )))
    })?;

    let mut summary = LintSummary {
        raw_json: stdout,
        ..Default::default()
    };
    for result in &results {
        summary.error_count += result.error_count;
        summary.warning_count += result.warning_count;
    }
    print_report(&results);
    Ok(summary)
}

fn print_report(results: &[LintResult]) {
    for result in results {
        if result.messages.is_empty() {
            continue;
        }
        eprintln!("\n{}", result.file_path.underline());
        for msg in &result.messages {
            let severity = if msg.severity >= 2 {
                "error".red().to_string()
            } else {
                "warning".yellow().to_string()
            };
            eprintln!(
                "  {}:{}  {}  {}  {}",
                msg.line,
                msg.column,
                severity,
                msg.message,
                msg.rule_id.as_deref().unwrap_or("").dimmed()
            );
        }
    }
}

/// Write the raw JSON report next to the project for CI consumption
pub fn write_report(root: &Path, file: &str, summary: &LintSummary) -> Result<PathBuf, Error> {
    let path = root.join(file);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| Error::fs("failed to create report directory", parent, e))?;
    }
    fs::write(&path, &summary.raw_json)
        .map_err(|e| Error::fs("failed to write lint report", &path, e))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_config_has_base_sets_and_ignores() {
        let config = render_config(&PackageManifest::default(), None);
        assert!(config.contains("eslint.configs.recommended"));
        assert!(config.contains("tseslint.configs.recommended"));
        assert!(config.contains("node_modules/"));
        assert!(config.ends_with(");\n"));
    }

    #[test]
    fn test_render_config_appends_ignore_pattern_and_overrides() {
        let mut manifest = PackageManifest::default();
        manifest.eslint = Some(json!({"rules": {"no-console": "off"}}));
        let config = render_config(&manifest, Some("generated/**"));
        assert!(config.contains("generated/**"));
        assert!(config.contains("no-console"));
    }

    #[test]
    fn test_write_config_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = PackageManifest::default();

        let first = write_config(dir.path(), &manifest, None).unwrap();
        assert_eq!(first, dir.path().join(CONFIG_FILE_NAME));
        let second = write_config(dir.path(), &manifest, None).unwrap_err();
        assert!(second.to_string().contains("already exists"));
    }

    #[test]
    fn test_cache_config_lands_outside_project_root() {
        let dir = tempfile::tempdir().unwrap();
        let path = cache_config(dir.path(), &PackageManifest::default(), None).unwrap();
        assert_eq!(
            path,
            dir.path()
                .join("node_modules/.cache/tsbuild")
                .join(CONFIG_FILE_NAME)
        );
        assert!(!dir.path().join(CONFIG_FILE_NAME).exists());
    }

    #[test]
    fn test_cache_config_threads_pattern_despite_root_config() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "export default [];").unwrap();

        let mut manifest = PackageManifest::default();
        manifest.eslint = Some(json!({ "rules": { "no-console": "off" } }));
        let path = cache_config(dir.path(), &manifest, Some("generated/**")).unwrap();

        let written = fs::read_to_string(path).unwrap();
        assert!(written.contains("generated/**"));
        assert!(written.contains("no-console"));
    }

    #[test]
    fn test_lint_result_parsing() {
        let payload = json!([{
            "filePath": "/proj/src/index.ts",
            "errorCount": 1,
            "warningCount": 2,
            "messages": [{
                "ruleId": "no-unused-vars",
                "severity": 2,
                "message": "'x' is defined but never used.",
                "line": 4,
                "column": 9
            }]
        }])
        .to_string();

        let results: Vec<LintResult> = serde_json::from_str(&payload).unwrap();
        assert_eq!(results[0].error_count, 1);
        assert_eq!(results[0].messages[0].rule_id.as_deref(), Some("no-unused-vars"));
    }

    #[test]
    fn test_write_report() {
        let dir = tempfile::tempdir().unwrap();
        let summary = LintSummary {
            error_count: 0,
            warning_count: 0,
            raw_json: "[]".to_string(),
        };
        let path = write_report(dir.path(), "reports/lint.json", &summary).unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "[]");
    }
}

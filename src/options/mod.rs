//! Option normalization
//!
//! Turns raw CLI option values (comma-joined format strings, optional glob
//! entry patterns) into a strongly-typed [`NormalizedOptions`] record that
//! the format expander and config assembler consume.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use globset::GlobBuilder;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::Error;
use crate::manifest::PackageManifest;

/// Output module packaging style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleFormat {
    Cjs,
    Esm,
    Umd,
    System,
}

impl ModuleFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleFormat::Cjs => "cjs",
            ModuleFormat::Esm => "esm",
            ModuleFormat::Umd => "umd",
            ModuleFormat::System => "system",
        }
    }

    /// Output file extension: dual-package friendly `mjs`/`cjs`
    pub fn extension(&self) -> &'static str {
        match self {
            ModuleFormat::Esm => "mjs",
            _ => "cjs",
        }
    }
}

impl FromStr for ModuleFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cjs" => Ok(ModuleFormat::Cjs),
            // "es" is a widely used alias for "esm"
            "esm" | "es" => Ok(ModuleFormat::Esm),
            "umd" => Ok(ModuleFormat::Umd),
            "system" => Ok(ModuleFormat::System),
            other => Err(Error::InvalidFormat(format!(
                "unrecognized format \"{}\"",
                other
            ))),
        }
    }
}

impl fmt::Display for ModuleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JS target environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Node,
    Browser,
}

impl FromStr for Target {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "node" => Ok(Target::Node),
            "browser" => Ok(Target::Browser),
            other => Err(Error::InvalidFormat(format!(
                "unrecognized target \"{}\" (expected \"node\" or \"browser\")",
                other
            ))),
        }
    }
}

/// Raw CLI option values, before normalization
#[derive(Debug, Clone, Default)]
pub struct RawBuildOptions {
    pub name: Option<String>,
    pub entry: Vec<String>,
    pub target: String,
    pub format: String,
    pub external: Vec<String>,
    pub tsconfig: Option<PathBuf>,
    pub transpile_only: bool,
    pub inline_dynamic_imports: bool,
    pub extract_errors: Option<String>,
    pub minify: Option<bool>,
}

/// Normalized, validated build options
#[derive(Debug, Clone)]
pub struct NormalizedOptions {
    /// Name exposed in UMD builds (CLI flag, else package name)
    pub name: String,
    pub target: Target,
    /// Non-empty, order-preserving, deduplicated
    pub formats: Vec<ModuleFormat>,
    /// Resolved entry files, order and duplicates preserved
    pub input: Vec<PathBuf>,
    /// Order-preserving external module names
    pub external: Vec<String>,
    pub tsconfig: Option<PathBuf>,
    pub transpile_only: bool,
    pub inline_dynamic_imports: bool,
    pub extract_errors: Option<String>,
    pub minify: Option<bool>,
}

impl NormalizedOptions {
    pub fn has_format(&self, format: ModuleFormat) -> bool {
        self.formats.contains(&format)
    }
}

/// Normalize raw CLI options against the project manifest
pub fn normalize(
    raw: &RawBuildOptions,
    manifest: &PackageManifest,
    root: &Path,
) -> Result<NormalizedOptions, Error> {
    let formats = parse_formats(&raw.format)?;
    let input = resolve_entries(&raw.entry, manifest.source.as_deref(), root);
    debug!(?formats, ?input, "normalized build options");

    Ok(NormalizedOptions {
        name: raw
            .name
            .clone()
            .or_else(|| manifest.name.clone())
            .unwrap_or_default(),
        target: raw.target.parse()?,
        formats,
        input,
        external: split_list(&raw.external),
        tsconfig: raw.tsconfig.clone(),
        transpile_only: raw.transpile_only,
        inline_dynamic_imports: raw.inline_dynamic_imports,
        extract_errors: raw.extract_errors.clone(),
        minify: raw.minify,
    })
}

/// Split a comma-joined format string into a non-empty, ordered format set
pub fn parse_formats(format: &str) -> Result<Vec<ModuleFormat>, Error> {
    let mut formats = Vec::new();
    for token in format.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let parsed: ModuleFormat = token.parse()?;
        if !formats.contains(&parsed) {
            formats.push(parsed);
        }
    }
    if formats.is_empty() {
        return Err(Error::InvalidFormat(
            "at least one of cjs, esm, umd, system is required".to_string(),
        ));
    }
    Ok(formats)
}

/// Flatten repeated flags that may themselves be comma-joined
fn split_list(values: &[String]) -> Vec<String> {
    values
        .iter()
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
        .collect()
}

/// Resolve entry files in priority order: explicit entries (as globs), the
/// manifest `source` field, then a conventional `src/index.*` probe.
///
/// An empty result is not an error here; the bundler fails downstream when
/// it finds nothing to build.
pub fn resolve_entries(entries: &[String], source: Option<&str>, root: &Path) -> Vec<PathBuf> {
    let entries = split_list(entries);
    if !entries.is_empty() {
        return entries
            .iter()
            .flat_map(|pattern| expand_glob(pattern, root))
            .collect();
    }
    if let Some(source) = source {
        return vec![root.join(source)];
    }
    if root.join("src").is_dir() {
        return probe_index(root).into_iter().collect();
    }
    Vec::new()
}

/// Conventional entry probe with extension priority ts, tsx, jsx, js
fn probe_index(root: &Path) -> Option<PathBuf> {
    ["ts", "tsx", "jsx", "js"]
        .iter()
        .map(|ext| root.join("src").join(format!("index.{}", ext)))
        .find(|candidate| candidate.is_file())
}

/// Expand one entry pattern against the project root
///
/// Patterns without glob metacharacters pass through verbatim even when the
/// file does not exist (no-match passthrough). Glob matches are returned in
/// sorted walk order so entry expansion stays reproducible.
fn expand_glob(pattern: &str, root: &Path) -> Vec<PathBuf> {
    if !pattern.contains(['*', '?', '[', '{']) {
        return vec![root.join(pattern)];
    }

    let glob = match GlobBuilder::new(pattern).literal_separator(true).build() {
        Ok(glob) => glob.compile_matcher(),
        Err(_) => return vec![root.join(pattern)],
    };

    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.file_name() != "node_modules" && e.file_name() != ".git")
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| {
            let relative = e.path().strip_prefix(root).ok()?;
            glob.is_match(relative).then(|| e.path().to_path_buf())
        })
        .collect()
}

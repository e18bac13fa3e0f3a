//! Project manifest (package.json) handling
//!
//! The build and lint commands read a handful of fields from the project's
//! package.json: the package name (UMD global fallback), the declared
//! `source` entry, and optional embedded `eslint` / `babel` option blocks.

use std::fs;
use std::path::Path;

use colored::Colorize;
use serde::Deserialize;
use tracing::debug;

/// Fields tsbuild cares about from package.json
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageManifest {
    pub name: Option<String>,

    /// Declared entry source, e.g. "src/index.ts"
    pub source: Option<String>,

    /// Engine requirements checked before installing a scaffolded project
    #[serde(default)]
    pub engines: Engines,

    /// Embedded ESLint overrides, merged into the generated flat config
    pub eslint: Option<serde_json::Value>,

    /// Embedded Babel overrides, merged into the default transform pipeline
    pub babel: Option<BabelOverrides>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Engines {
    pub node: Option<String>,
}

/// User-supplied Babel presets/plugins, each either `"name"` or
/// `["name", { ...options }]`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BabelOverrides {
    #[serde(default)]
    pub presets: Vec<serde_json::Value>,
    #[serde(default)]
    pub plugins: Vec<serde_json::Value>,
}

impl PackageManifest {
    /// Load the manifest from `<root>/package.json`
    ///
    /// A missing file yields an empty manifest; a malformed one is reported
    /// on stderr and also treated as empty, so the build can still run on
    /// explicit CLI options.
    pub fn load(root: &Path) -> Self {
        let path = root.join("package.json");
        if !path.exists() {
            debug!("no package.json at {}", path.display());
            return Self::default();
        }
        match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(manifest) => manifest,
                Err(e) => {
                    eprintln!(
                        "{}",
                        format!(
                            "Error while reading package.json file in the current directory: {}",
                            e
                        )
                        .red()
                    );
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!(
                    "{}",
                    format!(
                        "Error while reading package.json file in the current directory: {}",
                        e
                    )
                    .red()
                );
                Self::default()
            }
        }
    }
}

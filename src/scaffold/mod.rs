//! Project scaffolding
//!
//! `tsbuild create` materializes a ready-to-publish TypeScript package:
//! sources, tests, configs, git hooks, and CI workflows. File creation is
//! strict: the first failed write aborts the whole scaffold so a partial
//! tree is never silently left behind.

pub mod templates;

use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::error::Error;

pub use templates::{compose_package_json, NODE_ENGINE_REQUIREMENT, TEMPLATE_DEPENDENCIES};

// Strips a leading scope, leading non-letters, trailing non-alphanumerics,
// and any character npm would reject in a package name.
static NAME_SANITIZER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(^@.*/)|((^[^a-zA-Z]+)|[^\w.-])|([^a-zA-Z0-9]+$)").unwrap()
});

/// Reduce a user-provided project name to a safe npm package name
pub fn sanitize_package_name(name: &str) -> String {
    NAME_SANITIZER.replace_all(name, "").to_string()
}

/// One file to materialize, relative to the project root
struct ScaffoldFile {
    path: &'static str,
    contents: String,
    executable: bool,
}

impl ScaffoldFile {
    fn new(path: &'static str, contents: impl Into<String>) -> Self {
        Self {
            path,
            contents: contents.into(),
            executable: false,
        }
    }

    fn hook(path: &'static str, contents: impl Into<String>) -> Self {
        Self {
            path,
            contents: contents.into(),
            executable: true,
        }
    }
}

fn license_text(author: &str, year: &str) -> String {
    templates::LICENSE
        .replace("<year>", year)
        .replace("<author>", author)
}

fn scaffold_files(name: &str, author: &str, year: &str) -> Result<Vec<ScaffoldFile>, Error> {
    let package_json = compose_package_json(name, author);
    let package_json = serde_json::to_string_pretty(&package_json)
        .map_err(|e| Error::fs("failed to serialize package.json", Path::new("package.json"), e.into()))?;

    Ok(vec![
        ScaffoldFile::new("package.json", package_json + "\n"),
        ScaffoldFile::new(".gitignore", templates::GITIGNORE),
        ScaffoldFile::new(".npmrc", templates::NPMRC),
        ScaffoldFile::new("tsconfig.json", templates::TSCONFIG),
        ScaffoldFile::new("README.md", templates::README),
        ScaffoldFile::new("LICENSE", license_text(author, year)),
        ScaffoldFile::new("jest.config.js", templates::JEST_CONFIG),
        ScaffoldFile::new("eslint.config.mjs", templates::ESLINT_CONFIG),
        ScaffoldFile::new(".babelrc", templates::BABEL_CONFIG),
        ScaffoldFile::new("lint-staged.config.js", templates::LINT_STAGED_CONFIG),
        ScaffoldFile::new("src/index.ts", templates::SAMPLE_SOURCE),
        ScaffoldFile::new("tests/index.spec.ts", templates::SAMPLE_TEST),
        ScaffoldFile::new(".github/workflows/main.yml", templates::WORKFLOW_MAIN),
        ScaffoldFile::new(".github/workflows/size.yml", templates::WORKFLOW_SIZE),
        ScaffoldFile::hook(".githooks/pre-commit", templates::PRECOMMIT_HOOK),
    ])
}

fn write_file(root: &Path, file: &ScaffoldFile) -> Result<(), Error> {
    let path = root.join(file.path);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| Error::fs("failed to create directory", parent, e))?;
    }
    fs::write(&path, &file.contents)
        .map_err(|e| Error::fs("failed to write file", &path, e))?;

    #[cfg(unix)]
    if file.executable {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
            .map_err(|e| Error::fs("failed to mark file executable", &path, e))?;
    }

    debug!(path = %path.display(), "wrote scaffold file");
    Ok(())
}

/// Materialize a new project at `root`
///
/// `root` must not already exist. Returns the sanitized package name the
/// project was created under.
pub fn create_project(root: &Path, name: &str, author: &str, year: &str) -> Result<String, Error> {
    let package_name = sanitize_package_name(name);
    fs::create_dir_all(root).map_err(|e| Error::fs("failed to create project directory", root, e))?;

    for file in scaffold_files(&package_name, author, year)? {
        write_file(root, &file)?;
    }

    Ok(package_name)
}

/// Paths a scaffolded project is expected to contain, used by the create
/// command's summary output
pub fn project_layout(root: &Path) -> Vec<PathBuf> {
    ["src/index.ts", "tests/index.spec.ts", "package.json"]
        .iter()
        .map(|p| root.join(p))
        .collect()
}
